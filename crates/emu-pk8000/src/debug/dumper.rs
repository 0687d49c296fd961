//! RAM and register snapshot.

use std::fs;
use std::path::PathBuf;

use emu_core::Cpu;
use intel_8080::{HALT, INTE, Registers};

use crate::error::DebugError;
use crate::machine::Pk8000;
use crate::memory::IoPorts;
use crate::timeline::FrameInfo;

/// Paths of the two files a dump writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFiles {
    /// Raw 64 KiB RAM bank.
    pub ram: PathBuf,
    /// Timeline, flags, registers and ports as text.
    pub regs: PathBuf,
}

/// Write the machine's RAM and register state to its dump directory.
///
/// Files are named `dump-<start time>-<frame>-<clock>` with `.ram.bin` and
/// `.reg.txt` suffixes. The directory is created if needed.
pub fn dump(machine: &Pk8000) -> Result<DumpFiles, DebugError> {
    let dir = machine
        .dump_dir()
        .ok_or(DebugError::NoDirectory { tool: "dump" })?;
    fs::create_dir_all(dir).map_err(|err| DebugError::io(dir, err))?;

    let info = machine.timeline().info();
    let regs = machine.cpu().registers();
    let stem = format!(
        "dump-{}-{:06}-{:06}",
        info.start_time, info.frame_num, regs.clock
    );
    let files = DumpFiles {
        ram: dir.join(format!("{stem}.ram.bin")),
        regs: dir.join(format!("{stem}.reg.txt")),
    };

    let memory = machine.memory();
    fs::write(&files.ram, &memory.banks.ram).map_err(|err| DebugError::io(&files.ram, err))?;
    let text = register_text(info, regs, &memory.ports);
    fs::write(&files.regs, text).map_err(|err| DebugError::io(&files.regs, err))?;

    log::info!("dump written to {}", files.regs.display());
    Ok(files)
}

fn register_text(info: FrameInfo, regs: &Registers, ports: &IoPorts) -> String {
    let mut out = String::new();
    out.push_str("    TIMELINE\n\n");
    out.push_str(&format!("frame   = {}\n", info.frame_num));
    out.push_str(&format!("clock   = {}\n\n", regs.clock));

    out.push_str("    FLAGS\n\n");
    out.push_str("          sz a p c\n");
    out.push_str(&format!("flags   = {:08b}\n", regs.f));
    out.push_str(&format!("inte    = {}\n", regs.state & INTE != 0));
    out.push_str(&format!("halt    = {}\n\n", regs.state & HALT != 0));

    out.push_str("    REGISTERS\n\n");
    out.push_str(&format!("a       = {:02x}\n", regs.a));
    out.push_str(&format!("bc      = {:04x}\n", regs.bc.get()));
    out.push_str(&format!("de      = {:04x}\n", regs.de.get()));
    out.push_str(&format!("hl      = {:04x}\n", regs.hl.get()));
    out.push_str(&format!("sp      = {:04x}\n", regs.sp));
    out.push_str(&format!("pc      = {:04x}\n\n", regs.pc));

    out.push_str("    PORTS\n\n");
    let port = |label: &str, value: u8| format!("{label:<8}= {value:02x} {value:08b}\n");
    out.push_str(&port("80", ports.port80));
    out.push_str(&port("81", ports.port81[0]));
    for &row in &ports.port81[1..10] {
        out.push_str(&format!("          {row:02x} {row:08b}\n"));
    }
    for (label, value) in [
        ("82", ports.port82),
        ("84", ports.port84),
        ("85", ports.port85),
        ("86", ports.port86),
        ("88", ports.port88),
        ("8c", ports.port8c),
        ("8d", ports.port8d),
        ("90", ports.port90),
        ("91", ports.port91),
        ("92", ports.port92),
        ("93", ports.port93),
    ] {
        out.push_str(&port(label, value));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_text_layout() {
        let info = FrameInfo {
            start_time: 0,
            frame_num: 7,
        };
        let mut regs = Registers::default();
        regs.clock = 1234;
        regs.a = 0x0A;
        regs.f = 0x83;
        regs.sp = 0xF000;
        regs.hl.set(0x1234);
        regs.state = INTE;
        let text = register_text(info, &regs, &IoPorts::default());

        assert!(text.starts_with("    TIMELINE\n\nframe   = 7\nclock   = 1234\n\n    FLAGS\n"));
        assert!(text.contains("          sz a p c\nflags   = 10000011\ninte    = true\nhalt    = false\n"));
        assert!(text.contains("a       = 0a\nbc      = 0000\nde      = 0000\nhl      = 1234\nsp      = f000\n"));
        assert!(text.contains("80      = fc 11111100\n81      = ff 11111111\n          ff 11111111\n"));
        assert!(text.contains("8c      = 00 00000000\n"));
        assert!(text.ends_with("93      = f7 11110111\n\n"));
        assert_eq!(text.matches("          ff 11111111\n").count(), 9);
    }
}

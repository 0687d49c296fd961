//! Top-level PK8000 system.
//!
//! # Frame loop
//!
//! `run_frame()` advances the machine by one 50 Hz video frame of 49,280
//! CPU cycles. Components run in a fixed order:
//!
//! - start: timeline, then CPU (the bus latches the bank map and RAM timing);
//! - render: timeline (frame trigger), then CPU (interrupt, instructions);
//! - end: CPU (overshoot carried into the next frame), then timeline.
//!
//! The machine and everything hooked to it live on one thread.

use std::path::{Path, PathBuf};

use emu_core::{Bus, Cpu, FrameSubsystem, Hook, Observable, Subsystem, Value};
use intel_8080::{I8080, Registers, ReturnHook};

use crate::bus::{MemAccess, Pk8000Bus};
use crate::config::Pk8000Config;
use crate::debug::{DumpFiles, TraceTriggers, Tracer, dump};
use crate::error::{ConfigError, DebugError};
use crate::memory::{Memory, RomImage};
use crate::timeline::{CLOCKS_PER_FRAME, FrameInfo, Timeline};

/// PK8000 system.
pub struct Pk8000 {
    timeline: Timeline,
    cpu: I8080,
    bus: Pk8000Bus,
    rom: RomImage,
    dump_dir: Option<PathBuf>,
    tracer: Tracer,
}

impl Pk8000 {
    /// Create a machine from `config`, powered on and ready to run.
    pub fn new(config: &Pk8000Config) -> Result<Self, ConfigError> {
        let rom = RomImage::new(config.rom.clone())?;
        let timeline = Timeline::new();
        let cpu = I8080::new(CLOCKS_PER_FRAME);
        let bus = Pk8000Bus::new(Memory::new());
        let triggers = TraceTriggers {
            frame: timeline.frame_registrar(),
            int: cpu.int_registrar(),
            op: cpu.op_registrar(),
            ret: cpu.ret_registrar(),
            mem: bus.mem_registrar(),
        };
        let mut machine = Self {
            timeline,
            cpu,
            bus,
            rom,
            dump_dir: config.dump_dir.clone(),
            tracer: Tracer::new(config.trace_dir.clone(), triggers),
        };
        machine.init();
        Ok(machine)
    }

    /// Run one complete frame.
    pub fn run_frame(&mut self) {
        self.start_frame();
        self.render_frame();
        self.end_frame();
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn cpu(&self) -> &I8080 {
        &self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &Pk8000Bus {
        &self.bus
    }

    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.bus.memory
    }

    /// Mutable memory and ports. Port changes take effect at the next
    /// frame start.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.bus.memory
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        self.cpu.registers()
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        self.cpu.registers_mut()
    }

    /// Read a byte through the current bank map, without timing or hooks.
    #[must_use]
    pub fn mem_peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Write a byte to RAM, without timing or hooks.
    pub fn mem_poke(&mut self, addr: u16, value: u8) {
        self.bus.poke(addr, value);
    }

    /// Copy `data` into RAM starting at `addr`, wrapping at the top.
    pub fn load_ram(&mut self, addr: u16, data: &[u8]) {
        let mut addr = addr;
        for &byte in data {
            self.bus.poke(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Subscribe to every timed memory access.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn mem_hook<F>(&self, func: F) -> Hook<MemAccess>
    where
        F: FnMut(&mut MemAccess) + 'static,
    {
        self.bus.mem_hook(func)
    }

    /// Subscribe to the frame interrupt, fired after it is dispatched.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn int_hook<F>(&self, func: F) -> Hook<Registers>
    where
        F: FnMut(&mut Registers) + 'static,
    {
        self.cpu.int_hook(func)
    }

    /// Subscribe to every opcode fetch, fired before it.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn op_hook<F>(&self, func: F) -> Hook<Registers>
    where
        F: FnMut(&mut Registers) + 'static,
    {
        self.cpu.op_hook(func)
    }

    /// Create a disarmed return hook.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn ret_hook<F>(&self, func: F) -> ReturnHook
    where
        F: FnMut(&mut Registers) + 'static,
    {
        self.cpu.ret_hook(func)
    }

    /// Subscribe to the start of every rendered frame.
    #[must_use = "dropping the hook unsubscribes immediately"]
    pub fn frame_hook<F>(&self, func: F) -> Hook<FrameInfo>
    where
        F: FnMut(&mut FrameInfo) + 'static,
    {
        self.timeline.frame_hook(func)
    }

    // =========================================================================
    // Debug tools
    // =========================================================================

    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Start or stop the instruction tracer. A new trace starts with a file
    /// named after the current frame.
    pub fn set_tracing(&mut self, active: bool) -> Result<(), DebugError> {
        self.tracer.activate(active, self.timeline.info())
    }

    #[must_use]
    pub fn dump_dir(&self) -> Option<&Path> {
        self.dump_dir.as_deref()
    }

    /// Write a RAM and register snapshot to the dump directory.
    pub fn dump(&self) -> Result<DumpFiles, DebugError> {
        dump(self)
    }
}

impl Subsystem for Pk8000 {
    fn init(&mut self) {
        self.timeline.init();
        self.bus.memory.init();
        self.bus.memory.load_rom(&self.rom);
        self.bus.relatch();
        self.cpu.init();
        self.tracer.close();
        log::info!("PK8000 initialised with a {} byte ROM", self.rom.len());
    }

    fn reset(&mut self) {
        self.timeline.reset();
        self.bus.memory.reset();
        self.bus.relatch();
        self.cpu.reset();
        self.tracer.reset(self.timeline.info());
        log::info!("PK8000 reset");
    }

    fn close(&mut self) {
        self.tracer.close();
        self.cpu.close();
        self.bus.memory.close();
        self.timeline.close();
    }
}

impl FrameSubsystem for Pk8000 {
    fn start_frame(&mut self) {
        self.timeline.start_frame();
        self.cpu.start_frame(&mut self.bus);
    }

    fn render_frame(&mut self) {
        self.timeline.render_frame();
        self.cpu.render_frame(&mut self.bus);
    }

    fn end_frame(&mut self) {
        self.cpu.end_frame();
        self.timeline.end_frame();
    }
}

fn parse_addr(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl Pk8000 {
    fn query_port(&self, name: &str) -> Option<Value> {
        let ports = &self.bus.memory.ports;
        if let Some(row) = name.strip_prefix("81.") {
            let row: usize = row.parse().ok()?;
            return ports.port81.get(row).map(|&v| v.into());
        }
        let value = match name {
            "80" => ports.port80,
            "81" => ports.port81[usize::from(ports.port82 & 0x0F)],
            "82" => ports.port82,
            "84" => ports.port84,
            "85" => ports.port85,
            "86" => ports.port86,
            "88" => ports.port88,
            "8c" => ports.port8c,
            "8d" => ports.port8d,
            "90" => ports.port90,
            "91" => ports.port91,
            "92" => ports.port92,
            "93" => ports.port93,
            _ => return None,
        };
        Some(value.into())
    }
}

impl Observable for Pk8000 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_addr(rest).map(|addr| self.bus.peek(addr).into())
        } else if let Some(rest) = path.strip_prefix("ram.") {
            parse_addr(rest).map(|addr| self.bus.memory.banks.ram[usize::from(addr)].into())
        } else if let Some(rest) = path.strip_prefix("bank.") {
            let quadrant: usize = rest.parse().ok().filter(|&q| q < 4)?;
            Some(self.bus.bank_map().quadrant(quadrant).name().into())
        } else if let Some(rest) = path.strip_prefix("ports.") {
            self.query_port(rest)
        } else {
            match path {
                "frame" => Some(self.timeline.frame_num().into()),
                "start_time" => Some(self.timeline.start_time().into()),
                "tracing" => Some(self.tracer.is_active().into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<i8080_paths>",
            "memory.<address>",
            "ram.<address>",
            "bank.<0-3>",
            "ports.<80|81|82|84|85|86|88|8c|8d|90|91|92|93>",
            "ports.81.<row>",
            "frame",
            "start_time",
            "tracing",
        ]
    }
}

//! Instruction tracer.
//!
//! While active the tracer appends the address and opcode of every executed
//! instruction to text files in the trace directory, eight entries per line.
//! Frame starts, interrupts and the matching interrupt returns are marked
//! with banner lines. A new file is started every second of emulated time
//! (every 50th frame), named after the machine's start time and the frame
//! number.
//!
//! The opcode byte comes from the fetch itself: the opcode trigger marks the
//! next bus read and the memory hook records it.

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use emu_core::{Hook, Registrar};
use intel_8080::{Registers, ReturnHook};

use crate::bus::{AccessKind, MemAccess};
use crate::error::DebugError;
use crate::timeline::{FPS, FrameInfo};

const TOOL: &str = "trace";

/// Entries per trace line.
const ENTRIES_PER_LINE: usize = 8;

/// Registrars for the triggers the tracer subscribes to.
#[derive(Clone)]
pub(crate) struct TraceTriggers {
    pub frame: Registrar<FrameInfo>,
    pub int: Registrar<Registers>,
    pub op: Registrar<Registers>,
    pub ret: Registrar<Registers>,
    pub mem: Registrar<MemAccess>,
}

/// Writes an instruction trace while active. Inactive by default.
pub struct Tracer {
    trace_dir: Option<PathBuf>,
    triggers: TraceTriggers,
    session: Option<Rc<Session>>,
}

impl Tracer {
    pub(crate) fn new(trace_dir: Option<PathBuf>, triggers: TraceTriggers) -> Self {
        Self {
            trace_dir,
            triggers,
            session: None,
        }
    }

    #[must_use]
    pub fn trace_dir(&self) -> Option<&Path> {
        self.trace_dir.as_deref()
    }

    /// True while the tracer is subscribed and writing.
    ///
    /// A tracer that hit an I/O error while running reports inactive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.hooks.borrow().is_some())
    }

    /// Start or stop tracing. `at` names the first trace file.
    ///
    /// Starting fails if no trace directory is configured or the first file
    /// cannot be created; the tracer then stays inactive.
    pub fn activate(&mut self, active: bool, at: FrameInfo) -> Result<(), DebugError> {
        if active == self.is_active() {
            return Ok(());
        }
        if active {
            self.start(at)
        } else {
            self.stop();
            Ok(())
        }
    }

    /// Restart an active trace with a fresh file, after a machine reset.
    pub(crate) fn reset(&mut self, at: FrameInfo) {
        if self.is_active() {
            self.stop();
            if let Err(err) = self.start(at) {
                log::error!("tracer not restarted: {err}");
            }
        }
    }

    pub(crate) fn close(&mut self) {
        self.stop();
    }

    fn start(&mut self, at: FrameInfo) -> Result<(), DebugError> {
        self.stop();
        let dir = self
            .trace_dir
            .clone()
            .ok_or(DebugError::NoDirectory { tool: TOOL })?;
        fs::create_dir_all(&dir).map_err(|err| DebugError::io(&dir, err))?;

        let session = Rc::new(Session::new(dir));
        session.state.borrow_mut().open(&session.dir, at)?;
        let hooks = attach(&session, &self.triggers).ok_or(DebugError::Detached { tool: TOOL })?;
        *session.hooks.borrow_mut() = Some(hooks);

        log::info!("tracer activated, writing to {}", session.dir.display());
        self.session = Some(session);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let hooks = session.hooks.borrow_mut().take();
        let was_running = hooks.is_some();
        drop(hooks);
        if let Err(err) = session.state.borrow_mut().finish() {
            log::error!("tracer output lost: {err}");
        }
        if was_running {
            log::info!("tracer deactivated");
        }
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Subscriptions of one tracing session.
struct SessionHooks {
    _frame: Hook<FrameInfo>,
    _int: Hook<Registers>,
    _op: Hook<Registers>,
    _mem: Hook<MemAccess>,
    ret: ReturnHook,
}

struct Session {
    dir: PathBuf,
    state: RefCell<TraceState>,
    hooks: RefCell<Option<SessionHooks>>,
}

impl Session {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            state: RefCell::new(TraceState::default()),
            hooks: RefCell::new(None),
        }
    }

    /// Apply `write` to the trace. On failure log it and unsubscribe.
    fn run<F>(&self, write: F) -> bool
    where
        F: FnOnce(&mut TraceState, &Path) -> Result<(), DebugError>,
    {
        let result = write(&mut self.state.borrow_mut(), &self.dir);
        match result {
            Ok(()) => true,
            Err(err) => {
                log::error!("tracer deactivated due to errors: {err}");
                let hooks = self.hooks.borrow_mut().take();
                drop(hooks);
                false
            }
        }
    }
}

fn attach(session: &Rc<Session>, triggers: &TraceTriggers) -> Option<SessionHooks> {
    let weak = Rc::downgrade(session);
    let frame = triggers.frame.hook(with_session(&weak, |session, info: &mut FrameInfo| {
        let info = *info;
        session.run(|state, dir| state.frame(dir, info));
    }))?;

    let ret = ReturnHook::with_registrar(
        &triggers.ret,
        with_session(&weak, |session, _regs: &mut Registers| {
            session.run(|state, _| state.end_of_interrupt());
        }),
    )?;

    let int = triggers.int.hook(with_session(&weak, |session, regs: &mut Registers| {
        if session.run(|state, _| state.interrupt()) {
            if let Some(hooks) = session.hooks.borrow().as_ref() {
                hooks.ret.activate(regs);
            }
        }
    }))?;

    let op = triggers.op.hook(with_session(&weak, |session, _regs: &mut Registers| {
        session.state.borrow_mut().fetch_pending = true;
    }))?;

    let mem = triggers.mem.hook(with_session(&weak, |session, access: &mut MemAccess| {
        if access.kind != AccessKind::Read {
            return;
        }
        let pending = std::mem::take(&mut session.state.borrow_mut().fetch_pending);
        if pending {
            let (addr, op) = (access.addr, access.value);
            session.run(|state, _| state.instruction(addr, op));
        }
    }))?;

    Some(SessionHooks {
        _frame: frame,
        _int: int,
        _op: op,
        _mem: mem,
        ret,
    })
}

/// Wrap a callback so it runs only while its session is alive.
fn with_session<A, F>(weak: &Weak<Session>, mut func: F) -> impl FnMut(&mut A) + 'static
where
    A: 'static,
    F: FnMut(&Session, &mut A) + 'static,
{
    let weak = Weak::clone(weak);
    move |arg: &mut A| {
        if let Some(session) = weak.upgrade() {
            func(&session, arg);
        }
    }
}

struct TraceFile {
    path: PathBuf,
    out: BufWriter<File>,
}

/// Open file plus the line being filled.
#[derive(Default)]
struct TraceState {
    file: Option<TraceFile>,
    line: String,
    entries: usize,
    fetch_pending: bool,
}

impl TraceState {
    /// Finish the current line and switch to the file for frame `at`.
    fn open(&mut self, dir: &Path, at: FrameInfo) -> Result<(), DebugError> {
        self.new_line()?;
        self.finish()?;
        let path = dir.join(format!("trace-{}-{:06}.txt", at.start_time, at.frame_num));
        let file = File::create(&path).map_err(|err| DebugError::io(&path, err))?;
        self.file = Some(TraceFile {
            path,
            out: BufWriter::new(file),
        });
        Ok(())
    }

    fn frame(&mut self, dir: &Path, info: FrameInfo) -> Result<(), DebugError> {
        if info.frame_num % FPS == 0 {
            self.open(dir, info)?;
        } else {
            self.new_line()?;
        }
        let banner = format!(
            "======== frame {:06} {} {}\n",
            info.frame_num,
            frame_time(info.frame_num),
            "=".repeat(46)
        );
        self.write(&banner)
    }

    fn interrupt(&mut self) -> Result<(), DebugError> {
        self.new_line()?;
        let banner = format!("-------- interrupt {}\n", "-".repeat(61));
        self.write(&banner)
    }

    fn end_of_interrupt(&mut self) -> Result<(), DebugError> {
        self.new_line()?;
        let banner = format!("-------- end of interrupt {}\n", "-".repeat(54));
        self.write(&banner)?;
        self.flush()
    }

    fn instruction(&mut self, pc: u16, op: u8) -> Result<(), DebugError> {
        self.line.push_str(&format!("{pc:04x} {op:02x}   "));
        self.entries += 1;
        if self.entries >= ENTRIES_PER_LINE {
            self.new_line()?;
        }
        Ok(())
    }

    fn new_line(&mut self) -> Result<(), DebugError> {
        if self.entries == 0 {
            return Ok(());
        }
        self.entries = 0;
        self.line.push('\n');
        let line = std::mem::take(&mut self.line);
        self.write(&line)
    }

    /// Write the partial line and close the file.
    fn finish(&mut self) -> Result<(), DebugError> {
        let line = std::mem::take(&mut self.line);
        self.entries = 0;
        self.write(&line)?;
        self.flush()?;
        self.file = None;
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), DebugError> {
        match &mut self.file {
            Some(file) => file
                .out
                .write_all(text.as_bytes())
                .map_err(|err| DebugError::io(&file.path, err)),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<(), DebugError> {
        match &mut self.file {
            Some(file) => file.out.flush().map_err(|err| DebugError::io(&file.path, err)),
            None => Ok(()),
        }
    }
}

/// Emulated time of a frame as `hh:mm:ss-ff`.
fn frame_time(frame_num: u32) -> String {
    let frames = frame_num % FPS;
    let seconds = frame_num / FPS;
    format!(
        "{:02}:{:02}:{:02}-{:02}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60,
        frames
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_time_splits_into_clock_fields() {
        assert_eq!(frame_time(0), "00:00:00-00");
        assert_eq!(frame_time(49), "00:00:00-49");
        assert_eq!(frame_time(50 * 61 + 7), "00:01:01-07");
        assert_eq!(frame_time(50 * 3600 * 2 + 50 * 59), "02:00:59-00");
    }

    #[test]
    fn entries_wrap_after_eight() {
        let mut state = TraceState::default();
        for pc in 0..9 {
            state.instruction(pc, 0x00).expect("no file to fail");
        }
        assert_eq!(state.entries, 1);
        assert_eq!(state.line, "0008 00   ");
    }

    #[test]
    fn new_line_is_a_no_op_on_an_empty_line() {
        let mut state = TraceState::default();
        state.new_line().expect("no file to fail");
        assert!(state.line.is_empty());
    }
}

//! Debug tools that write machine state to disk.
//!
//! Both tools are driven by the host. The tracer subscribes to the machine's
//! triggers while it is active; the dumper takes a one-off snapshot.

mod dumper;
mod tracer;

pub use dumper::{DumpFiles, dump};
pub use tracer::Tracer;
pub(crate) use tracer::TraceTriggers;

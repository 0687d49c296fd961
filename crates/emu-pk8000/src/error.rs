//! Error types for machine setup and the debug tools.
//!
//! The engine itself cannot fail; these cover the host-facing edges.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Problems with a machine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The BIOS image does not fit the 64 KiB ROM bank.
    #[error("ROM image is {len} bytes, the ROM bank holds 65536")]
    RomTooLarge { len: usize },

    /// The configuration text could not be parsed.
    #[cfg(feature = "serde")]
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the tracer and dumper.
#[derive(Debug, Error)]
pub enum DebugError {
    /// The output directory for the named tool is not configured.
    #[error("{tool} directory is not specified")]
    NoDirectory { tool: &'static str },

    /// The machine the tool was attached to no longer exists.
    #[error("{tool} is detached from its machine")]
    Detached { tool: &'static str },

    /// A file or directory operation failed.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DebugError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

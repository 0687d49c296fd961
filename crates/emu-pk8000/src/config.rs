//! PK8000 machine configuration.

use std::path::PathBuf;

#[cfg(feature = "serde")]
use crate::error::ConfigError;

/// Configuration for creating a [`Pk8000`](crate::Pk8000) instance.
///
/// With the `serde` feature a host can read the directory settings from a
/// JSON file. The ROM image is never part of that file; the host loads it
/// separately and stores it in `rom`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Pk8000Config {
    /// BIOS image, copied to the start of the ROM bank. At most 64 KiB.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub rom: Vec<u8>,
    /// Where the tracer writes its files.
    pub trace_dir: Option<PathBuf>,
    /// Where the dumper writes its files.
    pub dump_dir: Option<PathBuf>,
}

impl Pk8000Config {
    /// Configuration with a ROM image and no debug directories.
    #[must_use]
    pub fn with_rom(rom: Vec<u8>) -> Self {
        Self {
            rom,
            ..Self::default()
        }
    }

    /// Parse the directory settings from JSON. `rom` is left empty.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn json_sets_directories_only() {
        let config = Pk8000Config::from_json(r#"{ "trace_dir": "/tmp/trace" }"#)
            .expect("valid config");
        assert_eq!(config.trace_dir, Some(PathBuf::from("/tmp/trace")));
        assert_eq!(config.dump_dir, None);
        assert!(config.rom.is_empty());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = Pk8000Config::from_json("{ trace_dir").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

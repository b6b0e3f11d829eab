//! Runtime limits for decoding and bounded traversal
//!
//! ```
//! # use pathset::Config;
//! // Fields that are left out keep their defaults
//! let config = Config::from_toml_str("max_decode_depth = 64").unwrap();
//! assert_eq!(config.max_decode_depth, 64);
//! assert_eq!(config.traverse_value_limit, Config::default().traverse_value_limit);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Limits applied by [deserialize_with_config](crate::serialization::deserialize_with_config) and
/// [ReadZipper::traverse_default](crate::ReadZipper::traverse_default)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Deepest node nesting accepted when decoding (default: 4096)
    #[serde(default = "default_max_decode_depth")]
    pub max_decode_depth: usize,

    /// Most paths returned by one bounded traversal (default: 1024)
    #[serde(default = "default_traverse_value_limit")]
    pub traverse_value_limit: usize,

    /// Most path bytes returned by one bounded traversal (default: 1 MiB)
    #[serde(default = "default_traverse_byte_limit")]
    pub traverse_byte_limit: usize,
}

fn default_max_decode_depth() -> usize {
    4096
}

fn default_traverse_value_limit() -> usize {
    1024
}

fn default_traverse_byte_limit() -> usize {
    1 << 20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_decode_depth: default_max_decode_depth(),
            traverse_value_limit: default_traverse_value_limit(),
            traverse_byte_limit: default_traverse_byte_limit(),
        }
    }
}

impl Config {
    /// Parses a config from TOML text
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn full_toml() {
        let config = Config::from_toml_str(
            "max_decode_depth = 12\ntraverse_value_limit = 3\ntraverse_byte_limit = 100\n"
        ).unwrap();
        assert_eq!(config, Config { max_decode_depth: 12, traverse_value_limit: 3, traverse_byte_limit: 100 });
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "traverse_value_limit = 7").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.traverse_value_limit, 7);
        assert_eq!(config.max_decode_depth, Config::default().max_decode_depth);

        let missing = file.path().with_extension("missing");
        assert!(matches!(Config::from_file(missing), Err(Error::Io(_))));
    }

    #[test]
    fn bad_toml() {
        assert!(matches!(Config::from_toml_str("max_decode_depth = \"deep\""), Err(Error::Config(_))));
    }
}

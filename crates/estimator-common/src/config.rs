//! Configuration types for the storage estimator
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration: 1 MiB chunks, 128 KiB I/O units, erasure coding off.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default chunk size (1 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Default I/O unit size (128 KiB)
pub const DEFAULT_IO_SIZE: u64 = 128 * 1024;

/// Default inode attribute key name
pub const DEFAULT_INODE_KEY: &str = "DFS_INODE";

/// Default inode record size
pub const DEFAULT_INODE_SIZE: u64 = 64;

/// Default number of records under the file metadata key
pub const DEFAULT_FILE_META_RECORDS: u64 = 3;

/// Default size of one file metadata record
pub const DEFAULT_FILE_META_SIZE: u64 = 64;

/// Root configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Layout model parameters
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EstimatorConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Load a TOML file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// Parameters of the target store's allocation policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Size of one I/O unit (array record extent)
    #[serde(default = "default_io_size")]
    pub io_size: u64,
    /// Size of one chunk (one integer key per chunk)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Size of one EC cell
    #[serde(default)]
    pub stripe_size: u64,
    /// Number of payload cells per stripe
    #[serde(default)]
    pub cell_count: u32,
    /// Number of parity cells per stripe (0 disables erasure coding)
    #[serde(default)]
    pub parity_count: u32,
    /// Inode attribute attached to every directory entry
    #[serde(default)]
    pub inode: InodeTemplate,
    /// Metadata key prepended to every file
    #[serde(default)]
    pub file_meta: FileMetaTemplate,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            io_size: DEFAULT_IO_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            stripe_size: 0,
            cell_count: 0,
            parity_count: 0,
            inode: InodeTemplate::default(),
            file_meta: FileMetaTemplate::default(),
        }
    }
}

impl LayoutConfig {
    /// Enable erasure coding with the given geometry
    #[must_use]
    pub const fn with_ec(mut self, cell_count: u32, parity_count: u32, stripe_size: u64) -> Self {
        self.cell_count = cell_count;
        self.parity_count = parity_count;
        self.stripe_size = stripe_size;
        self
    }

    /// Whether parity cells are modeled
    #[must_use]
    pub const fn ec_enabled(&self) -> bool {
        self.parity_count > 0
    }

    /// Check that the layout parameters can drive a build
    pub fn validate(&self) -> Result<()> {
        if self.io_size == 0 {
            return Err(Error::invalid_configuration("io_size must be > 0"));
        }
        if self.chunk_size == 0 {
            return Err(Error::invalid_configuration("chunk_size must be > 0"));
        }
        if self.file_meta.records == 0 {
            return Err(Error::invalid_configuration(
                "file metadata key needs at least one record",
            ));
        }
        if self.ec_enabled() {
            if self.stripe_size == 0 {
                return Err(Error::invalid_configuration(
                    "stripe_size must be > 0 when parity is enabled",
                ));
            }
            if self.cell_count == 0 {
                return Err(Error::invalid_configuration(
                    "cell_count must be > 0 when parity is enabled",
                ));
            }
        }
        Ok(())
    }
}

/// Inode attribute template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InodeTemplate {
    /// Attribute key name
    #[serde(default = "default_inode_key")]
    pub key: String,
    /// Size of the inode record
    #[serde(default = "default_inode_size")]
    pub size: u64,
}

impl Default for InodeTemplate {
    fn default() -> Self {
        Self {
            key: default_inode_key(),
            size: DEFAULT_INODE_SIZE,
        }
    }
}

/// File metadata key template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetaTemplate {
    /// Number of records
    #[serde(default = "default_file_meta_records")]
    pub records: u64,
    /// Size of each record
    #[serde(default = "default_file_meta_size")]
    pub size: u64,
}

impl Default for FileMetaTemplate {
    fn default() -> Self {
        Self {
            records: DEFAULT_FILE_META_RECORDS,
            size: DEFAULT_FILE_META_SIZE,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_io_size() -> u64 {
    DEFAULT_IO_SIZE
}

const fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_inode_key() -> String {
    DEFAULT_INODE_KEY.to_string()
}

const fn default_inode_size() -> u64 {
    DEFAULT_INODE_SIZE
}

const fn default_file_meta_records() -> u64 {
    DEFAULT_FILE_META_RECORDS
}

const fn default_file_meta_size() -> u64 {
    DEFAULT_FILE_META_SIZE
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EstimatorConfig::default();
        assert_eq!(config.layout.chunk_size, 1_048_576);
        assert_eq!(config.layout.io_size, 131_072);
        assert!(!config.layout.ec_enabled());
        assert_eq!(config.layout.inode.key, "DFS_INODE");
        assert_eq!(config.layout.file_meta.records, 3);
        assert!(config.layout.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_toml() {
        let config = EstimatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, EstimatorConfig::default());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = EstimatorConfig::from_toml_str(
            r#"
            [layout]
            chunk_size = 4096
            cell_count = 4
            parity_count = 2
            stripe_size = 1024

            [layout.inode]
            size = 128

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.layout.chunk_size, 4096);
        assert_eq!(config.layout.io_size, DEFAULT_IO_SIZE);
        assert!(config.layout.ec_enabled());
        assert_eq!(config.layout.inode.key, "DFS_INODE");
        assert_eq!(config.layout.inode.size, 128);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = EstimatorConfig::from_toml_str("[layout]\nchunk_size = \"big\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_validate() {
        let config = LayoutConfig {
            io_size: 0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));

        let config = LayoutConfig {
            chunk_size: 0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().unwrap_err().is_fatal());

        let config = LayoutConfig::default().with_ec(2, 1, 0);
        assert!(config.validate().is_err());

        let config = LayoutConfig::default().with_ec(0, 1, 64);
        assert!(config.validate().is_err());

        let config = LayoutConfig::default().with_ec(2, 1, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let config = EstimatorConfig::load_or_default(Path::new("/nonexistent/estimator.toml"))
            .unwrap();
        assert_eq!(config, EstimatorConfig::default());
    }
}

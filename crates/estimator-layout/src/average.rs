//! Average-profile synthesis
//!
//! Extrapolates a layout from aggregate counters instead of the real tree:
//! one directory object repeated `total_dirs` times, plus one file object
//! repeated `total_files` times.

use crate::builder::{Layout, LayoutBuilder};
use crate::types::checked;
use estimator_common::{Error, LayoutConfig, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest entry name accepted for the synthesized names (`PATH_MAX`)
pub const MAX_NAME_SIZE: u64 = 4096;

/// Aggregate counters describing an average directory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageProfile {
    pub total_dirs: u64,
    pub total_files: u64,
    pub total_symlinks: u64,
    pub avg_symlink_size: u64,
    pub avg_name_size: u64,
    pub avg_file_size: u64,
}

impl AverageProfile {
    /// Symlinks per directory, rounded up
    #[must_use]
    pub const fn symlinks_per_dir(&self) -> u64 {
        if self.total_dirs == 0 {
            return 0;
        }
        self.total_symlinks.div_ceil(self.total_dirs)
    }

    /// Files and subdirectories per directory, rounded down
    pub fn entries_per_dir(&self) -> Result<u64> {
        if self.total_dirs == 0 {
            return Ok(0);
        }
        // (files + dirs) / dirs without the intermediate sum
        checked(
            (self.total_files / self.total_dirs).checked_add(1),
            "entries per directory",
        )
    }

    /// Synthesize the layout with a fresh builder
    pub fn synthesize(&self, config: &LayoutConfig) -> Result<Layout> {
        let mut builder = LayoutBuilder::new(config.clone())?;
        debug!("calculating average values");

        if self.total_dirs == 0 {
            return Ok(builder.into_layout());
        }

        if self.avg_name_size > MAX_NAME_SIZE {
            return Err(Error::invalid_input(format!(
                "average name size {} exceeds {MAX_NAME_SIZE} bytes",
                self.avg_name_size
            )));
        }
        let name_len = usize::try_from(self.avg_name_size)
            .map_err(|_| Error::invalid_input("average name size does not fit in memory"))?;
        let avg_name = "x".repeat(name_len);

        let dir = builder.create_object_with_count(self.total_dirs)?;

        let symlinks = self.symlinks_per_dir();
        if symlinks > 0 {
            debug!("assuming {} symlinks per directory", symlinks);
            debug!("assuming average symlink size of {} bytes", self.avg_symlink_size);
            builder.create_symlink(dir, &avg_name, self.avg_symlink_size, symlinks)?;
        }

        let entries = self.entries_per_dir()?;
        debug!("assuming {} files and directories per directory", entries);
        if entries > 0 {
            builder.create_directory_entry(dir, &avg_name, entries)?;
        }

        if self.total_files > 0 {
            debug!("assuming average file size of {} bytes", self.avg_file_size);
            builder.create_file_layout(self.avg_file_size, self.total_files)?;
        }

        Ok(builder.into_layout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyName;

    fn profile() -> AverageProfile {
        AverageProfile {
            total_dirs: 4,
            total_files: 10,
            total_symlinks: 5,
            avg_symlink_size: 20,
            avg_name_size: 6,
            avg_file_size: 3 * 1024 * 1024 + 5,
        }
    }

    #[test]
    fn test_no_directories_is_empty() {
        let profile = AverageProfile {
            total_dirs: 0,
            ..profile()
        };
        let layout = profile.synthesize(&LayoutConfig::default().with_ec(2, 1, 64)).unwrap();
        assert!(layout.container.is_empty());
        assert!(layout.ec_totals.is_empty());
    }

    #[test]
    fn test_per_directory_counts() {
        let profile = profile();
        assert_eq!(profile.symlinks_per_dir(), 2);
        assert_eq!(profile.entries_per_dir().unwrap(), 3);

        let crowded = AverageProfile {
            total_dirs: 1,
            total_files: u64::MAX - 1,
            ..profile
        };
        assert_eq!(crowded.entries_per_dir().unwrap(), u64::MAX);
        let overfull = AverageProfile {
            total_files: u64::MAX,
            ..crowded
        };
        assert!(matches!(overfull.entries_per_dir(), Err(Error::InvalidInput(_))));

        let exact = AverageProfile {
            total_symlinks: 8,
            ..profile
        };
        assert_eq!(exact.symlinks_per_dir(), 2);
    }

    #[test]
    fn test_synthesize_layout() {
        let layout = profile().synthesize(&LayoutConfig::default()).unwrap();
        let objects = layout.container.objects();
        assert_eq!(objects.len(), 2);

        let dir = &objects[0];
        assert_eq!(dir.count(), 4);
        assert_eq!(dir.keys().len(), 2);
        assert_eq!(dir.keys()[0].name(), &KeyName::Hashed("xxxxxx".into()));
        assert_eq!(dir.keys()[0].count(), 2);
        assert_eq!(dir.keys()[1].count(), 3);

        let file = &objects[1];
        assert_eq!(file.count(), 10);
        assert_eq!(file.footprint().unwrap().user_bytes, 10 * (3 * 1024 * 1024 + 5));
    }

    #[test]
    fn test_no_symlinks_no_files() {
        let profile = AverageProfile {
            total_dirs: 3,
            ..AverageProfile::default()
        };
        let layout = profile.synthesize(&LayoutConfig::default()).unwrap();
        assert_eq!(layout.container.len(), 1);

        let dir = &layout.container.objects()[0];
        assert_eq!(dir.keys().len(), 1);
        assert_eq!(dir.keys()[0].count(), 1);
        assert_eq!(dir.keys()[0].name(), &KeyName::Hashed(String::new()));
    }

    #[test]
    fn test_name_size_limit() {
        let at_limit = AverageProfile {
            total_dirs: 1,
            avg_name_size: MAX_NAME_SIZE,
            ..AverageProfile::default()
        };
        let layout = at_limit.synthesize(&LayoutConfig::default()).unwrap();
        let name = layout.container.objects()[0].keys()[0].name().to_string();
        assert_eq!(name.len(), 4096);

        for avg_name_size in [MAX_NAME_SIZE + 1, u64::MAX] {
            let profile = AverageProfile {
                avg_name_size,
                ..at_limit
            };
            let err = profile.synthesize(&LayoutConfig::default()).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
    }

    #[test]
    fn test_synthesize_ec_totals() {
        let config = LayoutConfig::default().with_ec(2, 1, 64);
        let profile = AverageProfile {
            total_dirs: 1,
            total_files: 5,
            avg_file_size: 200,
            ..AverageProfile::default()
        };
        let layout = profile.synthesize(&config).unwrap();
        assert_eq!(layout.ec_totals.file_size_total, 1000);
        assert_eq!(layout.ec_totals.payload_cells, 5 * 8);
        assert_eq!(layout.ec_totals.parity_cells, 5 * 4);
    }

    #[test]
    fn test_deterministic() {
        let config = LayoutConfig::default().with_ec(4, 2, 4096);
        let first = profile().synthesize(&config).unwrap();
        let second = profile().synthesize(&config).unwrap();
        assert_eq!(first, second);
    }
}

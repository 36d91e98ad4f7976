//! Traversal counters

use estimator_layout::AverageProfile;
use serde::{Deserialize, Serialize};

/// Counters accumulated over one traversal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    pub files: u64,
    pub dirs: u64,
    pub symlinks: u64,
    pub errors: u64,
    pub file_bytes: u64,
    pub symlink_bytes: u64,
    pub name_bytes: u64,
}

impl TraversalStats {
    /// Every entry seen, errors included
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.files + self.dirs + self.symlinks + self.errors
    }

    /// File, symlink and name bytes
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.file_bytes + self.symlink_bytes + self.name_bytes
    }

    #[must_use]
    pub const fn avg_name_size(&self) -> u64 {
        let items = self.files + self.dirs + self.symlinks;
        if items == 0 {
            0
        } else {
            self.name_bytes / items
        }
    }

    #[must_use]
    pub const fn avg_file_size(&self) -> u64 {
        if self.files == 0 {
            0
        } else {
            self.file_bytes / self.files
        }
    }

    #[must_use]
    pub const fn avg_symlink_size(&self) -> u64 {
        if self.symlinks == 0 {
            0
        } else {
            self.symlink_bytes / self.symlinks
        }
    }

    /// Counters for average-profile synthesis
    #[must_use]
    pub const fn average_profile(&self) -> AverageProfile {
        AverageProfile {
            total_dirs: self.dirs,
            total_files: self.files,
            total_symlinks: self.symlinks,
            avg_symlink_size: self.avg_symlink_size(),
            avg_name_size: self.avg_name_size(),
            avg_file_size: self.avg_file_size(),
        }
    }
}

//! Directory entry sources
//!
//! The explorer never touches the filesystem directly; it asks an
//! [`EntrySource`] for the entries of one directory at a time. [`LocalFs`]
//! reads the local filesystem, tests plug in their own sources.

use estimator_common::{Error, Result};
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of a directory entry, determined without following symlinks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Symlink,
    Directory,
    File,
    /// Sockets, FIFOs, devices
    Other,
}

/// One directory entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry name inside its parent
    pub name: OsString,
    /// Full path of the entry
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Size from `lstat` for files and symlinks, 0 otherwise
    pub size: u64,
}

impl EntryInfo {
    /// Create an entry under `parent`
    pub fn new(parent: &Path, name: impl Into<OsString>, kind: EntryKind, size: u64) -> Self {
        let name = name.into();
        Self {
            path: parent.join(&name),
            name,
            kind,
            size,
        }
    }

    /// Length of the name in bytes
    #[must_use]
    pub fn name_len(&self) -> u64 {
        self.name.as_encoded_bytes().len() as u64
    }

    /// Name as used for a layout key
    #[must_use]
    pub fn key_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// Capability to list directories
pub trait EntrySource {
    /// List the entries of a directory
    ///
    /// The outer error means the directory cannot be listed at all. An
    /// entry that cannot be classified or sized is returned in place as a
    /// [`Error::TraversalIo`] so the rest of the listing survives.
    /// Permission and I/O failures must be returned, not swallowed.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<Result<EntryInfo>>>;

    /// Resolve a directory path before it is queued
    fn resolve(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Local filesystem source
///
/// Entries are returned sorted by name, failed entries last, so repeated
/// walks of an unchanged tree produce the same layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl LocalFs {
    fn entry_info(entry: &fs::DirEntry) -> io::Result<EntryInfo> {
        let file_type = entry.file_type()?;

        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        let size = match kind {
            EntryKind::Symlink => fs::symlink_metadata(entry.path())?.len(),
            EntryKind::File => entry.metadata()?.len(),
            EntryKind::Directory | EntryKind::Other => 0,
        };

        Ok(EntryInfo {
            name: entry.file_name(),
            path: entry.path(),
            kind,
            size,
        })
    }
}

impl EntrySource for LocalFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<Result<EntryInfo>>> {
        let mut entries: Vec<Result<EntryInfo>> = fs::read_dir(path)?
            .map(|entry| match entry {
                Ok(entry) => {
                    Self::entry_info(&entry).map_err(|e| Error::traversal_io(entry.path(), e))
                }
                Err(e) => Err(Error::traversal_io(path, e)),
            })
            .collect();

        entries.sort_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => a.name.cmp(&b.name),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => Ordering::Equal,
        });
        Ok(entries)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

//! Breadth-first traversal
//!
//! Each queued directory moves through
//!
//! ```text
//! Queued -> Entering -> Scanning -> Done | Pruned | Errored
//! ```
//!
//! `Entering` creates the directory object, `Scanning` lists the directory
//! and adds one key per entry. A directory with no classified entries is
//! pruned from the container; one that cannot be listed keeps its object
//! with a single `unknown` entry.

use crate::source::{EntryInfo, EntryKind, EntrySource, LocalFs};
use crate::stats::TraversalStats;
use estimator_common::{Error, LayoutConfig, Result};
use estimator_layout::{Container, EcStats, Layout, LayoutBuilder, ObjectId};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace};

/// Name of the placeholder entry for unreadable directories
pub const UNKNOWN_ENTRY: &str = "unknown";

/// Traversal state of one directory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisitState {
    Queued,
    Entering,
    Scanning,
    /// Listed and kept
    Done,
    /// Listed, nothing classified, object removed
    Pruned,
    /// Listing failed, object kept with a placeholder entry
    Errored,
}

/// Outcome of processing one queued directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visit {
    pub path: PathBuf,
    pub state: VisitState,
    /// Classified entries added to the directory object
    pub entries: u64,
}

/// Walks a directory tree and builds its layout
pub struct Explorer<S = LocalFs> {
    root: PathBuf,
    source: S,
    builder: LayoutBuilder,
    queue: VecDeque<PathBuf>,
    stats: TraversalStats,
}

impl Explorer<LocalFs> {
    /// Create an explorer over the local filesystem
    pub fn new(root: impl Into<PathBuf>, config: LayoutConfig) -> Result<Self> {
        Self::with_source(root, config, LocalFs)
    }
}

impl<S: EntrySource> Explorer<S> {
    /// Create an explorer over a custom entry source
    pub fn with_source(root: impl Into<PathBuf>, config: LayoutConfig, source: S) -> Result<Self> {
        let mut explorer = Self {
            root: root.into(),
            source,
            builder: LayoutBuilder::new(config)?,
            queue: VecDeque::new(),
            stats: TraversalStats::default(),
        };
        explorer.restart();
        Ok(explorer)
    }

    /// Root path as given
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    #[must_use]
    pub const fn container(&self) -> &Container {
        self.builder.container()
    }

    #[must_use]
    pub const fn ec_totals(&self) -> EcStats {
        self.builder.ec_totals()
    }

    /// Number of directories waiting in the queue
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Clear all results and queue the root again
    pub fn restart(&mut self) {
        self.builder.reset();
        self.stats = TraversalStats::default();
        self.queue.clear();
        let root = self.source.resolve(&self.root);
        self.enqueue(root);
    }

    /// Walk the whole tree from the root
    ///
    /// Traversal errors are counted and skipped; only layout configuration
    /// and input errors abort the walk.
    pub fn explore(&mut self) -> Result<&TraversalStats> {
        info!("processing path: {}", self.root.display());
        self.restart();

        while self.step()?.is_some() {}

        info!(
            "explored {} directories, {} files, {} symlinks, {} errors",
            self.stats.dirs, self.stats.files, self.stats.symlinks, self.stats.errors
        );
        Ok(&self.stats)
    }

    /// Process the next queued directory, if any
    pub fn step(&mut self) -> Result<Option<Visit>> {
        let Some(path) = self.queue.pop_front() else {
            return Ok(None);
        };

        trace!(state = ?VisitState::Entering, "entering {}", path.display());
        debug!("entering {}", path.display());
        let oid = self.builder.create_object();

        trace!(state = ?VisitState::Scanning, "scanning {}", path.display());
        let visit = match self.source.read_dir(&path) {
            Ok(entries) => {
                let classified = self.scan(oid, entries)?;
                let state = if classified == 0 {
                    debug!("removing empty directory {}", path.display());
                    self.builder.remove_object(oid)?;
                    VisitState::Pruned
                } else {
                    VisitState::Done
                };
                Visit {
                    path,
                    state,
                    entries: classified,
                }
            }
            Err(source) => {
                self.skip(Error::traversal_io(&path, source))?;
                debug!("adding dummy entry {} for {}", oid, path.display());
                self.builder.create_dummy_entry(oid, UNKNOWN_ENTRY)?;
                Visit {
                    path,
                    state: VisitState::Errored,
                    entries: 0,
                }
            }
        };

        Ok(Some(visit))
    }

    /// Add every entry to the directory object, returning the classified count
    fn scan(&mut self, oid: ObjectId, entries: Vec<Result<EntryInfo>>) -> Result<u64> {
        let mut classified = 0;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.skip(err)?;
                    continue;
                }
            };
            let name = entry.key_name();
            match entry.kind {
                EntryKind::Symlink => {
                    debug!("symlink:   {}", name);
                    self.builder.create_symlink(oid, &name, entry.size, 1)?;
                    self.stats.symlinks += 1;
                    self.stats.symlink_bytes += entry.size;
                }
                EntryKind::Directory => {
                    debug!("directory: {}", name);
                    self.builder.create_directory_entry(oid, &name, 1)?;
                    let path = self.source.resolve(&entry.path);
                    self.enqueue(path);
                    self.stats.dirs += 1;
                }
                EntryKind::File => {
                    debug!("file:      {}", name);
                    self.builder.create_directory_entry(oid, &name, 1)?;
                    self.builder.create_file_layout(entry.size, 1)?;
                    self.stats.files += 1;
                    self.stats.file_bytes += entry.size;
                }
                EntryKind::Other => {
                    self.skip(Error::UnknownEntryKind { path: entry.path })?;
                    continue;
                }
            }
            self.stats.name_bytes += entry.name_len();
            classified += 1;
        }

        Ok(classified)
    }

    /// Log and count a traversal error; any other error aborts the pass
    fn skip(&mut self, err: Error) -> Result<()> {
        if !err.is_traversal() {
            return Err(err);
        }
        error!("{err} (skipped)");
        self.stats.errors += 1;
        Ok(())
    }

    fn enqueue(&mut self, path: PathBuf) {
        trace!(state = ?VisitState::Queued, "queued {}", path.display());
        self.queue.push_back(path);
    }

    /// Synthesize the average-profile layout from the current counters
    pub fn average_layout(&self) -> Result<Layout> {
        self.stats
            .average_profile()
            .synthesize(self.builder.config())
    }

    /// Finish the traversal
    #[must_use]
    pub fn into_layout(self) -> Layout {
        self.builder.into_layout()
    }
}

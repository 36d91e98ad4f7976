//! Storage Estimator Explorer - Filesystem traversal
//!
//! Walks a directory tree breadth-first and records every directory, file
//! and symlink through a [`estimator_layout::LayoutBuilder`]:
//! - [`Explorer`]: the traversal, one directory per [`Explorer::step`]
//! - [`EntrySource`]: how directory listings are obtained ([`LocalFs`])
//! - [`TraversalStats`]: counters collected on the way

pub mod explorer;
pub mod source;
pub mod stats;

pub use explorer::{Explorer, UNKNOWN_ENTRY, Visit, VisitState};
pub use source::{EntryInfo, EntryKind, EntrySource, LocalFs};
pub use stats::TraversalStats;

//! Storage Estimator Layout - Object/key/value model of the target store
//!
//! This crate converts filesystem facts into the layout the store would
//! write:
//! - **Primitives**: [`Container`], [`Object`], [`Key`], [`Value`]
//! - **EC accounting**: [`EcStats`] stripe and parity totals
//! - **Builder**: [`LayoutBuilder`] for files, symlinks and directory entries
//! - **Average profile**: [`AverageProfile`] extrapolation from counters
//!
//! # Example
//!
//! ```
//! use estimator_common::LayoutConfig;
//! use estimator_layout::LayoutBuilder;
//!
//! let mut builder = LayoutBuilder::new(LayoutConfig::default()).unwrap();
//! let dir = builder.create_object();
//! builder.create_directory_entry(dir, "data.bin", 1).unwrap();
//! builder.create_file_layout(1_500_000, 1).unwrap();
//!
//! let layout = builder.into_layout();
//! assert_eq!(layout.container.footprint().unwrap().user_bytes, 1_500_000);
//! ```

pub mod average;
pub mod builder;
pub mod ec;
pub mod types;

pub use average::AverageProfile;
pub use builder::{Layout, LayoutBuilder};
pub use ec::{EcStats, EcSummary};
pub use types::{
    Child, Container, Footprint, Key, KeyKind, KeyName, KeyType, Object, ObjectId, Overhead,
    Value, ValueType,
};

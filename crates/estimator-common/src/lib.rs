//! Storage Estimator Common - Shared configuration and errors
//!
//! This crate provides the configuration model and error definitions
//! used by the layout engine, the explorer, and the CLI.

pub mod config;
pub mod error;

pub use config::{EstimatorConfig, FileMetaTemplate, InodeTemplate, LayoutConfig, LoggingConfig};
pub use error::{Error, Result};

//! Foundation types for sortmerge.
//!
//! Shared by the merge engine and the command-line front end.
//!
//! # Key Types
//!
//! - [`MergeMode`] — Run-wide value kind and sort order
//! - [`SortKey`] — A line parsed for comparison under a [`MergeMode`]
//! - [`SourceId`] — Identity of one input within a run
//! - [`MergeConfig`] — Immutable, fully resolved run configuration
//! - [`ConfigFile`] — Optional TOML defaults merged under explicit options

pub mod config;
pub mod error;
pub mod mode;
pub mod source;

pub use config::{ConfigFile, MergeConfig, MAX_BUFFER_CAPACITY};
pub use error::{ConfigError, TypeError};
pub use mode::{MergeMode, SortKey, SortOrder, ValueKind};
pub use source::SourceId;

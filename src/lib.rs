//! Column-indexed level storage with a versioned binary file format.
//!
//! A [`Level`] owns a [`ColumnStore`] of [`LevelObject`]s bucketed by their
//! x coordinate. Level files are read through [`format`], which understands
//! every historical layout and upgrades legacy files in place on load.

pub mod config;
pub mod domain;
pub mod error;
pub mod format;
pub mod level;

pub use domain::object::{GridPos, LevelObject, ObjectKind};
pub use domain::store::ColumnStore;
pub use error::{LevelError, LevelResult};
pub use format::wire::DecodeLimits;
pub use format::FormatVersion;
pub use level::Level;

//! In-memory level model: placeable objects and the column store that owns them.

pub mod object;
pub mod store;

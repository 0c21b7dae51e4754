//! Binary level file formats.
//!
//! ## Version history
//!
//!   **1** — name, columns. Solid blocks only.
//!   **2** — floor/background/difficulty, name, columns. Solid blocks only.
//!   **3 (legacy)** — adds level id. Solid blocks only.
//!   **3** — current layout, all object variants.
//!
//! Both epochs of version 3 share the on-disk tag. Loading always treats
//! tag 3 as the current layout; the legacy-3 reader is only reached when a
//! caller asks for it explicitly (see [`legacy::Migrator`]).
//!
//! Decoding here is pure: bytes in, [`Level`] out. Rewriting files is the
//! level module's and the migrator's business.

pub mod current;
pub mod legacy;
pub mod wire;

use std::io::Read;

use crate::domain::object::{LevelObject, ObjectKind};
use crate::domain::store::ColumnStore;
use crate::error::{LevelError, LevelResult};
use crate::level::Level;
use wire::DecodeLimits;

/// Version tag written by the current encoder.
pub const CURRENT_VERSION: i32 = 3;

/// Layouts this crate can read. `V3` and `V3Legacy` share wire tag 3.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormatVersion {
    V1,
    V2,
    V3Legacy,
    V3,
}

impl FormatVersion {
    pub fn wire_tag(self) -> i32 {
        match self {
            FormatVersion::V1 => 1,
            FormatVersion::V2 => 2,
            FormatVersion::V3Legacy | FormatVersion::V3 => 3,
        }
    }

    pub fn is_current(self) -> bool {
        self == FormatVersion::V3
    }
}

/// Decode a full payload, dispatching on its version tag. Nothing is
/// written anywhere; legacy payloads come back with their source version.
pub fn decode<R: Read>(reader: &mut R, limits: &DecodeLimits) -> LevelResult<(Level, FormatVersion)> {
    let tag = wire::read_i32(reader, "version")?;
    if tag == CURRENT_VERSION {
        return Ok((current::decode_body(reader, limits)?, FormatVersion::V3));
    }
    let version = legacy::legacy_version(tag)?;
    Ok((legacy::decode_legacy(version, reader, limits)?, version))
}

/// Read `columnCount` columns of objects, rejecting any kind not in `allowed`.
pub(crate) fn read_columns<R: Read>(
    reader: &mut R,
    limits: &DecodeLimits,
    allowed: &[ObjectKind],
) -> LevelResult<ColumnStore> {
    let column_count = wire::read_count(reader, "column count", limits.max_columns)?;
    let mut columns = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        let object_count = wire::read_count(reader, "object count", limits.max_objects_per_column)?;
        let mut column = Vec::with_capacity(object_count);
        for _ in 0..object_count {
            let tag = wire::read_i32(reader, "object tag")?;
            let kind = ObjectKind::from_tag(tag)?;
            if !allowed.contains(&kind) {
                return Err(LevelError::UnsupportedVariant(tag));
            }
            column.push(LevelObject::decode_body(kind, reader)?);
        }
        columns.push(column);
    }

    let store = ColumnStore::from_columns(columns);
    let misplaced = store.misplaced();
    if misplaced > 0 {
        log::warn!("{misplaced} objects are stored outside their own column");
    }
    Ok(store)
}

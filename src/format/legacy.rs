//! Readers for superseded layouts and the in-place upgrade.
//!
//! ## Layouts (after the version tag)
//!
//!   **V1**        name, columns
//!   **V2**        floorType, backgroundType, difficulty, name, columns
//!   **V3 legacy** floorType, backgroundType, difficulty, levelID, name, columns
//!
//! Every legacy column holds solid blocks only; any other tag is fatal.
//! V1 has no level metadata at all and gets background/floor/difficulty 1.
//! V1 and V2 have no level id; it is recovered from the official level
//! names, defaulting to 0.
//!
//! ## Migration
//!
//! [`Migrator::run`] walks `Dispatch → Read* → Rewrite → Done`, dropping to
//! `Failed` on the first error. [`Migrator::finish`] enters at `Rewrite` for
//! a level that [`crate::format::decode`] has already read. Only `Rewrite`
//! touches the file system, and only after a complete decode. The new file is
//! written beside the old one and renamed over it, so a failed migration
//! leaves the source file untouched.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::domain::object::ObjectKind;
use crate::error::{LevelError, LevelResult};
use crate::format::wire::{self, DecodeLimits};
use crate::format::{read_columns, FormatVersion};
use crate::level::{write_replacing, Level};

/// Official levels whose id can be recovered from their name.
const OFFICIAL_LEVELS: &[(&str, i32)] = &[
    ("Stereo Madness", 0),
    ("Back On Track", 1),
    ("Polargeist", 2),
    ("Dry Out", 3),
];

/// Metadata value substituted for fields V1 never stored.
const V1_DEFAULT_TYPE: i32 = 1;

/// Level id for an official level name (case-insensitive), else 0.
pub fn official_level_id(name: &str) -> i32 {
    let lowered = name.to_lowercase();
    OFFICIAL_LEVELS
        .iter()
        .find(|(official, _)| official.to_lowercase() == lowered)
        .map_or(0, |&(_, id)| id)
}

/// Map a non-current wire tag to its legacy layout.
pub fn legacy_version(tag: i32) -> LevelResult<FormatVersion> {
    match tag {
        1 => Ok(FormatVersion::V1),
        2 => Ok(FormatVersion::V2),
        3 => Ok(FormatVersion::V3Legacy),
        other => Err(LevelError::UnsupportedVersion(other)),
    }
}

// ══════════════════════════════════════════════════════════════
// Pure decoders
// ══════════════════════════════════════════════════════════════

/// Decode everything after the version tag for a legacy layout.
pub fn decode_legacy<R: Read>(
    version: FormatVersion,
    reader: &mut R,
    limits: &DecodeLimits,
) -> LevelResult<Level> {
    match version {
        FormatVersion::V1 => read_v1(reader, limits),
        FormatVersion::V2 => read_v2(reader, limits),
        FormatVersion::V3Legacy => read_v3_legacy(reader, limits),
        FormatVersion::V3 => Err(LevelError::UnsupportedVersion(version.wire_tag())),
    }
}

const SOLID_ONLY: &[ObjectKind] = &[ObjectKind::SolidBlock];

fn read_v1<R: Read>(reader: &mut R, limits: &DecodeLimits) -> LevelResult<Level> {
    let name = wire::read_string(reader, "name", limits.max_name_len)?;
    let store = read_columns(reader, limits, SOLID_ONLY)?;
    let level_id = official_level_id(&name);
    Ok(Level::from_parts(
        name,
        store,
        V1_DEFAULT_TYPE,
        V1_DEFAULT_TYPE,
        V1_DEFAULT_TYPE,
        level_id,
    ))
}

fn read_v2<R: Read>(reader: &mut R, limits: &DecodeLimits) -> LevelResult<Level> {
    let floor_type = wire::read_i32(reader, "floor type")?;
    let background_type = wire::read_i32(reader, "background type")?;
    let difficulty = wire::read_i32(reader, "difficulty")?;
    let name = wire::read_string(reader, "name", limits.max_name_len)?;
    let store = read_columns(reader, limits, SOLID_ONLY)?;
    let level_id = official_level_id(&name);
    Ok(Level::from_parts(name, store, background_type, floor_type, difficulty, level_id))
}

fn read_v3_legacy<R: Read>(reader: &mut R, limits: &DecodeLimits) -> LevelResult<Level> {
    let floor_type = wire::read_i32(reader, "floor type")?;
    let background_type = wire::read_i32(reader, "background type")?;
    let difficulty = wire::read_i32(reader, "difficulty")?;
    let level_id = wire::read_i32(reader, "level id")?;
    let name = wire::read_string(reader, "name", limits.max_name_len)?;
    let store = read_columns(reader, limits, SOLID_ONLY)?;
    Ok(Level::from_parts(name, store, background_type, floor_type, difficulty, level_id))
}

// ══════════════════════════════════════════════════════════════
// In-place upgrade
// ══════════════════════════════════════════════════════════════

/// Overwrite `path` with `level` in the current layout.
///
/// The payload is encoded in memory first and written to a sibling temp
/// file, which is then renamed over `path`.
pub fn rewrite_in_place(path: &Path, level: &Level, limits: &DecodeLimits) -> LevelResult<()> {
    let bytes = level.encode_to_vec_with(limits)?;
    write_replacing(path, &bytes)?;
    Ok(())
}

enum MigrationState {
    Dispatch(FormatVersion),
    ReadV1,
    ReadV2,
    ReadV3Legacy,
    Rewrite(FormatVersion, Level),
    Done(Level),
    Failed(LevelError),
}

/// Upgrades one legacy file to the current layout.
pub struct Migrator {
    path: PathBuf,
    limits: DecodeLimits,
}

impl Migrator {
    pub fn new(path: impl Into<PathBuf>, limits: DecodeLimits) -> Self {
        Migrator { path: path.into(), limits }
    }

    /// Decode the rest of `reader` (version tag already consumed) with the
    /// `version` layout, rewrite the file in the current layout and return
    /// the level.
    pub fn run<R: Read>(&self, version: FormatVersion, reader: &mut R) -> LevelResult<Level> {
        self.drive(MigrationState::Dispatch(version), reader)
    }

    /// Rewrite the file for a level already decoded from `from`.
    pub fn finish(&self, from: FormatVersion, level: Level) -> LevelResult<Level> {
        self.drive(MigrationState::Rewrite(from, level), &mut io::empty())
    }

    fn drive<R: Read>(&self, mut state: MigrationState, reader: &mut R) -> LevelResult<Level> {
        loop {
            log::debug!("migrating {}: {:?}", self.path.display(), StateName(&state));
            state = match state {
                MigrationState::Dispatch(version) => match version {
                    FormatVersion::V1 => MigrationState::ReadV1,
                    FormatVersion::V2 => MigrationState::ReadV2,
                    FormatVersion::V3Legacy => MigrationState::ReadV3Legacy,
                    FormatVersion::V3 => {
                        MigrationState::Failed(LevelError::UnsupportedVersion(version.wire_tag()))
                    }
                },
                MigrationState::ReadV1 => self.read(FormatVersion::V1, reader),
                MigrationState::ReadV2 => self.read(FormatVersion::V2, reader),
                MigrationState::ReadV3Legacy => self.read(FormatVersion::V3Legacy, reader),
                MigrationState::Rewrite(from, level) => {
                    match rewrite_in_place(&self.path, &level, &self.limits) {
                        Ok(()) => {
                            log::info!(
                                "upgraded {} from version {} ({:?}) to version {}",
                                self.path.display(),
                                from.wire_tag(),
                                from,
                                crate::format::CURRENT_VERSION,
                            );
                            MigrationState::Done(level)
                        }
                        Err(e) => MigrationState::Failed(e),
                    }
                }
                MigrationState::Done(level) => return Ok(level),
                MigrationState::Failed(e) => {
                    log::warn!("migration of {} failed: {e}", self.path.display());
                    return Err(e);
                }
            };
        }
    }

    fn read<R: Read>(&self, version: FormatVersion, reader: &mut R) -> MigrationState {
        match decode_legacy(version, reader, &self.limits) {
            Ok(level) => MigrationState::Rewrite(version, level),
            Err(e) => MigrationState::Failed(e),
        }
    }
}

/// Logs a state without dumping a whole level.
struct StateName<'a>(&'a MigrationState);

impl std::fmt::Debug for StateName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            MigrationState::Dispatch(version) => return write!(f, "Dispatch({version:?})"),
            MigrationState::ReadV1 => "ReadV1",
            MigrationState::ReadV2 => "ReadV2",
            MigrationState::ReadV3Legacy => "ReadV3Legacy",
            MigrationState::Rewrite(..) => "Rewrite",
            MigrationState::Done(_) => "Done",
            MigrationState::Failed(_) => "Failed",
        };
        f.write_str(name)
    }
}

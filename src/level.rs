//! Level: metadata plus the column store, backed by a level file.
//!
//! ## Lifecycle
//!
//!   - [`Level::new`] — fresh level, `width + 1` empty columns, no file.
//!   - [`Level::load`] — decode a file. Legacy files are upgraded on disk
//!     before the level is returned, so the next load takes the current path.
//!   - [`Level::reload`] — re-decode the backing file, discarding anything
//!     appended since the last save.
//!
//! ## File naming
//!
//! `save(dir)` writes to `dir/<name>` with the name lower-cased and all
//! whitespace removed: "Back On Track" → `levels/backontrack`.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::domain::object::LevelObject;
use crate::domain::store::ColumnStore;
use crate::error::{LevelError, LevelResult};
use crate::format::legacy::{self, Migrator};
use crate::format::wire::{self, DecodeLimits};
use crate::format::{self, current, FormatVersion, CURRENT_VERSION};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub name: String,
    pub level_id: i32,
    pub background_type: i32,
    pub floor_type: i32,
    pub difficulty: i32,
    store: ColumnStore,
    source: Option<PathBuf>,
}

/// File name for a level: lower-cased, all whitespace removed.
pub fn level_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Replace `path` with `bytes` via a sibling `.tmp` file and a rename, so a
/// failed write never leaves `path` truncated.
pub(crate) fn write_replacing(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| std::fs::rename(&tmp_path, path)) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

impl Level {
    pub fn new(
        name: &str,
        width: i32,
        background_type: i32,
        floor_type: i32,
        difficulty: i32,
        level_id: i32,
    ) -> LevelResult<Self> {
        Ok(Self::from_parts(
            name.to_string(),
            ColumnStore::new(width)?,
            background_type,
            floor_type,
            difficulty,
            level_id,
        ))
    }

    /// Assemble a decoded level. No backing file yet.
    pub(crate) fn from_parts(
        name: String,
        store: ColumnStore,
        background_type: i32,
        floor_type: i32,
        difficulty: i32,
        level_id: i32,
    ) -> Self {
        Level {
            name,
            level_id,
            background_type,
            floor_type,
            difficulty,
            store,
            source: None,
        }
    }

    // ── Store access ──

    /// Read-only view for renderers and other consumers.
    pub fn store(&self) -> &ColumnStore {
        &self.store
    }

    pub fn add_object(&mut self, obj: LevelObject) -> LevelResult<()> {
        self.store.add_object(obj)
    }

    pub fn set_width(&mut self, width: i32) -> LevelResult<()> {
        self.store.set_width(width)
    }

    pub fn objects_at(&self, x: i32) -> Vec<&LevelObject> {
        self.store.objects_at(x)
    }

    pub fn objects_in(&self, x: i32, width: i32) -> Vec<&LevelObject> {
        self.store.objects_in(x, width)
    }

    /// File this level was last loaded from or saved to.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    // ── Encoding ──

    pub fn encode_to_vec(&self) -> LevelResult<Vec<u8>> {
        self.encode_to_vec_with(&DecodeLimits::default())
    }

    /// Encode, failing with `LimitExceeded` if `limits` could not read it back.
    pub fn encode_to_vec_with(&self, limits: &DecodeLimits) -> LevelResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(64 + self.store.object_count() * 16);
        current::encode_level(self, &mut buf, limits)?;
        Ok(buf)
    }

    /// Decode any supported version from memory. Never touches disk.
    pub fn decode_from_slice(bytes: &[u8], limits: &DecodeLimits) -> LevelResult<(Level, FormatVersion)> {
        let mut reader = bytes;
        format::decode(&mut reader, limits)
    }

    // ══════════════════════════════════════════════════════════════
    // Files
    // ══════════════════════════════════════════════════════════════

    pub fn load(path: &Path) -> LevelResult<Level> {
        Self::load_with(path, &DecodeLimits::default())
    }

    /// Load `path`, upgrading it on disk first if it is a legacy file.
    pub fn load_with(path: &Path, limits: &DecodeLimits) -> LevelResult<Level> {
        let bytes = std::fs::read(path)?;
        let (level, version) = format::decode(&mut &bytes[..], limits).map_err(|e| {
            if wire::read_i32(&mut &bytes[..], "version").ok() == Some(CURRENT_VERSION) {
                log::warn!(
                    "{} does not decode as version {CURRENT_VERSION} ({e}); \
                     it may be a legacy version 3 file, try `upgrade --legacy-v3`",
                    path.display(),
                );
            }
            e
        })?;

        let mut level = if version.is_current() {
            level
        } else {
            Migrator::new(path, *limits).finish(version, level)?
        };

        log::debug!(
            "loaded '{}' from {} ({} columns, {} objects)",
            level.name,
            path.display(),
            level.store.column_count(),
            level.store.object_count(),
        );
        level.source = Some(path.to_path_buf());
        Ok(level)
    }

    /// Treat `path` as a legacy file whatever its tag says, and upgrade it.
    ///
    /// Tag 3 is read with the legacy version 3 layout rather than the
    /// current one.
    pub fn migrate_file(path: &Path, limits: &DecodeLimits) -> LevelResult<Level> {
        let bytes = std::fs::read(path)?;
        let mut reader = &bytes[..];
        let tag = wire::read_i32(&mut reader, "version")?;
        let version = legacy::legacy_version(tag)?;
        let mut level = Migrator::new(path, *limits).run(version, &mut reader)?;
        level.source = Some(path.to_path_buf());
        Ok(level)
    }

    /// Re-read the backing file. Unsaved changes are lost.
    pub fn reload(&self) -> LevelResult<Level> {
        let path = self
            .source
            .as_deref()
            .ok_or_else(|| LevelError::NoBackingFile(self.name.clone()))?;
        Level::load(path)
    }

    /// Save to `levels_dir/<file name>`, creating the directory if needed.
    pub fn save(&mut self, levels_dir: &Path) -> LevelResult<PathBuf> {
        self.save_with(levels_dir, &DecodeLimits::default())
    }

    /// [`Level::save`], refusing levels that `limits` could not load back.
    pub fn save_with(&mut self, levels_dir: &Path, limits: &DecodeLimits) -> LevelResult<PathBuf> {
        let file_name = level_file_name(&self.name);
        if file_name.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("level name {:?} yields an empty file name", self.name),
            )
            .into());
        }
        std::fs::create_dir_all(levels_dir)?;
        let path = levels_dir.join(file_name);
        self.save_to_with(&path, limits)?;
        Ok(path)
    }

    /// Save to an explicit path and make it the backing file.
    pub fn save_to(&mut self, path: &Path) -> LevelResult<()> {
        self.save_to_with(path, &DecodeLimits::default())
    }

    pub fn save_to_with(&mut self, path: &Path, limits: &DecodeLimits) -> LevelResult<()> {
        let bytes = self.encode_to_vec_with(limits)?;
        write_replacing(path, &bytes)?;
        log::debug!("saved '{}' to {}", self.name, path.display());
        self.source = Some(path.to_path_buf());
        Ok(())
    }
}

//! External configuration loader.
//!
//! Reads `gdlevel.toml` from the executable's directory (or CWD).
//! Falls back to defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::format::wire::DecodeLimits;

pub const CONFIG_FILE: &str = "gdlevel.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct Config {
    pub levels_dir: PathBuf,
    pub limits: DecodeLimits,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    limits: TomlLimits,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlLimits {
    #[serde(default = "default_max_columns")]
    max_columns: usize,
    #[serde(default = "default_max_objects")]
    max_objects_per_column: usize,
    #[serde(default = "default_max_name_len")]
    max_name_len: usize,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_max_columns() -> usize { DecodeLimits::default().max_columns }
fn default_max_objects() -> usize { DecodeLimits::default().max_objects_per_column }
fn default_max_name_len() -> usize { DecodeLimits::default().max_name_len }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

impl Default for TomlLimits {
    fn default() -> Self {
        TomlLimits {
            max_columns: default_max_columns(),
            max_objects_per_column: default_max_objects(),
            max_name_len: default_max_name_len(),
        }
    }
}

// ── Loading ──

impl Config {
    /// Load config from `gdlevel.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse config text directly, resolving relative paths against `base`.
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[base.to_path_buf()]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            // First candidate that already has the folder, else relative to CWD
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        Config {
            levels_dir,
            limits: DecodeLimits {
                max_columns: toml_cfg.limits.max_columns,
                max_objects_per_column: toml_cfg.limits.max_objects_per_column,
                max_name_len: toml_cfg.limits.max_name_len,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::resolve(TomlConfig::default(), &[])
    }
}

/// Directories searched for the config file: exe dir (symlinks resolved),
/// then CWD.
fn candidate_dirs() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .map(|exe| exe.canonicalize().unwrap_or(exe))
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();

    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in exe_dir.into_iter().chain(cwd) {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Config from the first directory holding a readable `gdlevel.toml`.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    search_dirs
        .iter()
        .map(|dir| dir.join(CONFIG_FILE))
        .filter(|path| path.is_file())
        .find_map(|path| read_toml(&path))
        .unwrap_or_default()
}

/// `None` when the file cannot be read, so the search moves on. A file that
/// reads but does not parse ends the search with defaults.
fn read_toml(path: &Path) -> Option<TomlConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| log::warn!("could not read {}: {e}", path.display()))
        .ok()?;
    match toml::from_str::<TomlConfig>(&text) {
        Ok(cfg) => {
            log::debug!("using config {}", path.display());
            Some(cfg)
        }
        Err(e) => {
            log::warn!("{} parse error: {e}; using default settings", path.display());
            Some(TomlConfig::default())
        }
    }
}

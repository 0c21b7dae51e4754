//! Command-line front end: inspect, upgrade, query and author level files.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use gdlevel::config::Config;
use gdlevel::format::legacy::official_level_id;
use gdlevel::{GridPos, Level, LevelObject, LevelResult, ObjectKind};

#[derive(Parser)]
#[command(name = "gdlevel", about = "Inspect and upgrade column-indexed level files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print level metadata and object counts (upgrades legacy files)
    Info {
        file: PathBuf,
    },
    /// Rewrite a level file in the current format
    Upgrade {
        file: PathBuf,
        /// Read a version 3 file with the legacy (solid blocks only) layout
        #[arg(long)]
        legacy_v3: bool,
    },
    /// List objects around a column, or in a window when --width is given
    Query {
        file: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: i32,
        #[arg(long, allow_hyphen_values = true)]
        width: Option<i32>,
    },
    /// Create an empty level in the configured levels directory
    New {
        #[arg(long)]
        name: String,
        #[arg(long)]
        width: i32,
        #[arg(long, default_value_t = 1)]
        background: i32,
        #[arg(long, default_value_t = 1)]
        floor: i32,
        #[arg(long, default_value_t = 1)]
        difficulty: i32,
        /// Defaults to the official id for the name, else 0
        #[arg(long)]
        level_id: Option<i32>,
    },
    /// Append one object to a level and save it
    Add {
        file: PathBuf,
        kind: KindArg,
        #[arg(long)]
        x: i32,
        #[arg(long, default_value_t = 0)]
        y: i32,
        /// Solid block sprite
        #[arg(long, default_value_t = 0)]
        style: i32,
        /// Spike rotation in quarter turns
        #[arg(long, default_value_t = 0)]
        rotation: i32,
        /// Colour trigger channel (0 background, 1 floor)
        #[arg(long, default_value_t = 0)]
        channel: i32,
        /// Colour trigger target, e.g. 0x3366ff or #3366ff
        #[arg(long, default_value = "0xffffff", value_parser = parse_color)]
        color: i32,
        /// Colour trigger fade length in ticks
        #[arg(long, default_value_t = 0)]
        duration: i32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    SolidBlock,
    Spike,
    ColorTrigger,
}

fn parse_color(s: &str) -> Result<i32, String> {
    let hex = s.trim_start_matches('#').trim_start_matches("0x").trim_start_matches("0X");
    let value = u32::from_str_radix(hex, 16).map_err(|e| format!("bad colour {s:?}: {e}"))?;
    if value > 0x00FF_FFFF {
        return Err(format!("colour {s:?} is wider than 0xRRGGBB"));
    }
    Ok(value as i32)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load();

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> LevelResult<()> {
    match command {
        Command::Info { file } => {
            let level = Level::load_with(&file, &config.limits)?;
            print_info(&level);
        }
        Command::Upgrade { file, legacy_v3 } => {
            let mut level = if legacy_v3 {
                Level::migrate_file(&file, &config.limits)?
            } else {
                Level::load_with(&file, &config.limits)?
            };
            level.save_to_with(&file, &config.limits)?;
            println!("{}: version {}", file.display(), gdlevel::format::CURRENT_VERSION);
        }
        Command::Query { file, x, width } => {
            let level = Level::load_with(&file, &config.limits)?;
            let objects = match width {
                Some(w) => level.objects_in(x, w),
                None => level.objects_at(x),
            };
            for obj in &objects {
                println!("{}", describe(obj));
            }
            println!("{} objects", objects.len());
        }
        Command::New { name, width, background, floor, difficulty, level_id } => {
            let level_id = level_id.unwrap_or_else(|| official_level_id(&name));
            let mut level = Level::new(&name, width, background, floor, difficulty, level_id)?;
            let path = level.save_with(&config.levels_dir, &config.limits)?;
            println!("created {}", path.display());
        }
        Command::Add { file, kind, x, y, style, rotation, channel, color, duration } => {
            let pos = GridPos::new(x, y);
            let obj = match kind {
                KindArg::SolidBlock => LevelObject::SolidBlock { pos, style },
                KindArg::Spike => LevelObject::Spike { pos, rotation },
                KindArg::ColorTrigger => LevelObject::ColorTrigger { pos, channel, color, duration },
            };
            let line = describe(&obj);
            let mut level = Level::load_with(&file, &config.limits)?;
            level.add_object(obj)?;
            level.save_to_with(&file, &config.limits)?;
            println!("added {line}");
        }
    }
    Ok(())
}

fn print_info(level: &Level) {
    let store = level.store();
    println!("name:        {}", level.name);
    println!("level id:    {}", level.level_id);
    println!("background:  {}", level.background_type);
    println!("floor:       {}", level.floor_type);
    println!("difficulty:  {}", level.difficulty);
    println!("columns:     {} (width {})", store.column_count(), store.width());
    println!("objects:     {}", store.object_count());
    for kind in ObjectKind::ALL {
        println!("  {:<14} {}", kind.name(), store.count_of(kind));
    }
    let misplaced = store.misplaced();
    if misplaced > 0 {
        println!("misplaced:   {misplaced}");
    }
}

fn describe(obj: &LevelObject) -> String {
    let GridPos { x, y } = obj.pos();
    match *obj {
        LevelObject::SolidBlock { style, .. } => format!("solid-block   ({x}, {y}) style={style}"),
        LevelObject::Spike { rotation, .. } => format!("spike         ({x}, {y}) rotation={rotation}"),
        LevelObject::ColorTrigger { channel, color, duration, .. } => format!(
            "color-trigger ({x}, {y}) channel={channel} color=#{color:06x} duration={duration}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdlevel::{DecodeLimits, LevelError};

    fn config_in(dir: &std::path::Path) -> Config {
        Config { levels_dir: dir.to_path_buf(), limits: DecodeLimits::default() }
    }

    fn add_solid(file: PathBuf, x: i32) -> Command {
        Command::Add {
            file,
            kind: KindArg::SolidBlock,
            x,
            y: 0,
            style: 0,
            rotation: 0,
            channel: 0,
            color: 0,
            duration: 0,
        }
    }

    #[test]
    fn add_out_of_range_fails_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut level = Level::new("Narrow", 2, 1, 1, 1, 0).unwrap();
        let path = level.save(dir.path()).unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = run(add_solid(path.clone(), 9), &config_in(dir.path())).unwrap_err();
        assert!(matches!(err, LevelError::ColumnOutOfRange { x: 9, columns: 3 }));
        assert_eq!(std::fs::read(&path).unwrap(), before);

        run(add_solid(path.clone(), 2), &config_in(dir.path())).unwrap();
        assert_eq!(Level::load(&path).unwrap().store().object_count(), 1);
    }

    #[test]
    fn new_respects_configured_limits() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.limits.max_columns = 10;
        let new = |width| Command::New {
            name: "Capped".into(),
            width,
            background: 1,
            floor: 1,
            difficulty: 1,
            level_id: None,
        };

        assert!(matches!(run(new(10), &config), Err(LevelError::LimitExceeded { .. })));
        assert!(!dir.path().join("capped").exists());
        run(new(9), &config).unwrap();
        assert!(Level::load_with(&dir.path().join("capped"), &config.limits).is_ok());
    }

    #[test]
    fn colour_parsing() {
        assert_eq!(parse_color("#3366ff"), Ok(0x3366ff));
        assert_eq!(parse_color("0xFFFFFF"), Ok(0xffffff));
        assert!(parse_color("1000000").is_err());
        assert!(parse_color("green").is_err());
    }
}

//! File I/O for level descriptions
//!
//! The on-disk format is the serde form of [`LevelDescription`], written as
//! YAML (`.yaml`/`.yml`) or JSON (`.json`).

use super::{Coord, Direction, LevelDescription};
use anyhow::{Context, Result};
use std::path::Path;

/// Serialization formats understood for level files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFormat {
    Yaml,
    Json,
}

impl LevelFormat {
    /// Pick a format from a file extension, defaulting to YAML
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("json") => LevelFormat::Json,
            _ => LevelFormat::Yaml,
        }
    }
}

/// Load and validate a level from a YAML or JSON file
pub fn load_level_from_file<P: AsRef<Path>>(path: P) -> Result<LevelDescription> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read level file: {}", path.as_ref().display()))?;

    parse_level_from_str(&content, LevelFormat::from_path(&path))
        .with_context(|| format!("Failed to parse level from file: {}", path.as_ref().display()))
}

/// Parse a level and run the ingestion checks on it
pub fn parse_level_from_str(content: &str, format: LevelFormat) -> Result<LevelDescription> {
    let level: LevelDescription = match format {
        LevelFormat::Yaml => serde_yaml::from_str(content).context("Invalid YAML level")?,
        LevelFormat::Json => serde_json::from_str(content).context("Invalid JSON level")?,
    };

    level.validate().context("Level failed validation")?;
    Ok(level)
}

/// Save a level, choosing the format from the file extension
pub fn save_level_to_file<P: AsRef<Path>>(level: &LevelDescription, path: P) -> Result<()> {
    let content = match LevelFormat::from_path(&path) {
        LevelFormat::Yaml => serde_yaml::to_string(level).context("Failed to serialize level")?,
        LevelFormat::Json => serde_json::to_string_pretty(level).context("Failed to serialize level")?,
    };

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write level to file: {}", path.as_ref().display()))?;

    Ok(())
}

/// Load every level file in a directory, sorted by file name.
///
/// Files that fail to load are reported and skipped.
pub fn load_levels_from_directory<P: AsRef<Path>>(dir_path: P) -> Result<Vec<(String, LevelDescription)>> {
    let dir = std::fs::read_dir(&dir_path)
        .with_context(|| format!("Failed to read directory: {}", dir_path.as_ref().display()))?;

    let mut levels = Vec::new();

    for entry in dir {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        let is_level = path.is_file()
            && matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml" | "json"));
        if !is_level {
            continue;
        }

        let name = path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match load_level_from_file(&path) {
            Ok(level) => levels.push((name, level)),
            Err(e) => tracing::warn!(event = "level_skipped", path = %path.display(), error = %e),
        }
    }

    levels.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(levels)
}

/// Small hand-made levels used by `setup` and by the tests
pub fn example_levels() -> Vec<(&'static str, LevelDescription)> {
    use Direction::*;

    // E R X
    let straight = LevelDescription::new(3, 1, 1, Coord::new(0, 0), Coord::new(2, 0))
        .with_rail(West, East, Coord::new(1, 0));

    // E . X  -- nothing connects the entrance to the exit
    let blocked = LevelDescription::new(3, 1, 1, Coord::new(0, 0), Coord::new(2, 0));

    // . . . . .
    // E R R R X
    // . a . A .
    let delivery = LevelDescription::new(5, 3, 1, Coord::new(0, 1), Coord::new(4, 1))
        .with_rail(West, East, Coord::new(1, 1))
        .with_rail(West, East, Coord::new(2, 1))
        .with_rail(West, East, Coord::new(3, 1))
        .with_alien(0, Coord::new(1, 0))
        .with_house(0, Coord::new(3, 0));

    // X R R R
    // . A a R
    // E R R R
    let detour = LevelDescription::new(4, 3, 1, Coord::new(0, 0), Coord::new(0, 2))
        .with_rail(West, East, Coord::new(1, 0))
        .with_rail(West, East, Coord::new(2, 0))
        .with_rail(West, North, Coord::new(3, 0))
        .with_rail(South, North, Coord::new(3, 1))
        .with_rail(South, West, Coord::new(3, 2))
        .with_rail(East, West, Coord::new(2, 2))
        .with_rail(East, West, Coord::new(1, 2))
        .with_alien(0, Coord::new(2, 1))
        .with_house(0, Coord::new(1, 1));

    vec![
        ("straight", straight),
        ("blocked", blocked),
        ("delivery", delivery),
        ("detour", detour),
    ]
}

/// Write the example levels as YAML files into `output_dir`
pub fn create_example_levels<P: AsRef<Path>>(output_dir: P) -> Result<()> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    for (name, level) in example_levels() {
        save_level_to_file(&level, dir.join(format!("{name}.yaml")))
            .with_context(|| format!("Failed to write example level {name}"))?;
    }

    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::MapId;

pub const DEFAULT_TARGET_TPS: u32 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read world config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("world config {path} is invalid at `{field}`: {message}")]
    Parse {
        path: PathBuf,
        field: String,
        message: String,
    },
    #[error("world config {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Directory and id-list file for one resource kind, relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDir {
    pub dir: PathBuf,
    pub id_list: PathBuf,
}

impl KindDir {
    fn new(dir: &str, id_list: &str) -> Self {
        Self {
            dir: PathBuf::from(dir),
            id_list: PathBuf::from(id_list),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDirs {
    pub tilesets: KindDir,
    pub blocksets: KindDir,
    pub layouts: KindDir,
    pub maps: KindDir,
}

impl Default for AssetDirs {
    fn default() -> Self {
        Self {
            tilesets: KindDir::new("tilesets", "tilesets.txt"),
            blocksets: KindDir::new("blocksets", "blocksets.txt"),
            layouts: KindDir::new("layouts", "layouts.txt"),
            maps: KindDir::new("maps", "maps.txt"),
        }
    }
}

/// How many recently used resources each cache keeps alive with no other holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCapacities {
    pub tilesets: usize,
    pub blocksets: usize,
    pub layouts: usize,
    pub maps: usize,
}

impl Default for CacheCapacities {
    fn default() -> Self {
        Self {
            tilesets: 16,
            blocksets: 16,
            layouts: 32,
            maps: 32,
        }
    }
}

/// Timer decrement per tick for each kind of move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSpeeds {
    pub normal: f32,
    pub running: f32,
    pub blocked: f32,
    pub jump: f32,
}

impl Default for MovementSpeeds {
    fn default() -> Self {
        Self {
            normal: 0.1,
            running: 0.2,
            blocked: 0.05,
            jump: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 160,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StartPosition {
    pub map: MapId,
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub asset_dirs: AssetDirs,
    pub cache: CacheCapacities,
    pub movement: MovementSpeeds,
    pub viewport: ViewportConfig,
    pub start: StartPosition,
    pub target_tps: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            asset_dirs: AssetDirs::default(),
            cache: CacheCapacities::default(),
            movement: MovementSpeeds::default(),
            viewport: ViewportConfig::default(),
            start: StartPosition::default(),
            target_tps: DEFAULT_TARGET_TPS,
        }
    }
}

pub fn load_world_config(path: &Path) -> Result<WorldConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_world_config(path, &raw)
}

pub fn parse_world_config(path: &Path, raw: &str) -> Result<WorldConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: WorldConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            field: error.path().to_string(),
            message: error.inner().to_string(),
        })?;
    validate(path, &config)?;
    Ok(config)
}

fn validate(path: &Path, config: &WorldConfig) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    };
    let speeds = [
        ("normal", config.movement.normal),
        ("running", config.movement.running),
        ("blocked", config.movement.blocked),
        ("jump", config.movement.jump),
    ];
    for (name, speed) in speeds {
        if !(speed > 0.0 && speed <= 1.0) {
            return Err(invalid(format!(
                "movement.{name} must be in (0, 1], got {speed}"
            )));
        }
    }
    if config.viewport.width == 0 || config.viewport.height == 0 {
        return Err(invalid("viewport must be non-empty".to_string()));
    }
    if config.target_tps == 0 {
        return Err(invalid("target_tps must be positive".to_string()));
    }
    if config.start.elevation as usize >= crate::content::ELEVATION_COUNT {
        return Err(invalid(format!(
            "start.elevation {} out of range",
            config.start.elevation
        )));
    }
    Ok(())
}

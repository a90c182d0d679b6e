use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub mod config;
pub mod content;
pub mod render;
pub mod session;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{
    load_world_config, parse_world_config, ConfigError, MovementSpeeds, StartPosition,
    WorldConfig,
};
pub use content::{LoadError, MapId};
pub use render::{draw_map, Frame};
pub use session::{Session, StepInput};
pub use world::{
    Arrival, Behavior, Direction, MovementMode, Obj, ObjId, ObjKind, Position, Registry, World,
    WorldError,
};

pub const ROOT_ENV_VAR: &str = "OVERWORLD_ROOT";
pub const WORLD_CONFIG_FILE: &str = "world.json";
pub const PLAYER_COLOR: [u8; 3] = [232, 72, 56];

#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub config_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "OVERWORLD_ROOT is set but does not point to a directory containing assets/: {path}"
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not find an assets/ directory walking upward from {start_dir}.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/overworld\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

pub fn resolve_asset_paths() -> Result<AssetPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    let config_path = assets_dir.join(WORLD_CONFIG_FILE);
    Ok(AssetPaths {
        root,
        assets_dir,
        config_path,
    })
}

/// Reads `world.json` when present; an asset tree without one runs on
/// defaults.
pub fn load_config_for(paths: &AssetPaths) -> Result<WorldConfig, ConfigError> {
    if paths.config_path.is_file() {
        load_world_config(&paths.config_path)
    } else {
        info!(path = %paths.config_path.display(), "world_config_defaulted");
        Ok(WorldConfig::default())
    }
}

/// Opens the registry, spawns the player at the configured start and
/// populates the start map's NPCs.
pub fn open_world(
    paths: &AssetPaths,
    config: &WorldConfig,
) -> Result<(World, ObjId), StartupError> {
    let registry = Registry::open(&paths.assets_dir, &config.asset_dirs, &config.cache)?;
    let mut world = World::new(registry, config.movement);
    let start = config.start;
    // Resolving the start cell loads the start map and rejects a bad id early.
    world.registry().get_block(start.map, start.x, start.y)?;
    let player = world.spawn(Obj::new(
        ObjKind::Player,
        Position {
            map: start.map,
            x: start.x,
            y: start.y,
            elevation: start.elevation,
        },
        PLAYER_COLOR,
    ));
    world.populate_map_objs(start.map)?;
    info!(
        map_id = start.map,
        map = world.registry().map_name(start.map).unwrap_or("<unnamed>"),
        x = start.x,
        y = start.y,
        "world_opened"
    );
    Ok((world, player))
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_root_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_root_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_root_marker(path: &Path) -> bool {
    path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod agent;
pub mod body;
pub mod config;
pub mod geometry;
pub mod motion;
pub mod nav;
pub mod pixels;
pub mod sight;
mod sprite_keys;
pub mod steering;
#[cfg(test)]
mod test_support;
pub mod tiles;
pub mod world;

pub use agent::{
    Agent, AgentId, AgentKind, AgentSprites, Animation, EnemyKind, HitOutcome, PickupKind, Vitals,
    Weapon,
};
pub use body::{Body, Viewport};
pub use config::{AnimationLags, EnemyPolicies, SimConfig, SimConfigError, WeaponTuning};
pub use geometry::{manhattan_distance, wrap_degrees, Direction, PixelPoint, TileCoord};
pub use motion::{DirectionIntent, LinearMotion, MotionTuning, SteeringPolicy};
pub use nav::{tile_centre_px, NodeIndex, PathGraph, PathNode, Route, SearchStats};
pub use pixels::{
    bodies_touch, objects_collide, point_occupied, tile_collision, AssetError, AssetStore,
    MaskColour, MaskCut, MaskHandle, PixelMask, SpriteFrames, TILE_ATLAS_KEY,
};
pub use sight::{
    aim, line_of_sight, muzzle_point, trace_sight, InSights, SightCandidate, SightRay, SightTrace,
};
pub use sprite_keys::{animation_key, SpriteKeyError};
pub use steering::{
    calculate_node_goal, SteeringContext, SteeringController, SteeringState, SteeringTuning,
};
pub use tiles::{
    blocks_movement, blocks_sight, classify, GridError, KeyKind, KeyRing, KeyTile, KeyTileKind,
    SpawnMarker, TileAtlas, TileCategory, TileCode, TileGrid, TileUnlock, UnlockOutcome,
    DOOR_KEY_CODE, MAIN_KEY_CODE, PROGRESS_AREA_CODE, SPENT_KEY_CODE, WALKABLE_CODE,
};
pub use world::{
    AttackSource, PlayerSprites, ShotReport, TickInput, TickReport, World, WorldError,
    WorldSystemId, WORLD_SYSTEM_ORDER,
};

pub const ROOT_ENV_VAR: &str = "HORDE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub sprites_dir: PathBuf,
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
        "HORDE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/horde\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Locates the project root; the asset directories need not exist.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    let sprites_dir = assets_dir.join("sprites");
    Ok(AppPaths {
        root,
        assets_dir,
        sprites_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
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

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
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

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

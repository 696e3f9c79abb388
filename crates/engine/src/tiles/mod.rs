mod codes;
mod grid;
mod keys;

pub use codes::{
    blocks_movement, blocks_sight, classify, KeyKind, SpawnMarker, TileCategory, TileCode,
    DOOR_KEY_CODE, MAIN_KEY_CODE, PROGRESS_AREA_CODE, SPENT_KEY_CODE, WALKABLE_CODE,
};
pub use grid::{GridError, TileAtlas, TileGrid, DEFAULT_ATLAS_COLUMNS};
pub use keys::{KeyRing, KeyTile, KeyTileKind, TileUnlock, UnlockOutcome};

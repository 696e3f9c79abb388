use tracing::{debug, info};

use crate::geometry::TileCoord;

use super::codes::{classify, KeyKind, TileCategory, TileCode, SPENT_KEY_CODE};
use super::grid::TileGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileUnlock {
    pub tile: TileCoord,
    pub new_code: TileCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTileKind {
    /// Counts toward opening the level exit.
    Main,
    Door,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTile {
    pub tile: TileCoord,
    pub kind: KeyTileKind,
    pub triggered: bool,
    pub unlocks: Vec<TileUnlock>,
}

impl KeyTile {
    pub fn new(tile: TileCoord, kind: KeyTileKind, unlocks: Vec<TileUnlock>) -> Self {
        Self {
            tile,
            kind,
            triggered: false,
            unlocks,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnlockOutcome {
    pub triggered: bool,
    pub grid_changed: bool,
    pub level_completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: Vec<KeyTile>,
    main_keys_total: usize,
    main_keys_activated: usize,
    level_complete: bool,
}

impl KeyRing {
    pub fn new(keys: Vec<KeyTile>) -> Self {
        let main_keys_total = keys
            .iter()
            .filter(|key| key.kind == KeyTileKind::Main)
            .count();
        Self {
            keys,
            main_keys_total,
            main_keys_activated: 0,
            level_complete: false,
        }
    }

    pub fn keys(&self) -> &[KeyTile] {
        &self.keys
    }

    pub fn main_keys_total(&self) -> usize {
        self.main_keys_total
    }

    pub fn main_keys_activated(&self) -> usize {
        self.main_keys_activated
    }

    pub fn level_complete(&self) -> bool {
        self.level_complete
    }

    /// Handles the mover standing on `tile`. The caller must rebuild any path
    /// graph when `grid_changed` is reported.
    pub fn trigger_at(&mut self, grid: &mut TileGrid, tile: TileCoord) -> UnlockOutcome {
        let mut outcome = UnlockOutcome::default();
        let Some(code) = grid.code_at(tile) else {
            return outcome;
        };
        if !matches!(
            classify(code),
            TileCategory::Key(KeyKind::Main) | TileCategory::Key(KeyKind::Door)
        ) {
            return outcome;
        }
        let Some(key) = self
            .keys
            .iter_mut()
            .find(|key| !key.triggered && key.tile == tile)
        else {
            debug!(x = tile.x, y = tile.y, "key_tile_without_registration");
            return outcome;
        };

        key.triggered = true;
        outcome.triggered = true;
        outcome.grid_changed |= grid.set_code(tile, SPENT_KEY_CODE);

        if key.kind == KeyTileKind::Main {
            self.main_keys_activated += 1;
            if self.main_keys_activated < self.main_keys_total {
                info!(
                    x = tile.x,
                    y = tile.y,
                    activated = self.main_keys_activated,
                    total = self.main_keys_total,
                    "main_key_collected"
                );
                return outcome;
            }
            self.level_complete = true;
            outcome.level_completed = true;
        }

        for unlock in &key.unlocks {
            outcome.grid_changed |= grid.set_code(unlock.tile, unlock.new_code);
        }
        info!(
            x = tile.x,
            y = tile.y,
            kind = ?key.kind,
            unlocked_tiles = key.unlocks.len(),
            level_completed = outcome.level_completed,
            "key_tile_triggered"
        );
        outcome
    }

    pub fn progress_reached(&self, grid: &TileGrid, tile: TileCoord) -> bool {
        self.level_complete
            && grid
                .code_at(tile)
                .is_some_and(|code| classify(code) == TileCategory::ProgressArea)
    }
}

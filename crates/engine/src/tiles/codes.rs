use crate::agent::{EnemyKind, PickupKind};

pub type TileCode = i32;

pub const WALKABLE_CODE: TileCode = 0;
pub const PROGRESS_AREA_CODE: TileCode = 2;
pub const MAIN_KEY_CODE: TileCode = 124;
pub const SPENT_KEY_CODE: TileCode = 125;
pub const DOOR_KEY_CODE: TileCode = 126;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Main,
    Door,
    Spent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnMarker {
    Enemy(EnemyKind),
    Pickup(PickupKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileCategory {
    Walkable,
    /// Stops movement but lets sight and bullets through (low obstacles).
    Barrier,
    Wall,
    Key(KeyKind),
    ProgressArea,
    Spawn(SpawnMarker),
}

impl TileCategory {
    pub fn blocks_movement(self) -> bool {
        matches!(self, Self::Barrier | Self::Wall)
    }

    pub fn blocks_sight(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// Total over every code; anything unlisted is plain floor.
pub fn classify(code: TileCode) -> TileCategory {
    match code {
        15..=26 => TileCategory::Barrier,
        30..=41 | 45..=60 | 66..=123 => TileCategory::Wall,
        PROGRESS_AREA_CODE => TileCategory::ProgressArea,
        MAIN_KEY_CODE => TileCategory::Key(KeyKind::Main),
        SPENT_KEY_CODE => TileCategory::Key(KeyKind::Spent),
        DOOR_KEY_CODE => TileCategory::Key(KeyKind::Door),
        63 => TileCategory::Spawn(SpawnMarker::Enemy(EnemyKind::Speedy)),
        64 => TileCategory::Spawn(SpawnMarker::Enemy(EnemyKind::Zombie)),
        65 => TileCategory::Spawn(SpawnMarker::Enemy(EnemyKind::Armoured)),
        127 => TileCategory::Spawn(SpawnMarker::Pickup(PickupKind::Armour)),
        128 => TileCategory::Spawn(SpawnMarker::Pickup(PickupKind::Ammo)),
        129 => TileCategory::Spawn(SpawnMarker::Pickup(PickupKind::Health)),
        _ => TileCategory::Walkable,
    }
}

pub fn blocks_movement(code: TileCode) -> bool {
    classify(code).blocks_movement()
}

pub fn blocks_sight(code: TileCode) -> bool {
    classify(code).blocks_sight()
}

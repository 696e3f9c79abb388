use std::path::Path;
use std::sync::Arc;

use engine::tiles::DEFAULT_ATLAS_COLUMNS;
use engine::{
    animation_key, classify, tile_centre_px, AgentSprites, AssetError, AssetStore, Body,
    EnemyKind, GridError, KeyRing, KeyTile, KeyTileKind, MaskColour, MaskCut, MaskHandle,
    PickupKind, PixelMask, PlayerSprites, SimConfig, SpawnMarker, TileAtlas, TileCategory,
    TileCode, TileCoord, TileGrid, TileUnlock, Vitals, World, WorldError, DOOR_KEY_CODE,
    MAIN_KEY_CODE, PROGRESS_AREA_CODE, TILE_ATLAS_KEY, WALKABLE_CODE,
};
use thiserror::Error;
use tracing::{debug, info};

const WALL_CODE: TileCode = 35;
const LOW_BARRIER_CODE: TileCode = 20;
const SPEEDY_SPAWN_CODE: TileCode = 63;
const ZOMBIE_SPAWN_CODE: TileCode = 64;
const ARMOURED_SPAWN_CODE: TileCode = 65;
const ARMOUR_SPAWN_CODE: TileCode = 127;
const AMMO_SPAWN_CODE: TileCode = 128;
const HEALTH_SPAWN_CODE: TileCode = 129;
const MAX_TILE_CODE: TileCode = HEALTH_SPAWN_CODE;

/// `P` player start, `X` wall opened by every door key, `D`/`K` door and main
/// keys, `E` exit, lowercase letters spawn agents.
const DEMO_ROWS: [&str; 11] = [
    "##################",
    "#P.....#.........#",
    "#......#....z....#",
    "#......#.........#",
    "#..h...X....a....#",
    "#......#.........#",
    "#..D...#===.##...#",
    "#..m...........s.#",
    "#......#....r..K.#",
    "#......#......E..#",
    "##################",
];

const PLAYER_SIZE: u32 = 24;
const ENEMY_SIZE: u32 = 22;
const PICKUP_SIZE: u32 = 16;

/// `(family, animation, mask size, synthetic frame count)`.
const SPRITE_TABLE: [(&str, &str, u32, usize); 17] = [
    ("player", "pistol_walk", PLAYER_SIZE, 4),
    ("player", "pistol_shot", PLAYER_SIZE, 2),
    ("player", "rifle_walk", PLAYER_SIZE, 4),
    ("player", "rifle_shot", PLAYER_SIZE, 3),
    ("player", "melee", PLAYER_SIZE, 7),
    ("zombie", "walk", ENEMY_SIZE, 4),
    ("zombie", "attack", ENEMY_SIZE, 3),
    ("zombie", "death", ENEMY_SIZE, 4),
    ("armoured", "walk", ENEMY_SIZE, 4),
    ("armoured", "attack", ENEMY_SIZE, 3),
    ("armoured", "death", ENEMY_SIZE, 4),
    ("speedy", "walk", ENEMY_SIZE, 4),
    ("speedy", "attack", ENEMY_SIZE, 3),
    ("speedy", "death", ENEMY_SIZE, 4),
    ("pickup", "health", PICKUP_SIZE, 1),
    ("pickup", "ammo", PICKUP_SIZE, 1),
    ("pickup", "armour", PICKUP_SIZE, 1),
];

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("unknown level cell '{cell}' at ({x}, {y})")]
    UnknownCell { cell: char, x: u32, y: u32 },
    #[error("level has no player start")]
    MissingPlayerStart,
}

pub(crate) struct DemoLevel {
    pub(crate) world: World,
    /// Tiles the autopilot visits in order: door key, main key, exit.
    pub(crate) objectives: Vec<TileCoord>,
}

#[derive(Debug, Default)]
struct ParsedLevel {
    width: u32,
    height: u32,
    codes: Vec<TileCode>,
    player_start: Option<TileCoord>,
    door_targets: Vec<TileCoord>,
    door_keys: Vec<TileCoord>,
    main_keys: Vec<TileCoord>,
    exits: Vec<TileCoord>,
    spawns: Vec<(TileCoord, SpawnMarker)>,
}

/// Fills the store from `sprites_dir/<family>/<animation>/*.png` where those
/// directories exist and synthesises disc masks for the rest.
pub(crate) fn load_sprite_store(sprites_dir: Option<&Path>) -> Result<AssetStore, AssetError> {
    let mut store = AssetStore::new(MaskColour::BLACK);
    let mut loaded = 0_usize;
    for (family, animation, size, count) in SPRITE_TABLE {
        let key = animation_key(family, animation);
        let cut = if animation == "melee" {
            MaskCut::Front { centre_y: 0.5 }
        } else {
            MaskCut::Full
        };
        let dir = sprites_dir
            .map(|root| root.join(family).join(animation))
            .filter(|dir| dir.is_dir());
        match dir {
            Some(dir) => {
                store.load_directory(&key, &dir, cut)?;
                loaded += 1;
            }
            None => {
                store.insert_frames(&key, vec![disc_mask(size); count])?;
            }
        }
    }
    if let Some(dir) = sprites_dir.map(|root| root.join(TILE_ATLAS_KEY)) {
        if dir.is_dir() {
            store.load_directory(TILE_ATLAS_KEY, &dir, MaskCut::Full)?;
        }
    }
    info!(
        animations = SPRITE_TABLE.len(),
        loaded_from_disk = loaded,
        "sprite_store_ready"
    );
    Ok(store)
}

fn disc_mask(size: u32) -> PixelMask {
    let radius = f64::from(size) / 2.0;
    PixelMask::from_fn(size, size, |x, y| {
        let dx = f64::from(x) + 0.5 - radius;
        let dy = f64::from(y) + 0.5 - radius;
        dx * dx + dy * dy <= radius * radius
    })
}

pub(crate) fn build_demo_level(
    config: SimConfig,
    store: &AssetStore,
) -> Result<DemoLevel, DemoError> {
    let parsed = parse_rows(&DEMO_ROWS)?;
    let tile_size = config.tile_size;
    let atlas = if store.contains(TILE_ATLAS_KEY) {
        store.tile_atlas(tile_size, DEFAULT_ATLAS_COLUMNS)?
    } else {
        TileAtlas::opaque(tile_size, MAX_TILE_CODE)?
    };
    let grid = TileGrid::new(parsed.width, parsed.height, parsed.codes, Arc::new(atlas))?;

    let unlocks: Vec<TileUnlock> = parsed
        .door_targets
        .iter()
        .map(|&tile| TileUnlock {
            tile,
            new_code: WALKABLE_CODE,
        })
        .collect();
    let keys = parsed
        .door_keys
        .iter()
        .map(|&tile| KeyTile::new(tile, KeyTileKind::Door, unlocks.clone()))
        .chain(
            parsed
                .main_keys
                .iter()
                .map(|&tile| KeyTile::new(tile, KeyTileKind::Main, Vec::new())),
        )
        .collect();

    let start = parsed.player_start.ok_or(DemoError::MissingPlayerStart)?;
    let player_sprites = PlayerSprites {
        pistol_walk: store.frames(&animation_key("player", "pistol_walk"))?,
        pistol_shot: store.frames(&animation_key("player", "pistol_shot"))?,
        rifle_walk: store.frames(&animation_key("player", "rifle_walk"))?,
        rifle_shot: store.frames(&animation_key("player", "rifle_shot"))?,
        melee: store.frames(&animation_key("player", "melee"))?,
    };
    let player_body = body_at(
        store.handle(&animation_key("player", "pistol_walk"))?,
        start,
        tile_size,
    )
    .with_initial_rotation(std::f64::consts::FRAC_PI_2);

    let mut world = World::new(
        config,
        grid,
        KeyRing::new(keys),
        player_body,
        player_sprites,
        Vitals::default(),
    )?;
    for kind in [PickupKind::Health, PickupKind::Ammo, PickupKind::Armour] {
        world.register_pickup_sprites(kind, store.frames(&pickup_key(kind))?);
    }

    for &(tile, marker) in &parsed.spawns {
        match marker {
            SpawnMarker::Enemy(kind) => {
                let sprites = enemy_sprites(store, kind)?;
                let handle = MaskHandle::new(sprites.walk.clone(), 0)
                    .ok_or_else(|| AssetError::NoFrames(kind.sprite_family().to_string()))?;
                world.spawn_enemy(kind, body_at(handle, tile, tile_size), sprites);
            }
            SpawnMarker::Pickup(kind) => {
                let handle = store.handle(&pickup_key(kind))?;
                world.spawn_pickup(kind, body_at(handle, tile, tile_size));
            }
        }
    }

    let objectives = parsed
        .door_keys
        .iter()
        .chain(&parsed.main_keys)
        .chain(&parsed.exits)
        .copied()
        .collect();
    info!(
        spawns = parsed.spawns.len(),
        door_keys = parsed.door_keys.len(),
        main_keys = parsed.main_keys.len(),
        "demo_level_built"
    );
    Ok(DemoLevel { world, objectives })
}

fn parse_rows(rows: &[&str]) -> Result<ParsedLevel, DemoError> {
    let mut level = ParsedLevel {
        width: rows.first().map_or(0, |row| row.len()) as u32,
        height: rows.len() as u32,
        ..ParsedLevel::default()
    };
    for (y, row) in rows.iter().enumerate() {
        for (x, cell) in row.chars().enumerate() {
            let tile = TileCoord::new(x as u32, y as u32);
            let code = match cell {
                '.' => WALKABLE_CODE,
                '#' => WALL_CODE,
                '=' => LOW_BARRIER_CODE,
                'P' => {
                    level.player_start = Some(tile);
                    WALKABLE_CODE
                }
                'X' => {
                    level.door_targets.push(tile);
                    WALL_CODE
                }
                'D' => {
                    level.door_keys.push(tile);
                    DOOR_KEY_CODE
                }
                'K' => {
                    level.main_keys.push(tile);
                    MAIN_KEY_CODE
                }
                'E' => {
                    level.exits.push(tile);
                    PROGRESS_AREA_CODE
                }
                'z' => ZOMBIE_SPAWN_CODE,
                'a' => ARMOURED_SPAWN_CODE,
                's' => SPEEDY_SPAWN_CODE,
                'h' => HEALTH_SPAWN_CODE,
                'm' => AMMO_SPAWN_CODE,
                'r' => ARMOUR_SPAWN_CODE,
                other => {
                    return Err(DemoError::UnknownCell {
                        cell: other,
                        x: tile.x,
                        y: tile.y,
                    })
                }
            };
            // Spawn markers become floor once their agent exists.
            let code = match classify(code) {
                TileCategory::Spawn(marker) => {
                    debug!(x = tile.x, y = tile.y, marker = ?marker, "spawn_marker_found");
                    level.spawns.push((tile, marker));
                    WALKABLE_CODE
                }
                _ => code,
            };
            level.codes.push(code);
        }
    }
    Ok(level)
}

fn body_at(handle: MaskHandle, tile: TileCoord, tile_size: u32) -> Body {
    Body::new(tile_centre_px(tile, tile_size), handle, 0.5, 0.5)
}

fn enemy_sprites(store: &AssetStore, kind: EnemyKind) -> Result<AgentSprites, AssetError> {
    let family = kind.sprite_family();
    Ok(AgentSprites {
        walk: store.frames(&animation_key(family, "walk"))?,
        attack: store.frames(&animation_key(family, "attack"))?,
        death: store.frames(&animation_key(family, "death"))?,
    })
}

fn pickup_key(kind: PickupKind) -> String {
    let name = match kind {
        PickupKind::Health => "health",
        PickupKind::Ammo => "ammo",
        PickupKind::Armour => "armour",
    };
    animation_key("pickup", name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldSystemId {
    PlayerInput,
    KeyTiles,
    Pickups,
    Enemies,
    Sight,
    Weapons,
}

impl WorldSystemId {
    pub fn name(self) -> &'static str {
        match self {
            Self::PlayerInput => "PlayerInput",
            Self::KeyTiles => "KeyTiles",
            Self::Pickups => "Pickups",
            Self::Enemies => "Enemies",
            Self::Sight => "Sight",
            Self::Weapons => "Weapons",
        }
    }
}

pub const WORLD_SYSTEM_ORDER: [WorldSystemId; 6] = [
    WorldSystemId::PlayerInput,
    WorldSystemId::KeyTiles,
    WorldSystemId::Pickups,
    WorldSystemId::Enemies,
    WorldSystemId::Sight,
    WorldSystemId::Weapons,
];

#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] SimConfigError),
    #[error("grid tile size {grid} does not match configured tile size {config}")]
    TileSizeMismatch { grid: u32, config: u32 },
}

/// Player controls sampled for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub intent: DirectionIntent,
    pub running: bool,
    /// World pixel the player faces and aims at.
    pub aim_point: PixelPoint,
    /// Trigger pulled this tick.
    pub fire: bool,
    /// Trigger released this tick; only the rifle cares.
    pub cease_fire: bool,
    pub melee: bool,
    pub switch_weapon: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackSource {
    Pistol,
    Rifle,
    Melee,
}

impl From<Weapon> for AttackSource {
    fn from(weapon: Weapon) -> Self {
        match weapon {
            Weapon::Pistol => Self::Pistol,
            Weapon::Rifle => Self::Rifle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotReport {
    pub target: AgentId,
    pub source: AttackSource,
    pub outcome: HitOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// False when the tick was skipped by the interval gate or game over.
    pub ticked: bool,
    pub player_moved: bool,
    pub keys_triggered: u32,
    pub graph_rebuilt: bool,
    /// Every main key has been collected.
    pub level_completed: bool,
    /// The player stepped onto the progress area of a completed level.
    pub level_progressed: bool,
    pub pickups_collected: Vec<PickupKind>,
    pub enemies_spotted: u32,
    pub enemies_moved: u32,
    pub player_hits: Vec<HitOutcome>,
    pub shots: Vec<ShotReport>,
    pub despawned: Vec<AgentId>,
    pub dropped: Vec<AgentId>,
    pub in_sights: InSights,
    pub player_dead: bool,
}

/// Player frame sets per weapon.
#[derive(Debug, Clone)]
pub struct PlayerSprites {
    pub pistol_walk: SpriteFrames,
    pub pistol_shot: SpriteFrames,
    pub rifle_walk: SpriteFrames,
    pub rifle_shot: SpriteFrames,
    pub melee: SpriteFrames,
}

impl PlayerSprites {
    pub fn still(frames: SpriteFrames) -> Self {
        Self {
            pistol_walk: frames.clone(),
            pistol_shot: frames.clone(),
            rifle_walk: frames.clone(),
            rifle_shot: frames.clone(),
            melee: frames,
        }
    }

    pub fn walk(&self, weapon: Weapon) -> &SpriteFrames {
        match weapon {
            Weapon::Pistol => &self.pistol_walk,
            Weapon::Rifle => &self.rifle_walk,
        }
    }

    pub fn shot(&self, weapon: Weapon) -> &SpriteFrames {
        match weapon {
            Weapon::Pistol => &self.pistol_shot,
            Weapon::Rifle => &self.rifle_shot,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PlayerState {
    weapon: Weapon,
    firing: bool,
    melee: bool,
    /// Facing the aim point would push the sprite into terrain.
    rotation_blocked: bool,
}

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::motion::{LinearMotion, SteeringPolicy};
use crate::pixels::{MaskHandle, SpriteFrames};
use crate::steering::SteeringController;

const MAX_HEALTH: i32 = 100;
const MAX_ARMOUR: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Zombie,
    Armoured,
    Speedy,
}

impl EnemyKind {
    pub fn default_policy(self) -> SteeringPolicy {
        match self {
            Self::Zombie => SteeringPolicy::new(2.0, 6.0),
            Self::Armoured => SteeringPolicy::new(2.0, 5.0),
            Self::Speedy => SteeringPolicy::new(4.0, 10.0),
        }
    }

    pub fn starting_vitals(self) -> Vitals {
        match self {
            Self::Armoured => Vitals::new(MAX_HEALTH, MAX_ARMOUR),
            Self::Zombie | Self::Speedy => Vitals::new(MAX_HEALTH, 0),
        }
    }

    pub fn sprite_family(self) -> &'static str {
        match self {
            Self::Zombie => "zombie",
            Self::Armoured => "armoured",
            Self::Speedy => "speedy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Armour,
    Ammo,
    Health,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    /// One shot per trigger pull, no ammo.
    #[default]
    Pistol,
    /// Fires while the trigger is held, one round every third frame.
    Rifle,
}

impl Weapon {
    pub fn toggled(self) -> Self {
        match self {
            Self::Pistol => Self::Rifle,
            Self::Rifle => Self::Pistol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Player,
    Enemy(EnemyKind),
    Pickup(PickupKind),
}

impl AgentKind {
    pub fn enemy(self) -> Option<EnemyKind> {
        match self {
            Self::Enemy(kind) => Some(kind),
            Self::Player | Self::Pickup(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub health_lost: i32,
    pub armour_lost: i32,
    pub killed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    pub health: i32,
    pub armour: i32,
    pub ammo: u32,
    dead: bool,
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(MAX_HEALTH, 0)
    }
}

impl Vitals {
    pub fn new(health: i32, armour: i32) -> Self {
        Self {
            health,
            armour,
            ammo: 0,
            dead: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Damage response of an enemy to a shot landing `crit_distance` pixels
    /// from its centre.
    pub fn apply_enemy_hit(&mut self, kind: EnemyKind, crit_distance: i32) -> HitOutcome {
        let before = *self;
        match kind {
            EnemyKind::Zombie => {
                self.health -= match crit_distance {
                    d if d <= 14 => 100,
                    d if d <= 24 => 50,
                    _ => 10,
                };
            }
            EnemyKind::Armoured => {
                let base = match crit_distance {
                    d if d <= 14 => 10,
                    d if d <= 24 => 5,
                    _ => 1,
                };
                if self.armour > 0 {
                    self.armour -= base * 2;
                } else {
                    self.health -= base * 10;
                }
            }
            EnemyKind::Speedy => {
                self.health -= if crit_distance <= 22 { 100 } else { 34 };
            }
        }
        let killed = !before.dead && self.health <= 0;
        self.dead |= killed;
        HitOutcome {
            health_lost: before.health - self.health,
            armour_lost: before.armour - self.armour,
            killed,
        }
    }

    /// Melee hits on the player come off armour first.
    pub fn apply_player_hit(&mut self) -> HitOutcome {
        let before = *self;
        if self.armour > 0 {
            self.armour -= 10;
        } else {
            self.health -= 15;
        }
        let killed = !before.dead && self.health < 1;
        self.dead |= killed;
        HitOutcome {
            health_lost: before.health - self.health,
            armour_lost: before.armour - self.armour,
            killed,
        }
    }

    pub fn collect(&mut self, pickup: PickupKind, ammo_amount: u32) {
        match pickup {
            PickupKind::Health => self.health = (self.health + 50).min(MAX_HEALTH),
            PickupKind::Armour => self.armour = MAX_ARMOUR,
            PickupKind::Ammo => self.ammo = self.ammo.saturating_add(ammo_amount),
        }
    }
}

/// Frame counter that advances once more than `lag_ms` has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Animation {
    frame: usize,
    last_updated_ms: u64,
}

impl Animation {
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }

    pub fn set_frame(&mut self, frame: usize) {
        self.frame = frame;
    }

    pub fn advance(&mut self, now_ms: u64, frame_count: usize, lag_ms: u64) -> bool {
        let mut updated = false;
        if now_ms.saturating_sub(self.last_updated_ms) > lag_ms {
            self.frame += 1;
            self.last_updated_ms = now_ms;
            updated = true;
        }
        self.frame %= frame_count.max(1);
        updated
    }
}

/// Frame sets an agent animates through.
#[derive(Debug, Clone)]
pub struct AgentSprites {
    pub walk: SpriteFrames,
    pub attack: SpriteFrames,
    pub death: SpriteFrames,
}

impl AgentSprites {
    /// One set for every pose; used by pickups and synthetic levels.
    pub fn still(frames: SpriteFrames) -> Self {
        Self {
            walk: frames.clone(),
            attack: frames.clone(),
            death: frames,
        }
    }

    pub fn walk_handle(&self) -> Option<MaskHandle> {
        MaskHandle::new(self.walk.clone(), 0)
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    pub body: Body,
    pub vitals: Vitals,
    pub motion: LinearMotion,
    pub animation: Animation,
    pub sprites: AgentSprites,
    pub steering: Option<SteeringController>,
    /// Enemy has seen the player and keeps chasing when off screen.
    pub spotted: bool,
    pub attacking: bool,
    pub moving: bool,
}

impl Agent {
    pub fn new(
        id: AgentId,
        kind: AgentKind,
        body: Body,
        vitals: Vitals,
        motion: LinearMotion,
        sprites: AgentSprites,
    ) -> Self {
        let steering = kind.enemy().map(|_| SteeringController::new());
        Self {
            id,
            kind,
            body,
            vitals,
            motion,
            animation: Animation::default(),
            sprites,
            steering,
            spotted: false,
            attacking: false,
            moving: false,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn is_dead(&self) -> bool {
        self.vitals.is_dead()
    }

    /// Shows `frame` of `frames` as the current mask.
    pub fn show_frame(&mut self, frames: &SpriteFrames, frame: usize) {
        if let Some(handle) = MaskHandle::new(frames.clone(), frame % frames.len().max(1)) {
            self.body.set_current_mask(handle);
        }
    }

    /// Applies a shot; armoured enemies also wake up.
    pub fn take_shot(&mut self, crit_distance: i32) -> Option<HitOutcome> {
        let kind = self.kind.enemy()?;
        if kind == EnemyKind::Armoured {
            self.spotted = true;
        }
        let outcome = self.vitals.apply_enemy_hit(kind, crit_distance);
        if outcome.killed {
            self.animation.reset();
            self.attacking = false;
            self.moving = false;
        }
        Some(outcome)
    }
}

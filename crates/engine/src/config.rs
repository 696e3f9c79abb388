use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{EnemyKind, Weapon};
use crate::body::Viewport;
use crate::geometry::PixelPoint;
use crate::motion::{MotionTuning, SteeringPolicy};
use crate::steering::SteeringTuning;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimConfigError {
    #[error("tile_size must be greater than zero")]
    ZeroTileSize,
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("viewport {width}x{height} leaves no room above a {hud_height}px HUD")]
    ViewportTooSmall {
        width: i32,
        height: i32,
        hud_height: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyPolicies {
    pub zombie: SteeringPolicy,
    pub armoured: SteeringPolicy,
    pub speedy: SteeringPolicy,
}

impl Default for EnemyPolicies {
    fn default() -> Self {
        Self {
            zombie: EnemyKind::Zombie.default_policy(),
            armoured: EnemyKind::Armoured.default_policy(),
            speedy: EnemyKind::Speedy.default_policy(),
        }
    }
}

impl EnemyPolicies {
    pub fn for_kind(&self, kind: EnemyKind) -> SteeringPolicy {
        match kind {
            EnemyKind::Zombie => self.zombie,
            EnemyKind::Armoured => self.armoured,
            EnemyKind::Speedy => self.speedy,
        }
    }
}

/// Frame lags in milliseconds; a frame advances once more than this has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationLags {
    pub enemy_walk_ms: u64,
    pub enemy_melee_ms: u64,
    pub enemy_death_ms: u64,
    pub player_walk_ms: u64,
    pub player_shot_ms: u64,
    pub player_melee_ms: u64,
}

impl Default for AnimationLags {
    fn default() -> Self {
        Self {
            enemy_walk_ms: 100,
            enemy_melee_ms: 100,
            enemy_death_ms: 80,
            player_walk_ms: 200,
            player_shot_ms: 40,
            player_melee_ms: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    /// Muzzle offsets from the player's centre in unrotated sprite space.
    pub pistol_muzzle: PixelPoint,
    pub rifle_muzzle: PixelPoint,
    /// Aim points closer than the muzzle offset plus this are ignored.
    pub aim_buffer: f32,
    pub melee_crit: i32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            pistol_muzzle: PixelPoint::new(11, 35),
            rifle_muzzle: PixelPoint::new(12, 20),
            aim_buffer: 54.0,
            melee_crit: 11,
        }
    }
}

impl WeaponTuning {
    pub fn muzzle(&self, weapon: Weapon) -> PixelPoint {
        match weapon {
            Weapon::Pistol => self.pistol_muzzle,
            Weapon::Rifle => self.rifle_muzzle,
        }
    }
}

/// Simulation tuning. Every field has a default, so a JSON override only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tile_size: u32,
    pub tick_interval_ms: u64,
    pub fine_sight_step: f32,
    pub motion: MotionTuning,
    pub steering: SteeringTuning,
    /// Enemies start a melee swing when their centre is closer than this.
    pub attack_range: i32,
    /// Extra slack around a pickup before the pixel test runs.
    pub pickup_reach: i32,
    pub ammo_pickup_amount: u32,
    pub player_policy: SteeringPolicy,
    pub enemy_policies: EnemyPolicies,
    pub viewport: Viewport,
    pub animation: AnimationLags,
    pub weapons: WeaponTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: 64,
            tick_interval_ms: 20,
            fine_sight_step: 7.0,
            motion: MotionTuning::default(),
            steering: SteeringTuning::default(),
            attack_range: 34,
            pickup_reach: 40,
            ammo_pickup_amount: 15,
            player_policy: SteeringPolicy::PLAYER,
            enemy_policies: EnemyPolicies::default(),
            viewport: Viewport::new(1300, 800, 100),
            animation: AnimationLags::default(),
            weapons: WeaponTuning::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.tile_size == 0 {
            return Err(SimConfigError::ZeroTileSize);
        }
        let positive = [
            ("fine_sight_step", f64::from(self.fine_sight_step)),
            ("motion.speed_divisor", f64::from(self.motion.speed_divisor)),
            (
                "steering.coarse_sight_step",
                f64::from(self.steering.coarse_sight_step),
            ),
            (
                "steering.goal_tolerance_divisor",
                f64::from(self.steering.goal_tolerance_divisor),
            ),
            (
                "steering.corner_buffer_divisor",
                f64::from(self.steering.corner_buffer_divisor),
            ),
            ("steering.cone_half_angle", self.steering.cone_half_angle),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(SimConfigError::NotPositive { field, value });
            }
        }
        let viewport = self.viewport;
        if viewport.width <= 0 || viewport.height <= viewport.hud_height {
            return Err(SimConfigError::ViewportTooSmall {
                width: viewport.width,
                height: viewport.height,
                hud_height: viewport.hud_height,
            });
        }
        Ok(())
    }
}

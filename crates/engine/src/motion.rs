use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::pixels::tile_collision;
use crate::tiles::TileGrid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringPolicy {
    pub acceleration: f32,
    pub max_speed: f32,
}

impl SteeringPolicy {
    pub const PLAYER: Self = Self::new(2.0, 7.0);

    pub const fn new(acceleration: f32, max_speed: f32) -> Self {
        Self {
            acceleration,
            max_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Velocities are divided by this before becoming pixel steps.
    pub speed_divisor: i32,
    pub run_bonus: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            speed_divisor: 2,
            run_bonus: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionIntent {
    pub fn is_idle(self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }

    /// Overlapping cones around each cardinal; `degrees` is in `[-180, 180)`
    /// with 0 = east and 90 = south.
    pub fn from_cone(degrees: f64, half_cone: f64) -> Self {
        Self {
            right: degrees > -half_cone && degrees < half_cone,
            left: degrees > 180.0 - half_cone || degrees < -180.0 + half_cone,
            down: degrees > 90.0 - half_cone && degrees < 90.0 + half_cone,
            up: degrees > -90.0 - half_cone && degrees < -90.0 + half_cone,
        }
    }
}

/// Accelerating four-direction motion with hard stops and terrain rejection.
#[derive(Debug, Clone)]
pub struct LinearMotion {
    policy: SteeringPolicy,
    tuning: MotionTuning,
    intent: DirectionIntent,
    running: bool,
    velocity_x: f32,
    velocity_y: f32,
}

impl LinearMotion {
    pub fn new(policy: SteeringPolicy, tuning: MotionTuning) -> Self {
        Self {
            policy,
            tuning,
            intent: DirectionIntent::default(),
            running: false,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }

    pub fn policy(&self) -> SteeringPolicy {
        self.policy
    }

    pub fn intent(&self) -> DirectionIntent {
        self.intent
    }

    pub fn set_intent(&mut self, intent: DirectionIntent) {
        self.intent = intent;
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Held keys are lost while paused, so callers clear intent explicitly.
    pub fn stop(&mut self) {
        self.intent = DirectionIntent::default();
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.velocity_x, self.velocity_y)
    }

    pub fn max_speed(&self) -> f32 {
        if self.running {
            self.policy.max_speed + self.tuning.run_bonus
        } else {
            self.policy.max_speed
        }
    }

    /// Advances one step. Returns whether the body moved.
    pub fn update(&mut self, body: &mut Body, grid: &TileGrid, exact: bool) -> bool {
        if !body.is_visible() || self.intent.is_idle() {
            return false;
        }
        let max_speed = self.max_speed();
        self.accelerate(max_speed);
        if !self.clamp_speed(max_speed) {
            return false;
        }

        let divisor = self.tuning.speed_divisor.max(1);
        let dx = self.velocity_x.trunc() as i32 / divisor;
        let dy = self.velocity_y.trunc() as i32 / divisor;
        if dx == 0 && dy == 0 {
            return false;
        }
        if tile_collision(body, grid, dx, dy, exact) {
            return false;
        }
        body.translate(dx, dy);
        true
    }

    fn accelerate(&mut self, max_speed: f32) {
        let acceleration = self.policy.acceleration;
        let intent = self.intent;
        if intent.up {
            self.velocity_y = if self.velocity_y > 0.0 {
                0.0
            } else {
                (self.velocity_y - acceleration).max(-max_speed)
            };
        }
        if intent.down {
            self.velocity_y = if self.velocity_y < 0.0 {
                0.0
            } else {
                (self.velocity_y + acceleration).min(max_speed)
            };
        }
        if intent.right {
            self.velocity_x = if self.velocity_x < 0.0 {
                0.0
            } else {
                (self.velocity_x + acceleration).min(max_speed)
            };
        }
        if intent.left {
            self.velocity_x = if self.velocity_x > 0.0 {
                0.0
            } else {
                (self.velocity_x - acceleration).max(-max_speed)
            };
        }
        if !intent.up && !intent.down {
            self.velocity_y = 0.0;
        }
        if !intent.left && !intent.right {
            self.velocity_x = 0.0;
        }
    }

    fn clamp_speed(&mut self, max_speed: f32) -> bool {
        let speed = self.velocity_x.hypot(self.velocity_y);
        if speed <= 0.0 {
            return false;
        }
        if speed > max_speed {
            self.velocity_x *= max_speed / speed;
            self.velocity_y *= max_speed / speed;
        }
        true
    }
}

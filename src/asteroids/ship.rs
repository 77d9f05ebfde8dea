//! Player ship: rotate, thrust, drift with friction, wrap around the field.

use crate::core::entity::Body;
use crate::core::geom::{Field, Size, Vec2};
use crate::core::input::{InputSampler, Key};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct ShipTuning {
    pub size: Size,
    pub start: Vec2,
    pub thrust: f64,
    pub max_speed: f64,
    pub friction: f64,
    /// Radians per tick.
    pub turn_speed: f64,
    pub wrap_margin: f64,
    /// Lasers leave the ship this far ahead of its centre.
    pub muzzle_distance: f64,
    pub lives: u32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            size: Size::new(30.0, 22.0),
            start: Vec2::new(600.0, 350.0),
            thrust: 0.3,
            max_speed: 8.0,
            friction: 0.98,
            turn_speed: 0.15,
            wrap_margin: 20.0,
            muzzle_distance: 20.0,
            lives: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct LaserTuning {
    pub size: Size,
    pub speed: f64,
    pub life_ticks: u32,
    pub cooldown_ms: f64,
    pub margin: f64,
}

impl Default for LaserTuning {
    fn default() -> Self {
        Self { size: Size::new(4.0, 8.0), speed: 15.0, life_ticks: 60, cooldown_ms: 150.0, margin: 50.0 }
    }
}

#[derive(Clone, Debug)]
pub struct Ship {
    pub body: Body,
    /// Radians; 0 faces up the screen.
    pub angle: f64,
    pub lives: u32,
    last_shot: Option<f64>,
}

impl Ship {
    pub fn new(tuning: &ShipTuning) -> Self {
        Self {
            body: Body::new(tuning.start, Vec2::ZERO, tuning.size),
            angle: 0.0,
            lives: tuning.lives,
            last_shot: None,
        }
    }

    pub fn heading(&self) -> Vec2 {
        Vec2::from_heading(self.angle)
    }

    /// One tick of flight: steer from held keys, apply friction and the
    /// speed cap, move, then wrap.
    pub fn fly(&mut self, input: &InputSampler, tuning: &ShipTuning, field: Field) {
        if input.is_held(Key::RotateLeft) {
            self.angle -= tuning.turn_speed;
        }
        if input.is_held(Key::RotateRight) {
            self.angle += tuning.turn_speed;
        }
        if input.is_held(Key::Thrust) {
            self.body.vel += self.heading() * tuning.thrust;
        }
        if input.is_held(Key::Reverse) {
            self.body.vel += self.heading() * -tuning.thrust;
        }
        self.body.vel = (self.body.vel * tuning.friction).clamp_length(tuning.max_speed);
        self.body.integrate();
        self.body.pos = field.wrap(self.body.pos, tuning.wrap_margin);
    }

    /// Trigger check against the cooldown. Returns the laser's start position
    /// and velocity when a shot goes off.
    pub fn try_fire(&mut self, now: f64, ship: &ShipTuning, laser: &LaserTuning) -> Option<(Vec2, Vec2)> {
        if self.last_shot.is_some_and(|t| now - t <= laser.cooldown_ms) {
            return None;
        }
        self.last_shot = Some(now);
        let heading = self.heading();
        Some((self.body.center() + heading * ship.muzzle_distance, heading * laser.speed))
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

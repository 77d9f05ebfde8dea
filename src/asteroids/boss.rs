//! The boss: a big cat that patrols the top of the field and lobs projectiles
//! at the ship. One exists at a time; each defeat raises the tier.

use rand::Rng;

use crate::core::entity::Body;
use crate::core::geom::{Field, Size, Vec2};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct BossTuning {
    pub first_threshold: u64,
    pub threshold_step: u64,
    pub warning_ms: f64,
    pub size: Size,
    pub top: f64,
    pub speed: f64,
    pub base_hp: u32,
    pub fire_cooldown_ms: f64,
    pub fire_chance: f64,
    /// Share of volleys that are a single aimed shot rather than a fan.
    pub aimed_chance: f64,
    pub shot_speed: f64,
    pub fan_shots: u32,
    /// Degrees, centred on straight down.
    pub fan_spread: f64,
    pub fan_stagger_ms: f64,
    pub fan_offset: f64,
    pub shot_size: Size,
    pub shot_margin: f64,
    pub shot_points: u64,
    pub bonus_per_tier: u64,
    pub music_return_ms: f64,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            first_threshold: 10_000,
            threshold_step: 10_000,
            warning_ms: 3000.0,
            size: Size::square(120.0),
            top: 100.0,
            speed: 3.0,
            base_hp: 50,
            fire_cooldown_ms: 1500.0,
            fire_chance: 0.3,
            aimed_chance: 0.7,
            shot_speed: 4.0,
            fan_shots: 5,
            fan_spread: 60.0,
            fan_stagger_ms: 100.0,
            fan_offset: 15.0,
            shot_size: Size::square(25.0),
            shot_margin: 100.0,
            shot_points: 50,
            bonus_per_tier: 5000,
            music_return_ms: 2000.0,
        }
    }
}

/// Hit points of a tier `tier` boss: `base * 2^(tier-1)`, saturating.
pub fn hp_for_tier(base: u32, tier: u32) -> u32 {
    let doublings = tier.saturating_sub(1);
    2u32.checked_pow(doublings).and_then(|m| base.checked_mul(m)).unwrap_or(u32::MAX)
}

/// What the boss decided to shoot this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Volley {
    /// One shot from `from` toward the ship.
    Aimed { from: Vec2 },
    /// A staggered downward fan from `from`.
    Fan { from: Vec2 },
}

#[derive(Clone, Debug)]
pub struct Boss {
    pub body: Body,
    pub hp: u32,
    pub max_hp: u32,
    pub tier: u32,
    last_shot: f64,
}

impl Boss {
    /// Appear centred horizontally, drifting right.
    pub fn arrive(tuning: &BossTuning, field: Field, tier: u32, now: f64) -> Self {
        let hp = hp_for_tier(tuning.base_hp, tier);
        let pos = Vec2::new(field.width / 2.0 - tuning.size.w / 2.0, tuning.top);
        Self {
            body: Body::new(pos, Vec2::new(tuning.speed, 0.0), tuning.size),
            hp,
            max_hp: hp,
            tier,
            last_shot: now,
        }
    }

    /// Patrol step: move, then turn around at either wall.
    pub fn patrol(&mut self, field: Field) {
        self.body.integrate();
        let x = self.body.pos.x;
        if x <= 0.0 || x >= field.width - self.body.size.w {
            self.body.vel.x = -self.body.vel.x;
        }
    }

    /// Once the cooldown has passed, roll for a volley. The cooldown restarts
    /// only when something is actually fired.
    pub fn maybe_fire<R: Rng>(&mut self, now: f64, tuning: &BossTuning, rng: &mut R) -> Option<Volley> {
        if now - self.last_shot <= tuning.fire_cooldown_ms || !rng.gen_bool(tuning.fire_chance) {
            return None;
        }
        self.last_shot = now;
        let from = self.muzzle();
        if rng.gen_bool(tuning.aimed_chance) {
            Some(Volley::Aimed { from })
        } else {
            Some(Volley::Fan { from })
        }
    }

    /// Bottom centre of the sprite.
    pub fn muzzle(&self) -> Vec2 {
        Vec2::new(self.body.pos.x + self.body.size.w / 2.0, self.body.pos.y + self.body.size.h)
    }

    /// Take one laser hit. Returns true once the boss is out of hit points.
    pub fn take_hit(&mut self) -> bool {
        self.hp = self.hp.saturating_sub(1);
        self.hp == 0
    }
}

/// Velocity of an aimed shot from `from` toward `target`. A target sitting
/// exactly on the muzzle gets a straight-down shot.
pub fn aimed_velocity(from: Vec2, target: Vec2, speed: f64) -> Vec2 {
    (target - from).normalized().unwrap_or(Vec2::new(0.0, 1.0)) * speed
}

/// Start offset and velocity of shot `i` in a fan of `count`.
pub fn fan_shot(i: u32, tuning: &BossTuning) -> (Vec2, Vec2) {
    let count = tuning.fan_shots.max(2);
    let spread = tuning.fan_spread.to_radians();
    let angle = -spread / 2.0 + spread / f64::from(count - 1) * f64::from(i) + std::f64::consts::FRAC_PI_2;
    let middle = f64::from(count - 1) / 2.0;
    let offset = Vec2::new((f64::from(i) - middle) * tuning.fan_offset, 0.0);
    (offset, Vec2::new(angle.cos(), angle.sin()) * tuning.shot_speed)
}

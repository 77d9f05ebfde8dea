//! Cat Asteroids: fly a ship, shoot the cats drifting in from the edges,
//! survive a boss every few thousand points.
//!
//! Three repeating timers drive a session: the movement tick, the asteroid
//! spawner (re-armed whenever difficulty rises) and the difficulty ramp.
//! Everything else (staggered spawns, fan volleys, the boss warning, the
//! music change after a defeat) is a one-shot on the same scheduler.

pub mod boss;
pub mod ship;

use rand::Rng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::core::config::{ConfigError, Validate, require_non_negative, require_positive};
use crate::core::entity::{Body, Entity, EntityId, IdAllocator, advance_entities, first_overlap};
use crate::core::geom::{Field, Size, Vec2};
use crate::core::host::{Cue, Feedback, HostSurface, HudLine, Pose, Sprite, Track};
use crate::core::input::Key;
use crate::core::schedule::TimerId;
use crate::core::session::{Ctx, Engine, GameRules};

pub use boss::{Boss, BossTuning, Volley};
pub use ship::{LaserTuning, Ship, ShipTuning};

const ROCK_GLYPHS: [&str; 10] = ["😾", "🙀", "😿", "😸", "😺", "😼", "🐱", "🐈", "😻", "😽"];
const RARE_ROCK_GLYPHS: [&str; 3] = ["👹", "😈", "💀"];

const SHAKE_ROCK: f64 = 5.0;
const SHAKE_SHOT: f64 = 3.0;
const SHAKE_BOSS_HIT: f64 = 8.0;
const SHAKE_DAMAGE: f64 = 15.0;
const SHAKE_BOSS_DOWN: f64 = 20.0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct RockTuning {
    pub min_size: f64,
    pub max_size: f64,
    pub jitter_speed: f64,
    pub rare_speed_bonus: f64,
    pub rare_chance: f64,
    /// Added to `rare_chance` per `rare_score_step` points of score.
    pub rare_chance_step: f64,
    pub rare_score_step: u64,
    pub homing: f64,
    pub margin: f64,
    /// Max spin in degrees per tick, either direction.
    pub spin: f64,
    pub stagger_ms: f64,
    /// How far outside the edge a rock appears.
    pub edge_offset: f64,
    /// Rocks entering from the top or bottom keep this far from the right
    /// edge (and likewise for the sides).
    pub edge_inset: f64,
    pub points: u64,
    pub rare_points: u64,
}

impl Default for RockTuning {
    fn default() -> Self {
        Self {
            min_size: 30.0,
            max_size: 50.0,
            jitter_speed: 2.0,
            rare_speed_bonus: 2.0,
            rare_chance: 0.1,
            rare_chance_step: 0.05,
            rare_score_step: 5000,
            homing: 0.1,
            margin: 100.0,
            spin: 2.5,
            stagger_ms: 200.0,
            edge_offset: 50.0,
            edge_inset: 60.0,
            points: 100,
            rare_points: 200,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct DifficultyTuning {
    pub interval_ms: f64,
    pub start_speed: f64,
    pub speed_step: f64,
    pub start_spawn_ms: f64,
    pub spawn_step_ms: f64,
    pub min_spawn_ms: f64,
    pub multiplier_step: f64,
    pub max_multiplier: f64,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            interval_ms: 10_000.0,
            start_speed: 2.0,
            speed_step: 0.8,
            start_spawn_ms: 1000.0,
            spawn_step_ms: 150.0,
            min_spawn_ms: 200.0,
            multiplier_step: 0.3,
            max_multiplier: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct EffectTuning {
    pub explosion_ticks: u32,
    pub boss_explosion_ticks: u32,
    pub explosion_size: f64,
    pub boss_explosion_size: f64,
    pub shake_decay: f64,
    pub flash_ticks: u32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            explosion_ticks: 20,
            boss_explosion_ticks: 60,
            explosion_size: 30.0,
            boss_explosion_size: 100.0,
            shake_decay: 0.9,
            flash_ticks: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct AsteroidsConfig {
    pub field: Field,
    pub tick_ms: f64,
    pub ship: ShipTuning,
    pub laser: LaserTuning,
    pub rocks: RockTuning,
    pub difficulty: DifficultyTuning,
    pub boss: BossTuning,
    pub effects: EffectTuning,
}

impl Default for AsteroidsConfig {
    fn default() -> Self {
        Self {
            field: Field::new(1200.0, 700.0),
            tick_ms: 16.0,
            ship: ShipTuning::default(),
            laser: LaserTuning::default(),
            rocks: RockTuning::default(),
            difficulty: DifficultyTuning::default(),
            boss: BossTuning::default(),
            effects: EffectTuning::default(),
        }
    }
}

impl Validate for AsteroidsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("field.width", self.field.width)?;
        require_positive("field.height", self.field.height)?;
        require_positive("tick_ms", self.tick_ms)?;
        require_positive("laser.cooldown_ms", self.laser.cooldown_ms)?;
        require_positive("rocks.min_size", self.rocks.min_size)?;
        require_positive("rocks.max_size", self.rocks.max_size)?;
        require_non_negative("rocks.jitter_speed", self.rocks.jitter_speed)?;
        require_non_negative("rocks.spin", self.rocks.spin)?;
        require_non_negative("rocks.edge_inset", self.rocks.edge_inset)?;
        require_non_negative("rocks.rare_chance_step", self.rocks.rare_chance_step)?;
        require_positive("difficulty.interval_ms", self.difficulty.interval_ms)?;
        require_positive("difficulty.start_spawn_ms", self.difficulty.start_spawn_ms)?;
        require_positive("difficulty.min_spawn_ms", self.difficulty.min_spawn_ms)?;
        require_positive("boss.warning_ms", self.boss.warning_ms)?;
        require_positive("boss.fire_cooldown_ms", self.boss.fire_cooldown_ms)?;
        if self.rocks.max_size < self.rocks.min_size {
            return Err(ConfigError::Invalid { field: "rocks.max_size", reason: "smaller than rocks.min_size" });
        }
        if self.field.width <= self.rocks.edge_inset || self.field.height <= self.rocks.edge_inset {
            return Err(ConfigError::Invalid { field: "rocks.edge_inset", reason: "larger than the field" });
        }
        if self.rocks.rare_score_step == 0 {
            return Err(ConfigError::Invalid { field: "rocks.rare_score_step", reason: "must be at least 1" });
        }
        if self.ship.lives == 0 {
            return Err(ConfigError::Invalid { field: "ship.lives", reason: "must be at least 1" });
        }
        if self.boss.base_hp == 0 {
            return Err(ConfigError::Invalid { field: "boss.base_hp", reason: "must be at least 1" });
        }
        for (field, p) in [
            ("rocks.rare_chance", self.rocks.rare_chance),
            ("boss.fire_chance", self.boss.fire_chance),
            ("boss.aimed_chance", self.boss.aimed_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid { field, reason: "must be within [0, 1]" });
            }
        }
        Ok(())
    }
}

impl AsteroidsConfig {
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        crate::core::config::from_json(json)
    }
}

/// Tagged entity kinds; every kind carries an explicit box via its `Body`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Piece {
    Laser,
    Rock { rare: bool },
    BossShot,
    Explosion { big: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AsteroidsTask {
    Tick,
    Spawn,
    SpawnRock,
    Difficulty,
    BossArrive,
    FanShot { index: u32, from: Vec2 },
    ResumeTheme,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AsteroidsPhase {
    Playing,
    BossWarning,
    BossFight,
    GameOver,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AsteroidsSnapshot {
    pub score: u64,
    pub lives: u32,
    pub phase: AsteroidsPhase,
    pub boss_tier: u32,
    pub boss_hp: u32,
    pub boss_max_hp: u32,
    pub next_boss_score: u64,
    pub bosses_defeated: u32,
    pub spawn_interval_ms: f64,
    pub difficulty_multiplier: f64,
    pub asteroid_speed: f64,
    pub ship_pos: Vec2,
    pub asteroids: usize,
    pub lasers: usize,
    pub boss_shots: usize,
    pub explosions: usize,
}

pub struct AsteroidsRules {
    config: AsteroidsConfig,
    rng: SmallRng,
    ids: IdAllocator,
    ship_id: EntityId,
    ship: Ship,
    lasers: Vec<Entity<Piece>>,
    rocks: Vec<Entity<Piece>>,
    shots: Vec<Entity<Piece>>,
    explosions: Vec<Entity<Piece>>,
    boss: Option<(EntityId, Boss)>,
    score: u64,
    phase: AsteroidsPhase,
    tier: u32,
    boss_hp: u32,
    boss_max_hp: u32,
    next_boss_score: u64,
    bosses_defeated: u32,
    spawn_timer: Option<TimerId>,
    spawn_interval_ms: f64,
    asteroid_speed: f64,
    multiplier: f64,
    shake: f64,
    flash: u32,
}

impl AsteroidsRules {
    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    pub fn asteroids(&self) -> &[Entity<Piece>] {
        &self.rocks
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref().map(|(_, b)| b)
    }

    pub fn phase(&self) -> AsteroidsPhase {
        self.phase
    }

    /// Jump the score to the next boss threshold; the warning starts on the
    /// next tick.
    pub fn force_boss(&mut self) {
        if self.phase == AsteroidsPhase::Playing {
            self.score = self.score.max(self.next_boss_score);
            info!(score = self.score, "boss forced");
        }
    }

    /// Drop a rock with an exact position and velocity. Scripted scenarios
    /// and tests use this instead of the random spawner.
    pub fn spawn_rock_at(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>, pos: Vec2, vel: Vec2, rare: bool) -> EntityId {
        let size = self.config.rocks.min_size;
        self.insert_rock(ctx.host, Body::new(pos, vel, Size::square(size)), rare, 0.0, 0.0)
    }

    fn insert_rock(&mut self, host: &mut HostSurface, body: Body, rare: bool, rotation: f64, spin: f64) -> EntityId {
        let id = self.ids.next_id();
        let pool: &[&'static str] = if rare { &RARE_ROCK_GLYPHS } else { &ROCK_GLYPHS };
        let glyph = pool[self.rng.gen_range(0..pool.len())];
        let class = if rare { "rare-asteroid" } else { "asteroid" };
        host.spawn(id, &Sprite { glyph, class, size: body.size }, Pose { pos: body.pos, rotation });
        self.rocks.push(Entity::new(id, Piece::Rock { rare }, body).with_spin(rotation, spin));
        id
    }

    fn spawn_random_rock(&mut self, host: &mut HostSurface) {
        let tuning = &self.config.rocks;
        let field = self.config.field;
        let tier = (self.score / tuning.rare_score_step) as f64;
        let rare = self.rng.gen_bool((tuning.rare_chance + tier * tuning.rare_chance_step).clamp(0.0, 1.0));
        let speed = self.asteroid_speed
            + self.rng.gen_range(0.0..=tuning.jitter_speed)
            + if rare { tuning.rare_speed_bonus } else { 0.0 };
        let size = self.rng.gen_range(tuning.min_size..=tuning.max_size);
        let drift = self.rng.gen_range(-1.0..1.0);
        let along_x = self.rng.gen_range(0.0..field.width - tuning.edge_inset);
        let along_y = self.rng.gen_range(0.0..field.height - tuning.edge_inset);
        let edge = self.rng.gen_range(0..4);
        let (pos, vel) =
            edge_launch(edge, Vec2::new(along_x, along_y), speed, drift, self.ship.body.center(), field, tuning);
        let rotation = self.rng.gen_range(0.0..360.0);
        let spin = self.rng.gen_range(-tuning.spin..=tuning.spin);
        let id = self.insert_rock(host, Body::new(pos, vel, Size::square(size)), rare, rotation, spin);
        debug!(id = id.0, rare, speed, "asteroid spawned");
    }

    fn on_spawn(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        if self.phase != AsteroidsPhase::Playing {
            return;
        }
        let count = 1 + (self.rng.gen_range(0.0..1.0) * self.multiplier).floor() as u32;
        for i in 0..count {
            ctx.sched.once(f64::from(i) * self.config.rocks.stagger_ms, AsteroidsTask::SpawnRock);
        }
    }

    fn on_difficulty(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        let d = &self.config.difficulty;
        self.asteroid_speed += d.speed_step;
        self.spawn_interval_ms = (self.spawn_interval_ms - d.spawn_step_ms).max(d.min_spawn_ms);
        self.multiplier = (self.multiplier + d.multiplier_step).min(d.max_multiplier);
        if let Some(id) = self.spawn_timer {
            ctx.sched.rearm(id, self.spawn_interval_ms);
        }
        info!(
            asteroid_speed = self.asteroid_speed,
            spawn_interval_ms = self.spawn_interval_ms,
            multiplier = self.multiplier,
            "difficulty increased"
        );
    }

    fn spawn_effect(&mut self, host: &mut HostSurface, piece: Piece, body: Body, sprite: Sprite, ttl: Option<u32>) {
        let id = self.ids.next_id();
        host.spawn(id, &sprite, Pose::at(body.pos));
        let mut entity = Entity::new(id, piece, body);
        entity.ttl = ttl;
        match piece {
            Piece::Laser => self.lasers.push(entity),
            Piece::Rock { .. } => self.rocks.push(entity),
            Piece::BossShot => self.shots.push(entity),
            Piece::Explosion { .. } => self.explosions.push(entity),
        }
    }

    fn explode(&mut self, host: &mut HostSurface, center: Vec2, big: bool) {
        let fx = &self.config.effects;
        let (side, ticks) = if big {
            (fx.boss_explosion_size, fx.boss_explosion_ticks)
        } else {
            (fx.explosion_size, fx.explosion_ticks)
        };
        let size = Size::square(side);
        let body = Body::new(center - Vec2::new(side / 2.0, side / 2.0), Vec2::ZERO, size);
        let class = if big { "boss-explosion" } else { "explosion" };
        self.spawn_effect(host, Piece::Explosion { big }, body, Sprite { glyph: "💥", class, size }, Some(ticks));
    }

    fn fire_shot(&mut self, host: &mut HostSurface, pos: Vec2, vel: Vec2, glyph: &'static str) {
        let size = self.config.boss.shot_size;
        let sprite = Sprite { glyph, class: "boss-projectile", size };
        self.spawn_effect(host, Piece::BossShot, Body::new(pos, vel, size), sprite, None);
        host.cue(Cue::Laser);
    }

    fn shake(&mut self, intensity: f64) {
        self.shake = self.shake.max(intensity);
    }

    fn flash(&mut self) {
        self.flash = self.config.effects.flash_ticks;
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        let field = self.config.field;

        self.ship.fly(ctx.input, &self.config.ship, field);
        if ctx.input.is_held(Key::Fire) {
            if let Some((pos, vel)) = self.ship.try_fire(ctx.now, &self.config.ship, &self.config.laser) {
                let size = self.config.laser.size;
                let id = self.ids.next_id();
                let rotation = self.ship.rotation_degrees();
                ctx.host.spawn(id, &Sprite { glyph: "", class: "laser", size }, Pose { pos, rotation });
                let laser = Entity::new(id, Piece::Laser, Body::new(pos, vel, size))
                    .with_ttl(self.config.laser.life_ticks)
                    .with_spin(rotation, 0.0);
                self.lasers.push(laser);
                ctx.host.cue(Cue::Laser);
            }
        }

        let mut gone = advance_entities(&mut self.lasers, field, self.config.laser.margin);
        gone.extend(advance_entities(&mut self.rocks, field, self.config.rocks.margin));
        self.move_boss(ctx);
        gone.extend(advance_entities(&mut self.shots, field, self.config.boss.shot_margin));
        gone.extend(advance_entities(&mut self.explosions, field, f64::INFINITY));
        for e in gone {
            ctx.host.despawn(e.id);
        }

        self.collide(ctx);
        if self.phase == AsteroidsPhase::GameOver {
            return;
        }
        self.update_effects(ctx.host);

        if self.phase == AsteroidsPhase::Playing && self.score >= self.next_boss_score {
            self.begin_warning(ctx);
        }

        self.render(ctx.host);
    }

    fn move_boss(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        let field = self.config.field;
        let Some((_, boss)) = self.boss.as_mut() else {
            return;
        };
        boss.patrol(field);
        match boss.maybe_fire(ctx.now, &self.config.boss, &mut self.rng) {
            Some(Volley::Aimed { from }) => {
                let vel = boss::aimed_velocity(from, self.ship.body.center(), self.config.boss.shot_speed);
                self.fire_shot(ctx.host, from, vel, "😿");
            }
            Some(Volley::Fan { from }) => {
                for index in 0..self.config.boss.fan_shots {
                    let delay = f64::from(index) * self.config.boss.fan_stagger_ms;
                    ctx.sched.once(delay, AsteroidsTask::FanShot { index, from });
                }
            }
            None => {}
        }
    }

    fn collide(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        for i in (0..self.lasers.len()).rev() {
            let beam = self.lasers[i].body.aabb();
            if let Some(j) = first_overlap(&beam, &self.rocks) {
                let laser = self.lasers.remove(i);
                let rock = self.rocks.remove(j);
                ctx.host.despawn(laser.id);
                ctx.host.despawn(rock.id);
                self.explode(ctx.host, rock.body.center(), false);
                let rare = matches!(rock.kind, Piece::Rock { rare: true });
                self.score += if rare { self.config.rocks.rare_points } else { self.config.rocks.points };
                ctx.host.cue(Cue::Explosion);
                self.shake(SHAKE_ROCK);
                continue;
            }
            if self.boss.as_ref().is_some_and(|(_, b)| beam.overlaps(&b.body.aabb())) {
                let laser = self.lasers.remove(i);
                ctx.host.despawn(laser.id);
                self.hit_boss(ctx);
                continue;
            }
            if let Some(k) = first_overlap(&beam, &self.shots) {
                let laser = self.lasers.remove(i);
                let shot = self.shots.remove(k);
                ctx.host.despawn(laser.id);
                ctx.host.despawn(shot.id);
                self.explode(ctx.host, shot.body.center(), false);
                self.score += self.config.boss.shot_points;
                ctx.host.cue(Cue::Hit);
                self.shake(SHAKE_SHOT);
            }
        }

        let hull = self.ship.body.aabb();
        while let Some(j) = first_overlap(&hull, &self.rocks) {
            let rock = self.rocks.remove(j);
            ctx.host.despawn(rock.id);
            if self.take_damage(ctx) {
                return;
            }
        }
        while let Some(k) = first_overlap(&hull, &self.shots) {
            let shot = self.shots.remove(k);
            ctx.host.despawn(shot.id);
            if self.take_damage(ctx) {
                return;
            }
        }
    }

    /// Returns true when this hit ended the game.
    fn take_damage(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) -> bool {
        self.explode(ctx.host, self.ship.body.center(), false);
        self.ship.lives = self.ship.lives.saturating_sub(1);
        self.shake(SHAKE_DAMAGE);
        self.flash();
        if self.ship.lives == 0 {
            self.phase = AsteroidsPhase::GameOver;
            ctx.host.feedback(Feedback::GameOver);
            ctx.host.hud(&self.hud());
            info!(score = self.score, bosses_defeated = self.bosses_defeated, "asteroids game over");
            return true;
        }
        ctx.host.cue(Cue::Damage);
        ctx.host.feedback(Feedback::LifeLost { lives: self.ship.lives });
        debug!(lives = self.ship.lives, "ship hit");
        false
    }

    fn hit_boss(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        let Some((_, boss)) = self.boss.as_mut() else {
            return;
        };
        let down = boss.take_hit();
        self.boss_hp = boss.hp;
        ctx.host.feedback(Feedback::BossHit { hp: self.boss_hp, max_hp: self.boss_max_hp });
        ctx.host.cue(Cue::Hit);
        self.shake(SHAKE_BOSS_HIT);
        if down {
            self.defeat_boss(ctx);
        }
    }

    fn begin_warning(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        self.phase = AsteroidsPhase::BossWarning;
        self.boss_max_hp = boss::hp_for_tier(self.config.boss.base_hp, self.tier);
        self.boss_hp = self.boss_max_hp;
        ctx.host.feedback(Feedback::BossWarning);
        ctx.host.track(Track::BossWarning);
        ctx.sched.once(self.config.boss.warning_ms, AsteroidsTask::BossArrive);
        info!(tier = self.tier, hp = self.boss_max_hp, score = self.score, "boss approaching");
    }

    fn boss_arrives(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        if self.phase != AsteroidsPhase::BossWarning {
            return;
        }
        let boss = Boss::arrive(&self.config.boss, self.config.field, self.tier, ctx.now);
        let id = self.ids.next_id();
        let sprite = Sprite { glyph: "😼", class: "boss", size: boss.body.size };
        ctx.host.spawn(id, &sprite, Pose::at(boss.body.pos));
        self.boss_hp = boss.hp;
        self.boss_max_hp = boss.max_hp;
        self.boss = Some((id, boss));
        self.phase = AsteroidsPhase::BossFight;
        ctx.host.track(Track::BossBattle);
        ctx.host.feedback(Feedback::BossArrived { hp: self.boss_hp });
    }

    fn defeat_boss(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        let Some((id, boss)) = self.boss.take() else {
            return;
        };
        let bonus = self.config.boss.bonus_per_tier * u64::from(self.tier);
        self.score += bonus;
        ctx.host.despawn(id);
        self.explode(ctx.host, boss.body.center(), true);
        self.phase = AsteroidsPhase::Playing;
        self.bosses_defeated += 1;
        self.tier += 1;
        self.boss_hp = 0;
        self.boss_max_hp = 0;
        self.next_boss_score += self.config.boss.threshold_step;
        ctx.sched.once(self.config.boss.music_return_ms, AsteroidsTask::ResumeTheme);
        ctx.host.cue(Cue::Victory);
        ctx.host.feedback(Feedback::BossDefeated { bonus });
        self.shake(SHAKE_BOSS_DOWN);
        self.flash();
        info!(bonus, score = self.score, next_boss_score = self.next_boss_score, "boss defeated");
    }

    fn update_effects(&mut self, host: &mut HostSurface) {
        if self.shake > 0.0 {
            let offset = Vec2::new(
                self.rng.gen_range(-0.5..0.5) * self.shake,
                self.rng.gen_range(-0.5..0.5) * self.shake,
            );
            self.shake *= self.config.effects.shake_decay;
            if self.shake < 0.1 {
                self.shake = 0.0;
                host.feedback(Feedback::ScreenShake { offset: Vec2::ZERO });
            } else {
                host.feedback(Feedback::ScreenShake { offset });
            }
        }
        if self.flash > 0 {
            let opacity = f64::from(self.flash) / f64::from(self.config.effects.flash_ticks.max(1));
            host.feedback(Feedback::Flash { opacity });
            self.flash -= 1;
            if self.flash == 0 {
                host.feedback(Feedback::Flash { opacity: 0.0 });
            }
        }
    }

    fn render(&self, host: &mut HostSurface) {
        host.place(self.ship_id, Pose { pos: self.ship.body.pos, rotation: self.ship.rotation_degrees() });
        for e in self.lasers.iter().chain(&self.rocks).chain(&self.shots) {
            host.place(e.id, Pose { pos: e.body.pos, rotation: e.rotation });
        }
        if let Some((id, boss)) = &self.boss {
            host.place(*id, Pose::at(boss.body.pos));
        }
        host.hud(&self.hud());
    }

    fn hud(&self) -> Vec<HudLine> {
        let mut lines = vec![HudLine::new("Score", self.score), HudLine::new("Lives", self.ship.lives)];
        if self.phase == AsteroidsPhase::BossFight {
            lines.push(HudLine::new("Boss", format!("{}/{}", self.boss_hp, self.boss_max_hp)));
        }
        lines
    }
}

/// Entry point and velocity of a rock coming in from `edge` (0 top, 1 right,
/// 2 bottom, 3 left), bent toward `target`. `along` holds the offset along
/// the horizontal and vertical edges.
fn edge_launch(
    edge: u32,
    along: Vec2,
    speed: f64,
    drift: f64,
    target: Vec2,
    field: Field,
    tuning: &RockTuning,
) -> (Vec2, Vec2) {
    let off = tuning.edge_offset;
    let (pos, vel) = match edge {
        0 => (Vec2::new(along.x, -off), Vec2::new(drift, speed)),
        1 => (Vec2::new(field.width + off, along.y), Vec2::new(-speed, drift)),
        2 => (Vec2::new(along.x, field.height + off), Vec2::new(drift, -speed)),
        _ => (Vec2::new(-off, along.y), Vec2::new(speed, drift)),
    };
    let homing = (target - pos).normalized().map_or(Vec2::ZERO, |d| d * (speed * tuning.homing));
    (pos, vel + homing)
}

impl GameRules for AsteroidsRules {
    type Task = AsteroidsTask;
    type Config = AsteroidsConfig;
    type Snapshot = AsteroidsSnapshot;

    const NAME: &'static str = "cat-asteroids";

    fn create(config: &AsteroidsConfig, rng: SmallRng) -> Self {
        let mut ids = IdAllocator::default();
        let ship_id = ids.next_id();
        Self {
            config: config.clone(),
            rng,
            ids,
            ship_id,
            ship: Ship::new(&config.ship),
            lasers: Vec::new(),
            rocks: Vec::new(),
            shots: Vec::new(),
            explosions: Vec::new(),
            boss: None,
            score: 0,
            phase: AsteroidsPhase::Playing,
            tier: 1,
            boss_hp: 0,
            boss_max_hp: 0,
            next_boss_score: config.boss.first_threshold,
            bosses_defeated: 0,
            spawn_timer: None,
            spawn_interval_ms: config.difficulty.start_spawn_ms,
            asteroid_speed: config.difficulty.start_speed,
            multiplier: 1.0,
            shake: 0.0,
            flash: 0,
        }
    }

    fn begin(&mut self, ctx: &mut Ctx<'_, AsteroidsTask>) {
        let sprite = Sprite { glyph: "▲", class: "player-ship", size: self.ship.body.size };
        ctx.host.spawn(self.ship_id, &sprite, Pose::at(self.ship.body.pos));
        ctx.sched.every(self.config.tick_ms, AsteroidsTask::Tick);
        self.spawn_timer = Some(ctx.sched.every(self.spawn_interval_ms, AsteroidsTask::Spawn));
        ctx.sched.every(self.config.difficulty.interval_ms, AsteroidsTask::Difficulty);
        ctx.host.track(Track::AsteroidTheme);
        ctx.host.hud(&self.hud());
    }

    fn run(&mut self, task: AsteroidsTask, ctx: &mut Ctx<'_, AsteroidsTask>) {
        match task {
            AsteroidsTask::Tick => self.on_tick(ctx),
            AsteroidsTask::Spawn => self.on_spawn(ctx),
            AsteroidsTask::SpawnRock => {
                if self.phase == AsteroidsPhase::Playing {
                    self.spawn_random_rock(ctx.host);
                }
            }
            AsteroidsTask::Difficulty => self.on_difficulty(ctx),
            AsteroidsTask::BossArrive => self.boss_arrives(ctx),
            AsteroidsTask::FanShot { index, from } => {
                if self.phase == AsteroidsPhase::BossFight {
                    let (offset, vel) = boss::fan_shot(index, &self.config.boss);
                    self.fire_shot(ctx.host, from + offset, vel, "😾");
                }
            }
            AsteroidsTask::ResumeTheme => {
                if self.phase == AsteroidsPhase::Playing {
                    ctx.host.track(Track::AsteroidTheme);
                }
            }
        }
    }

    fn is_over(&self) -> bool {
        self.phase == AsteroidsPhase::GameOver
    }

    fn snapshot(&self) -> AsteroidsSnapshot {
        AsteroidsSnapshot {
            score: self.score,
            lives: self.ship.lives,
            phase: self.phase,
            boss_tier: self.tier,
            boss_hp: self.boss_hp,
            boss_max_hp: self.boss_max_hp,
            next_boss_score: self.next_boss_score,
            bosses_defeated: self.bosses_defeated,
            spawn_interval_ms: self.spawn_interval_ms,
            difficulty_multiplier: self.multiplier,
            asteroid_speed: self.asteroid_speed,
            ship_pos: self.ship.body.pos,
            asteroids: self.rocks.len(),
            lasers: self.lasers.len(),
            boss_shots: self.shots.len(),
            explosions: self.explosions.len(),
        }
    }

    fn despawn_all(&mut self, host: &mut HostSurface) {
        host.despawn(self.ship_id);
        for e in self
            .lasers
            .drain(..)
            .chain(self.rocks.drain(..))
            .chain(self.shots.drain(..))
            .chain(self.explosions.drain(..))
        {
            host.despawn(e.id);
        }
        if let Some((id, _)) = self.boss.take() {
            host.despawn(id);
        }
    }
}

pub type CatAsteroids = Engine<AsteroidsRules>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Spawner effectively off so tests control every rock.
    fn calm() -> AsteroidsConfig {
        let mut config = AsteroidsConfig::default();
        config.difficulty.start_spawn_ms = 1e9;
        config
    }

    fn start(config: AsteroidsConfig) -> CatAsteroids {
        let mut engine = CatAsteroids::new(config).unwrap().with_seed(9);
        engine.start_session(HostSurface::headless(), 0.0);
        engine
    }

    #[test]
    fn difficulty_ramps_every_ten_seconds() {
        let mut engine = start(calm());
        engine.advance(10_000.0);
        let snap = engine.snapshot().unwrap();
        assert!((snap.asteroid_speed - 2.8).abs() < 1e-9);
        assert!((snap.difficulty_multiplier - 1.3).abs() < 1e-9);
        assert_eq!(snap.spawn_interval_ms, 1e9 - 150.0);
    }

    #[test]
    fn spawn_interval_and_multiplier_are_bounded() {
        let mut engine = start(AsteroidsConfig::default());
        engine.act(|rules, ctx| {
            for _ in 0..20 {
                rules.on_difficulty(ctx);
            }
        });
        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.spawn_interval_ms, 200.0);
        assert_eq!(snap.difficulty_multiplier, 4.0);
    }

    #[test]
    fn laser_destroys_rock_and_scores() {
        let mut engine = start(calm());
        // ship faces up; its muzzle sits at (615, 341)
        engine.act(|rules, ctx| rules.spawn_rock_at(ctx, Vec2::new(600.0, 280.0), Vec2::ZERO, true));
        engine.input_mut().unwrap().press(Key::Fire);
        engine.advance(16.0 * 6.0);
        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.score, 200);
        assert_eq!(snap.asteroids, 0);
        assert!(snap.explosions >= 1);
    }

    #[test]
    fn negative_range_bounds_are_rejected() {
        let mut config = AsteroidsConfig::default();
        config.rocks.spin = -1.0;
        assert!(config.validate().is_err());

        let mut config = AsteroidsConfig::default();
        config.rocks.jitter_speed = -0.5;
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_with_negative_spin_is_rejected() {
        assert!(AsteroidsConfig::from_json(r#"{"rocks":{"spin":-1.0}}"#).is_err());
        assert!(AsteroidsConfig::from_json(r#"{"rocks":{"spin":0.0}}"#).is_ok());
    }

    #[test]
    fn engine_refuses_inverted_rock_sizes() {
        let mut config = AsteroidsConfig::default();
        config.rocks.max_size = 10.0;
        assert!(CatAsteroids::new(config).is_err());
    }

    #[test]
    fn launch_from_top_edge_bends_toward_target() {
        let tuning = RockTuning::default();
        let field = Field::new(1200.0, 700.0);
        let (pos, vel) =
            edge_launch(0, Vec2::new(100.0, 0.0), 2.0, 0.5, Vec2::new(100.0, 350.0), field, &tuning);
        assert_eq!(pos, Vec2::new(100.0, -50.0));
        assert!((vel.x - 0.5).abs() < 1e-9);
        assert!((vel.y - 2.2).abs() < 1e-9);

        let (pos, vel) = edge_launch(3, Vec2::new(0.0, 200.0), 3.0, 0.0, Vec2::new(0.0, 200.0), field, &tuning);
        assert_eq!(pos, Vec2::new(-50.0, 200.0));
        assert_eq!(vel, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn random_rocks_enter_from_an_edge() {
        let mut engine = start(calm());
        engine.act(|rules, ctx| {
            for _ in 0..200 {
                rules.spawn_random_rock(ctx.host);
            }
        });
        let rocks = engine.act(|rules, _| rules.asteroids().to_vec()).unwrap();
        assert_eq!(rocks.len(), 200);
        for rock in rocks {
            let Vec2 { x, y } = rock.body.pos;
            let on_edge = y == -50.0 || x == 1250.0 || y == 750.0 || x == -50.0;
            assert!(on_edge, "rock spawned inside the field at ({x}, {y})");
            // every launch heads inward
            let inward = (y < 0.0 && rock.body.vel.y > 0.0)
                || (x > 1200.0 && rock.body.vel.x < 0.0)
                || (y > 700.0 && rock.body.vel.y < 0.0)
                || (x < 0.0 && rock.body.vel.x > 0.0);
            assert!(inward);
        }
    }

    #[test]
    fn spawn_wave_size_follows_multiplier() {
        let mut engine = start(calm());
        let sizes = engine
            .act(|rules, ctx| {
                rules.multiplier = 4.0;
                (0..300)
                    .map(|_| {
                        let before = ctx.sched.pending();
                        rules.on_spawn(ctx);
                        ctx.sched.pending() - before
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap();
        assert!(sizes.iter().all(|n| (1..=4).contains(n)));
        assert!(sizes.contains(&1));
        assert!(sizes.contains(&4));

        engine.act(|rules, ctx| {
            rules.multiplier = 1.0;
            let before = ctx.sched.pending();
            rules.on_spawn(ctx);
            assert_eq!(ctx.sched.pending() - before, 1);
        });
    }

    #[test]
    fn wave_rocks_arrive_two_hundred_ms_apart() {
        let mut engine = (0..)
            .map(|seed| {
                let mut engine = CatAsteroids::new(calm()).unwrap().with_seed(seed);
                engine.start_session(HostSurface::headless(), 0.0);
                engine
            })
            .find_map(|mut engine| {
                let wave = engine
                    .act(|rules, ctx| {
                        rules.multiplier = 4.0;
                        let before = ctx.sched.pending();
                        rules.on_spawn(ctx);
                        ctx.sched.pending() - before
                    })
                    .unwrap();
                (wave == 4).then_some(engine)
            })
            .unwrap();

        for (now, expected) in [(1.0, 1), (199.0, 1), (200.0, 2), (399.0, 2), (400.0, 3), (599.0, 3), (600.0, 4)] {
            engine.advance(now);
            assert_eq!(engine.snapshot().unwrap().asteroids, expected, "at {now} ms");
        }
    }

    #[test]
    fn rare_rocks_grow_common_with_score() {
        let mut engine = start(calm());
        let mut rare_at = |score: u64| {
            engine
                .act(|rules, ctx| {
                    rules.score = score;
                    rules.rocks.clear();
                    for _ in 0..2000 {
                        rules.spawn_random_rock(ctx.host);
                    }
                    rules.rocks.iter().filter(|r| r.kind == Piece::Rock { rare: true }).count()
                })
                .unwrap()
        };
        let low = rare_at(0);
        let high = rare_at(20_000);
        // 10% against 30%
        assert!(low > 100 && low < 300, "{low}");
        assert!(high > 2 * low, "{high} vs {low}");
    }

    #[test]
    fn no_rocks_spawn_during_boss_warning_or_fight() {
        let mut config = AsteroidsConfig::default();
        config.boss.fire_chance = 0.0;
        let mut engine = start(config);
        engine.act(|rules, _| rules.force_boss());
        engine.advance(16.0);
        assert_eq!(engine.snapshot().unwrap().phase, AsteroidsPhase::BossWarning);

        engine.advance(1_500.0);
        assert_eq!(engine.snapshot().unwrap().asteroids, 0);
        engine.advance(3_100.0);
        assert_eq!(engine.snapshot().unwrap().phase, AsteroidsPhase::BossFight);
        engine.advance(6_000.0);
        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.phase, AsteroidsPhase::BossFight);
        assert_eq!(snap.asteroids, 0);
    }

    #[test]
    fn forced_boss_goes_through_warning() {
        let mut engine = start(calm());
        engine.act(|rules, _| rules.force_boss());
        engine.advance(16.0);
        assert_eq!(engine.snapshot().unwrap().phase, AsteroidsPhase::BossWarning);
        engine.advance(3_100.0);
        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.phase, AsteroidsPhase::BossFight);
        assert_eq!(snap.boss_hp, 50);
        assert_eq!(snap.boss_tier, 1);
    }
}

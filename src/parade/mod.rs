//! Cat Parade: cats run across a track, the player clicks them before they
//! escape. Points scale with a combo streak; troll cats cost points and break
//! the streak. The round lasts a fixed number of seconds.

pub mod cats;
pub mod levels;

use rand::Rng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::core::config::{ConfigError, Validate, require_non_negative, require_positive};
use crate::core::entity::{Body, Entity, EntityId, IdAllocator, advance_entities};
use crate::core::geom::{Field, Vec2};
use crate::core::host::{Feedback, HostSurface, HudLine, Pose, Sprite, Track};
use crate::core::schedule::TimerId;
use crate::core::scoring::{ComboState, apply_penalty, combo_multiplier};
use crate::core::session::{Ctx, Engine, GameRules};

pub use cats::CatKind;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct ParadeConfig {
    pub field: Field,
    pub tick_ms: f64,
    pub round_secs: u32,
    pub combo_window_ms: f64,
    pub combo_cap: u32,
    /// Cats never run closer than this to the top or bottom edge.
    pub lane_margin: f64,
    /// Cats start this far outside the track and are missed once past it.
    pub offscreen_margin: f64,
    pub burst_stagger_ms: f64,
    pub double_spawn_level: u32,
    pub double_spawn_chance: f64,
    pub double_spawn_delay_ms: f64,
    pub firework_stagger_ms: f64,
    pub shake_pulses: u32,
    pub shake_pulse_ms: f64,
}

impl Default for ParadeConfig {
    fn default() -> Self {
        Self {
            field: Field::new(1200.0, 650.0),
            tick_ms: 16.0,
            round_secs: 60,
            combo_window_ms: 2000.0,
            combo_cap: 10,
            lane_margin: 80.0,
            offscreen_margin: 80.0,
            burst_stagger_ms: 100.0,
            double_spawn_level: 5,
            double_spawn_chance: 0.3,
            double_spawn_delay_ms: 200.0,
            firework_stagger_ms: 200.0,
            shake_pulses: 8,
            shake_pulse_ms: 60.0,
        }
    }
}

impl Validate for ParadeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("field.width", self.field.width)?;
        require_positive("field.height", self.field.height)?;
        require_positive("tick_ms", self.tick_ms)?;
        require_positive("combo_window_ms", self.combo_window_ms)?;
        require_positive("shake_pulse_ms", self.shake_pulse_ms)?;
        require_non_negative("lane_margin", self.lane_margin)?;
        require_non_negative("offscreen_margin", self.offscreen_margin)?;
        if self.field.height <= self.lane_margin * 2.0 {
            return Err(ConfigError::Invalid { field: "lane_margin", reason: "leaves no room for a lane" });
        }
        if self.round_secs == 0 {
            return Err(ConfigError::Invalid { field: "round_secs", reason: "must be at least one second" });
        }
        if self.combo_cap == 0 {
            return Err(ConfigError::Invalid { field: "combo_cap", reason: "must be at least 1" });
        }
        if !(0.0..=1.0).contains(&self.double_spawn_chance) {
            return Err(ConfigError::Invalid { field: "double_spawn_chance", reason: "must be within [0, 1]" });
        }
        Ok(())
    }
}

impl ParadeConfig {
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        crate::core::config::from_json(json)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParadeTask {
    Tick,
    Countdown,
    Spawn,
    /// A single extra cat (opening burst, level-5+ follow-up).
    SpawnOne,
    ComboTimeout,
    Firework,
    ShakePulse { left: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ParadePhase {
    Playing,
    Ended,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParadeSnapshot {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub multiplier: u32,
    pub time_left: u32,
    pub level: u32,
    pub total_clicks: u32,
    pub missed_cats: u32,
    pub accuracy: u32,
    pub live_cats: usize,
    pub spawn_interval_ms: f64,
    pub troll_chance: f64,
    pub phase: ParadePhase,
}

pub struct ParadeRules {
    config: ParadeConfig,
    rng: SmallRng,
    ids: IdAllocator,
    cats: Vec<Entity<CatKind>>,
    score: u64,
    combo: ComboState,
    combo_timer: Option<TimerId>,
    spawn_timer: Option<TimerId>,
    time_left: u32,
    level: u32,
    leveled_this_tick: bool,
    total_clicks: u32,
    missed_cats: u32,
    phase: ParadePhase,
}

impl ParadeRules {
    pub fn cats(&self) -> &[Entity<CatKind>] {
        &self.cats
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Place a stationary cat of a chosen kind. Scripted rounds and tests use
    /// this to set up exact hits.
    pub fn spawn_cat_at(&mut self, ctx: &mut Ctx<'_, ParadeTask>, kind: CatKind, pos: Vec2) -> EntityId {
        self.insert_cat(ctx.host, kind, pos, Vec2::ZERO)
    }

    fn insert_cat(&mut self, host: &mut HostSurface, kind: CatKind, pos: Vec2, vel: Vec2) -> EntityId {
        let id = self.ids.next_id();
        let glyph = cats::draw_glyph(&mut self.rng, kind);
        let sprite = Sprite { glyph, class: kind.class(), size: kind.size() };
        host.spawn(id, &sprite, Pose::at(pos));
        self.cats.push(Entity::new(id, kind, Body::new(pos, vel, kind.size())));
        id
    }

    fn spawn_random_cat(&mut self, host: &mut HostSurface) {
        let kind = cats::draw_kind(&mut self.rng, self.level);
        let secs = cats::run_duration_secs(&mut self.rng, kind, self.level);
        let field = self.config.field;
        let margin = self.config.offscreen_margin;
        let y = self.rng.gen_range(self.config.lane_margin..field.height - self.config.lane_margin);
        let ticks = (secs * 1000.0 / self.config.tick_ms).max(1.0);
        let speed = (field.width + margin * 2.0) / ticks;
        let right_to_left = self.rng.gen_bool(0.5);
        let (x, vx) = if right_to_left { (field.width + margin, -speed) } else { (-margin, speed) };
        let id = self.insert_cat(host, kind, Vec2::new(x, y), Vec2::new(vx, 0.0));
        debug!(id = id.0, ?kind, secs, level = self.level, "cat spawned");
    }

    fn on_spawn(&mut self, ctx: &mut Ctx<'_, ParadeTask>) {
        self.spawn_random_cat(ctx.host);
        if self.level >= self.config.double_spawn_level && self.rng.gen_bool(self.config.double_spawn_chance) {
            ctx.sched.once(self.config.double_spawn_delay_ms, ParadeTask::SpawnOne);
        }
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_, ParadeTask>) {
        self.leveled_this_tick = false;

        let removed = advance_entities(&mut self.cats, self.config.field, self.config.offscreen_margin);
        for cat in removed {
            self.missed_cats += 1;
            ctx.host.despawn(cat.id);
        }

        for click in ctx.input.drain_clicks() {
            // latest spawn renders on top
            let Some(idx) = self.cats.iter().rposition(|c| c.body.aabb().contains(click)) else {
                continue;
            };
            let cat = self.cats.remove(idx);
            ctx.host.despawn(cat.id);
            self.total_clicks += 1;
            match cat.kind {
                CatKind::Troll { penalty } => self.troll_hit(ctx, &cat, penalty),
                _ => self.good_hit(ctx, &cat),
            }
        }

        for cat in &self.cats {
            ctx.host.place(cat.id, Pose::at(cat.body.pos));
        }
        ctx.host.hud(&self.hud());
    }

    fn good_hit(&mut self, ctx: &mut Ctx<'_, ParadeTask>, cat: &Entity<CatKind>) {
        let combo = self.combo.hit(ctx.now, self.config.combo_window_ms);
        let multiplier = combo_multiplier(combo, self.config.combo_cap);
        let points = cat.kind.points() * u64::from(multiplier);
        self.score += points;

        let pos = cat.body.pos;
        let class = cat.kind.class();
        ctx.host.feedback(Feedback::PointPopup { at: pos + Vec2::new(8.0, -10.0), points, multiplier, class });
        ctx.host.feedback(Feedback::Particles { at: pos + Vec2::new(25.0, 15.0), class });
        if cat.kind.flashes() || points >= 10 {
            ctx.host.feedback(Feedback::ScreenFlash { class });
        }

        self.check_level_up(ctx);

        if combo >= 5 && combo % 5 == 0 {
            ctx.host.feedback(Feedback::ComboBurst { combo });
            ctx.host.feedback(Feedback::ScreenFlash { class: "combo" });
            for i in 0..3 {
                ctx.sched.once(f64::from(i) * self.config.firework_stagger_ms, ParadeTask::Firework);
            }
        }

        if let Some(id) = self.combo_timer.take() {
            ctx.sched.cancel(id);
        }
        self.combo_timer = Some(ctx.sched.once(self.config.combo_window_ms, ParadeTask::ComboTimeout));
    }

    fn troll_hit(&mut self, ctx: &mut Ctx<'_, ParadeTask>, cat: &Entity<CatKind>, penalty: u64) {
        self.score = apply_penalty(self.score, penalty);
        self.combo.break_combo();
        if let Some(id) = self.combo_timer.take() {
            ctx.sched.cancel(id);
        }
        ctx.host.feedback(Feedback::PenaltyPopup { at: cat.body.pos + Vec2::new(10.0, -20.0), penalty });
        if self.config.shake_pulses > 0 {
            ctx.sched.once(self.config.shake_pulse_ms, ParadeTask::ShakePulse { left: self.config.shake_pulses });
        }
        debug!(penalty, score = self.score, "troll clicked");
    }

    /// At most one level per tick, however far the score overshoots.
    fn check_level_up(&mut self, ctx: &mut Ctx<'_, ParadeTask>) {
        if self.leveled_this_tick || self.level >= levels::MAX_LEVEL {
            return;
        }
        if self.score < levels::level(self.level).requirement {
            return;
        }
        self.leveled_this_tick = true;
        self.level += 1;
        let interval = levels::spawn_interval_ms(self.level);
        if let Some(id) = self.spawn_timer {
            ctx.sched.rearm(id, interval);
        }
        ctx.host.feedback(Feedback::LevelUp { level: self.level });
        info!(level = self.level, score = self.score, spawn_interval_ms = interval, "parade level up");
    }

    fn on_countdown(&mut self, ctx: &mut Ctx<'_, ParadeTask>) {
        self.time_left = self.time_left.saturating_sub(1);
        ctx.host.hud(&self.hud());
        if self.time_left == 0 {
            self.phase = ParadePhase::Ended;
            ctx.host.feedback(Feedback::TimeUp);
            ctx.host.feedback(Feedback::GameOver);
            info!(score = self.score, level = self.level, max_combo = self.combo.max, "parade time up");
        }
    }

    fn on_shake(&mut self, ctx: &mut Ctx<'_, ParadeTask>, left: u32) {
        if left <= 1 {
            ctx.host.feedback(Feedback::ScreenShake { offset: Vec2::ZERO });
            return;
        }
        let offset = Vec2::new(self.rng.gen_range(-5.0..5.0), self.rng.gen_range(-3.0..3.0));
        ctx.host.feedback(Feedback::ScreenShake { offset });
        ctx.sched.once(self.config.shake_pulse_ms, ParadeTask::ShakePulse { left: left - 1 });
    }

    fn accuracy(&self) -> u32 {
        if self.total_clicks == 0 {
            return 0;
        }
        let landed = self.total_clicks.saturating_sub(self.missed_cats);
        (f64::from(landed) * 100.0 / f64::from(self.total_clicks)).round() as u32
    }

    fn hud(&self) -> Vec<HudLine> {
        vec![
            HudLine::new("Score", self.score),
            HudLine::new("Combo", format!("{}x", self.combo.count)),
            HudLine::new("Time", format!("{}s", self.time_left)),
            HudLine::new("Level", self.level),
        ]
    }
}

impl GameRules for ParadeRules {
    type Task = ParadeTask;
    type Config = ParadeConfig;
    type Snapshot = ParadeSnapshot;

    const NAME: &'static str = "cat-parade";

    fn create(config: &ParadeConfig, rng: SmallRng) -> Self {
        Self {
            config: config.clone(),
            rng,
            ids: IdAllocator::default(),
            cats: Vec::new(),
            score: 0,
            combo: ComboState::default(),
            combo_timer: None,
            spawn_timer: None,
            time_left: config.round_secs,
            level: 1,
            leveled_this_tick: false,
            total_clicks: 0,
            missed_cats: 0,
            phase: ParadePhase::Playing,
        }
    }

    fn begin(&mut self, ctx: &mut Ctx<'_, ParadeTask>) {
        ctx.sched.every(self.config.tick_ms, ParadeTask::Tick);
        ctx.sched.every(1000.0, ParadeTask::Countdown);
        self.spawn_timer = Some(ctx.sched.every(levels::spawn_interval_ms(self.level), ParadeTask::Spawn));
        for i in 0..levels::initial_burst(self.level) {
            ctx.sched.once(f64::from(i) * self.config.burst_stagger_ms, ParadeTask::SpawnOne);
        }
        ctx.host.track(Track::ParadeSong);
        ctx.host.hud(&self.hud());
    }

    fn run(&mut self, task: ParadeTask, ctx: &mut Ctx<'_, ParadeTask>) {
        match task {
            ParadeTask::Tick => self.on_tick(ctx),
            ParadeTask::Countdown => self.on_countdown(ctx),
            ParadeTask::Spawn => self.on_spawn(ctx),
            ParadeTask::SpawnOne => self.spawn_random_cat(ctx.host),
            ParadeTask::ComboTimeout => {
                self.combo_timer = None;
                if self.combo.expired(ctx.now) {
                    self.combo.break_combo();
                    ctx.host.hud(&self.hud());
                }
            }
            ParadeTask::Firework => {
                let field = self.config.field;
                let at = Vec2::new(self.rng.gen_range(0.0..field.width), self.rng.gen_range(0.0..field.height * 0.6));
                ctx.host.feedback(Feedback::Firework { at });
            }
            ParadeTask::ShakePulse { left } => self.on_shake(ctx, left),
        }
    }

    fn is_over(&self) -> bool {
        self.phase == ParadePhase::Ended
    }

    fn snapshot(&self) -> ParadeSnapshot {
        ParadeSnapshot {
            score: self.score,
            combo: self.combo.count,
            max_combo: self.combo.max,
            multiplier: combo_multiplier(self.combo.count, self.config.combo_cap),
            time_left: self.time_left,
            level: self.level,
            total_clicks: self.total_clicks,
            missed_cats: self.missed_cats,
            accuracy: self.accuracy(),
            live_cats: self.cats.len(),
            spawn_interval_ms: levels::spawn_interval_ms(self.level),
            troll_chance: levels::level(self.level).troll_chance,
            phase: self.phase,
        }
    }

    fn despawn_all(&mut self, host: &mut HostSurface) {
        for cat in self.cats.drain(..) {
            host.despawn(cat.id);
        }
    }
}

pub type CatParade = Engine<ParadeRules>;

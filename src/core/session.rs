//! Shared game-loop harness.
//!
//! A game supplies its rules as a [`GameRules`] impl: how to seed a session,
//! what each scheduled task does, and when the session is over. [`Session`]
//! owns everything mutable for one play-through (rules state, timers, host
//! surface, input) and [`Engine`] is the per-game handle the host talks to.
//! There is no module-level state; any number of engines can coexist.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use super::config::{ConfigError, Validate};
use super::host::HostSurface;
use super::input::InputSampler;
use super::schedule::Scheduler;

/// Everything a task handler may touch besides its own rules state.
pub struct Ctx<'a, T> {
    /// Virtual time at which the running task was due.
    pub now: f64,
    pub sched: &'a mut Scheduler<T>,
    pub host: &'a mut HostSurface,
    pub input: &'a mut InputSampler,
}

pub trait GameRules: Sized {
    type Task: Clone + std::fmt::Debug;
    type Config: Clone + Default + Validate;
    type Snapshot;

    const NAME: &'static str;

    fn create(config: &Self::Config, rng: SmallRng) -> Self;

    /// Arm the session's timers and emit the opening visuals/audio.
    fn begin(&mut self, ctx: &mut Ctx<'_, Self::Task>);

    fn run(&mut self, task: Self::Task, ctx: &mut Ctx<'_, Self::Task>);

    /// Terminal state reached (time up, lives exhausted).
    fn is_over(&self) -> bool;

    fn snapshot(&self) -> Self::Snapshot;

    /// Forget every live entity, despawning its visual.
    fn despawn_all(&mut self, host: &mut HostSurface);
}

pub struct Session<G: GameRules> {
    rules: G,
    sched: Scheduler<G::Task>,
    host: HostSurface,
    input: InputSampler,
    finished: bool,
    closed: bool,
}

impl<G: GameRules> Session<G> {
    pub fn start(config: &G::Config, rng: SmallRng, host: HostSurface, now: f64) -> Self {
        let mut session = Self {
            rules: G::create(config, rng),
            sched: Scheduler::new(now),
            host,
            input: InputSampler::default(),
            finished: false,
            closed: false,
        };
        session.act(|rules, ctx| rules.begin(ctx));
        info!(game = G::NAME, now, "session started");
        session
    }

    /// Run a host-initiated operation against the rules with a live context.
    /// No-op once the session has reached its terminal state.
    pub fn act<R>(&mut self, f: impl FnOnce(&mut G, &mut Ctx<'_, G::Task>) -> R) -> Option<R> {
        if self.finished || self.closed {
            return None;
        }
        let mut ctx = Ctx {
            now: self.sched.now(),
            sched: &mut self.sched,
            host: &mut self.host,
            input: &mut self.input,
        };
        let out = f(&mut self.rules, &mut ctx);
        self.check_terminal();
        Some(out)
    }

    /// Fire every task due up to `now`, in due order.
    pub fn pump(&mut self, now: f64) {
        if self.finished || self.closed {
            return;
        }
        while let Some((due, task)) = self.sched.pop_due(now) {
            let mut ctx = Ctx {
                now: due,
                sched: &mut self.sched,
                host: &mut self.host,
                input: &mut self.input,
            };
            self.rules.run(task, &mut ctx);
            if self.check_terminal() {
                break;
            }
        }
        self.sched.settle(now);
    }

    fn check_terminal(&mut self) -> bool {
        if !self.finished && self.rules.is_over() {
            self.finished = true;
            self.sched.cancel_all();
            self.host.stop_audio();
            self.input.clear();
            info!(game = G::NAME, now = self.sched.now(), "session reached terminal state; timers cancelled");
        }
        self.finished
    }

    /// Terminal cleanup: cancel timers, despawn entities, stop audio. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.finished = true;
        self.sched.cancel_all();
        self.rules.despawn_all(&mut self.host);
        self.host.clear();
        self.host.stop_audio();
        self.input.clear();
        debug!(game = G::NAME, "session closed");
    }

    pub fn is_over(&self) -> bool {
        self.finished
    }

    pub fn rules(&self) -> &G {
        &self.rules
    }

    pub fn pending_timers(&self) -> usize {
        self.sched.pending()
    }

    pub fn input_mut(&mut self) -> &mut InputSampler {
        &mut self.input
    }

    pub fn host_mut(&mut self) -> &mut HostSurface {
        &mut self.host
    }
}

impl<G: GameRules> Drop for Session<G> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Per-game handle exposed to the host. Holds at most one session.
pub struct Engine<G: GameRules> {
    config: G::Config,
    seed: Option<u64>,
    started: u64,
    session: Option<Session<G>>,
}

impl<G: GameRules> Default for Engine<G> {
    fn default() -> Self {
        Self { config: G::Config::default(), seed: None, started: 0, session: None }
    }
}

impl<G: GameRules> Engine<G> {
    /// Fails on configs the game cannot run with, such as empty spawn ranges
    /// or non-positive periods.
    pub fn new(config: G::Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, ..Self::default() })
    }

    /// Deterministic randomness: session `n` is seeded with `seed + n`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &G::Config {
        &self.config
    }

    /// Begin a new session bound to `host`, tearing down any previous one first.
    pub fn start_session(&mut self, host: HostSurface, now: f64) {
        self.end_session();
        let rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(self.started)),
            None => SmallRng::from_entropy(),
        };
        self.started += 1;
        self.session = Some(Session::start(&self.config, rng, host, now));
    }

    pub fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    pub fn advance(&mut self, now: f64) {
        if let Some(session) = self.session.as_mut() {
            session.pump(now);
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// A session exists and has not reached its terminal state.
    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_over())
    }

    pub fn snapshot(&self) -> Option<G::Snapshot> {
        self.session.as_ref().map(|s| s.rules().snapshot())
    }

    pub fn input_mut(&mut self) -> Option<&mut InputSampler> {
        self.session.as_mut().map(|s| s.input_mut())
    }

    pub fn act<R>(&mut self, f: impl FnOnce(&mut G, &mut Ctx<'_, G::Task>) -> R) -> Option<R> {
        self.session.as_mut().and_then(|s| s.act(f))
    }

    /// Flip mute for the running session; returns the new state.
    pub fn toggle_mute(&mut self) -> Option<bool> {
        let session = self.session.as_mut()?;
        let host = session.host_mut();
        let muted = !host.is_muted();
        host.set_muted(muted);
        Some(muted)
    }

    pub fn pending_timers(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.pending_timers())
    }
}

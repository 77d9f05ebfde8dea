//! Capability surface the game core consumes from its host (the page overlay
//! in the browser, a recorder in tests).
//!
//! The core never lets a presentation or audio failure interrupt a tick: every
//! call goes through [`HostSurface`], which logs and swallows [`HostError`]s.

use thiserror::Error;
use tracing::warn;

use super::entity::EntityId;
use super::geom::{Size, Vec2};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("presentation surface unavailable")]
    SurfaceUnavailable,
    #[error("dom operation failed: {0}")]
    Dom(String),
    #[error("audio '{name}' failed: {reason}")]
    Audio { name: &'static str, reason: String },
}

/// Visual description handed to the sink when an entity appears.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub glyph: &'static str,
    /// Style hook (CSS class in the browser), e.g. `"troll-cat"`.
    pub class: &'static str,
    pub size: Size,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub pos: Vec2,
    pub rotation: f64, // degrees
}

impl Pose {
    pub fn at(pos: Vec2) -> Self {
        Self { pos, rotation: 0.0 }
    }
}

/// One-off visual feedback. Hosts animate and dispose of these themselves.
#[derive(Clone, Debug, PartialEq)]
pub enum Feedback {
    PointPopup { at: Vec2, points: u64, multiplier: u32, class: &'static str },
    PenaltyPopup { at: Vec2, penalty: u64 },
    Particles { at: Vec2, class: &'static str },
    ScreenFlash { class: &'static str },
    ComboBurst { combo: u32 },
    Firework { at: Vec2 },
    /// Absolute shake offset for this frame; `Vec2::ZERO` recentres.
    ScreenShake { offset: Vec2 },
    /// Inset glow opacity in `[0, 1]`; 0 clears it.
    Flash { opacity: f64 },
    LevelUp { level: u32 },
    BossWarning,
    BossArrived { hp: u32 },
    BossHit { hp: u32, max_hp: u32 },
    BossDefeated { bonus: u64 },
    LifeLost { lives: u32 },
    TimeUp,
    GameOver,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HudLine {
    pub label: &'static str,
    pub value: String,
}

impl HudLine {
    pub fn new(label: &'static str, value: impl ToString) -> Self {
        Self { label, value: value.to_string() }
    }
}

/// Short sound effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Laser,
    Explosion,
    Hit,
    Damage,
    Victory,
}

impl Cue {
    pub fn name(self) -> &'static str {
        match self {
            Cue::Laser => "laser",
            Cue::Explosion => "explosion",
            Cue::Hit => "hit",
            Cue::Damage => "damage",
            Cue::Victory => "victory",
        }
    }

    /// Synth recipe: one exponential sweep per tone.
    pub fn tones(self) -> &'static [Tone] {
        match self {
            Cue::Laser => &LASER_TONES,
            Cue::Explosion => &EXPLOSION_TONES,
            Cue::Hit => &HIT_TONES,
            Cue::Damage => &DAMAGE_TONES,
            Cue::Victory => &VICTORY_TONES,
        }
    }
}

static LASER_TONES: [Tone; 1] = [Tone::sweep(800.0, 200.0, 0.1, 0.1)];
static EXPLOSION_TONES: [Tone; 1] = [Tone::sweep(150.0, 50.0, 0.2, 0.3)];
static HIT_TONES: [Tone; 1] = [Tone::sweep(300.0, 100.0, 0.15, 0.2)];
static DAMAGE_TONES: [Tone; 1] = [Tone::sweep(200.0, 50.0, 0.3, 0.5)];
// C E G C
static VICTORY_TONES: [Tone; 4] = [
    Tone::note(0.0, 523.0),
    Tone::note(0.2, 659.0),
    Tone::note(0.4, 784.0),
    Tone::note(0.6, 1047.0),
];

/// Oscillator sweep from `from_hz` to `to_hz` while the gain decays from
/// `gain` to 0.01, starting `offset` seconds after the cue fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub offset: f64,
    pub from_hz: f64,
    pub to_hz: f64,
    pub gain: f64,
    pub secs: f64,
}

impl Tone {
    const fn sweep(from_hz: f64, to_hz: f64, gain: f64, secs: f64) -> Self {
        Self { offset: 0.0, from_hz, to_hz, gain, secs }
    }

    const fn note(offset: f64, hz: f64) -> Self {
        Self { offset, from_hz: hz, to_hz: hz, gain: 0.1, secs: 0.3 }
    }
}

/// Background tracks, addressed by symbolic name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Track {
    AsteroidTheme,
    BossBattle,
    BossWarning,
    ParadeSong,
}

impl Track {
    pub fn name(self) -> &'static str {
        match self {
            Track::AsteroidTheme => "asteroid-theme",
            Track::BossBattle => "boss-battle",
            Track::BossWarning => "boss-warning",
            Track::ParadeSong => "parade-song",
        }
    }

    /// Path of the audio asset inside the extension bundle.
    pub fn asset_path(self) -> &'static str {
        match self {
            Track::AsteroidTheme => "audio/asteroid-cat-theme.mp3",
            Track::BossBattle => "audio/BossBattle.mp3",
            Track::BossWarning => "audio/boss-warning.mp3",
            Track::ParadeSong => "audio/meowmeow-song.mp3",
        }
    }

    pub fn volume(self) -> f64 {
        match self {
            Track::AsteroidTheme => 0.3,
            Track::BossBattle => 0.6,
            Track::BossWarning => 0.7,
            Track::ParadeSong => 0.5,
        }
    }

    pub fn looping(self) -> bool {
        !matches!(self, Track::BossWarning)
    }
}

pub trait PresentationSink {
    fn spawn(&mut self, id: EntityId, sprite: &Sprite, pose: Pose) -> Result<(), HostError>;
    fn place(&mut self, id: EntityId, pose: Pose) -> Result<(), HostError>;
    fn despawn(&mut self, id: EntityId) -> Result<(), HostError>;
    fn feedback(&mut self, fx: &Feedback) -> Result<(), HostError>;
    fn hud(&mut self, lines: &[HudLine]) -> Result<(), HostError>;
    /// Drop every visual this session created.
    fn clear(&mut self) -> Result<(), HostError>;
}

pub trait AudioSink {
    fn play_cue(&mut self, cue: Cue) -> Result<(), HostError>;
    /// Start `track` from the beginning, stopping whatever track was playing.
    /// `volume` is the unmuted level; the sink applies its own mute state and
    /// restores `volume` when unmuted.
    fn play_track(&mut self, track: Track, volume: f64) -> Result<(), HostError>;
    fn stop_all(&mut self) -> Result<(), HostError>;
    fn set_muted(&mut self, muted: bool);
}

/// Headless sink: accepts everything, draws nothing.
#[derive(Debug, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn spawn(&mut self, _: EntityId, _: &Sprite, _: Pose) -> Result<(), HostError> {
        Ok(())
    }
    fn place(&mut self, _: EntityId, _: Pose) -> Result<(), HostError> {
        Ok(())
    }
    fn despawn(&mut self, _: EntityId) -> Result<(), HostError> {
        Ok(())
    }
    fn feedback(&mut self, _: &Feedback) -> Result<(), HostError> {
        Ok(())
    }
    fn hud(&mut self, _: &[HudLine]) -> Result<(), HostError> {
        Ok(())
    }
    fn clear(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_cue(&mut self, _: Cue) -> Result<(), HostError> {
        Ok(())
    }
    fn play_track(&mut self, _: Track, _: f64) -> Result<(), HostError> {
        Ok(())
    }
    fn stop_all(&mut self) -> Result<(), HostError> {
        Ok(())
    }
    fn set_muted(&mut self, _: bool) {}
}

/// Log a failed host side effect and carry on.
pub fn soften<T>(what: &'static str, result: Result<T, HostError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(error) => {
            warn!(%error, what, "host side effect failed; continuing without it");
            None
        }
    }
}

/// The presentation target a session is bound to, plus its audio channel.
pub struct HostSurface {
    sink: Box<dyn PresentationSink>,
    audio: Box<dyn AudioSink>,
    muted: bool,
}

impl HostSurface {
    pub fn new(sink: Box<dyn PresentationSink>, audio: Box<dyn AudioSink>) -> Self {
        Self { sink, audio, muted: false }
    }

    pub fn headless() -> Self {
        Self::new(Box::new(NullSink), Box::new(SilentAudio))
    }

    pub fn spawn(&mut self, id: EntityId, sprite: &Sprite, pose: Pose) {
        soften("spawn", self.sink.spawn(id, sprite, pose));
    }

    pub fn place(&mut self, id: EntityId, pose: Pose) {
        soften("place", self.sink.place(id, pose));
    }

    pub fn despawn(&mut self, id: EntityId) {
        soften("despawn", self.sink.despawn(id));
    }

    pub fn feedback(&mut self, fx: Feedback) {
        soften("feedback", self.sink.feedback(&fx));
    }

    pub fn hud(&mut self, lines: &[HudLine]) {
        soften("hud", self.sink.hud(lines));
    }

    pub fn clear(&mut self) {
        soften("clear", self.sink.clear());
    }

    /// Muted sessions skip cues entirely.
    pub fn cue(&mut self, cue: Cue) {
        if !self.muted {
            soften("cue", self.audio.play_cue(cue));
        }
    }

    pub fn track(&mut self, track: Track) {
        soften("track", self.audio.play_track(track, track.volume()));
    }

    pub fn stop_audio(&mut self) {
        soften("stop audio", self.audio.stop_all());
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.audio.set_muted(muted);
    }
}

impl std::fmt::Debug for HostSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSurface").field("muted", &self.muted).finish_non_exhaustive()
    }
}

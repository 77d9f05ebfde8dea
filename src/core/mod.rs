//! Game-agnostic machinery shared by both games: geometry, entities and the
//! movement/collision passes, timers, input sampling, scoring helpers, the
//! host capability surface and the session harness.

pub mod config;
pub mod entity;
pub mod geom;
pub mod host;
pub mod input;
pub mod schedule;
pub mod scoring;
pub mod session;

pub use entity::{Body, Entity, EntityId};
pub use geom::{Aabb, Field, Size, Vec2};
pub use host::{AudioSink, Cue, Feedback, HostError, HostSurface, HudLine, Pose, PresentationSink, Sprite, Tone, Track};
pub use input::{InputSampler, Key};
pub use session::{Ctx, Engine, GameRules};

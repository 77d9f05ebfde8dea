// Recording host shared by the integration tests. The sink and the audio
// channel write into one log so tests can assert on the full side-effect
// stream after the engine has consumed the boxed trait objects.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use cat_arcade::core::{AudioSink, Cue, EntityId, Feedback, HostError, HostSurface, HudLine, Pose, PresentationSink, Sprite, Track};

#[derive(Debug, Default)]
pub struct Log {
    pub spawned: Vec<(EntityId, &'static str)>,
    pub despawned: Vec<EntityId>,
    pub feedback: Vec<Feedback>,
    pub cues: Vec<Cue>,
    pub tracks: Vec<Track>,
    pub stops: usize,
    pub clears: usize,
}

impl Log {
    /// Entities spawned and never despawned.
    pub fn alive(&self) -> BTreeSet<EntityId> {
        let gone: BTreeSet<_> = self.despawned.iter().copied().collect();
        self.spawned.iter().map(|(id, _)| *id).filter(|id| !gone.contains(id)).collect()
    }

    pub fn count_feedback(&self, pred: impl Fn(&Feedback) -> bool) -> usize {
        self.feedback.iter().filter(|f| pred(f)).count()
    }
}

pub type SharedLog = Rc<RefCell<Log>>;

struct RecordingSink(SharedLog);

impl PresentationSink for RecordingSink {
    fn spawn(&mut self, id: EntityId, sprite: &Sprite, _: Pose) -> Result<(), HostError> {
        self.0.borrow_mut().spawned.push((id, sprite.class));
        Ok(())
    }
    fn place(&mut self, _: EntityId, _: Pose) -> Result<(), HostError> {
        Ok(())
    }
    fn despawn(&mut self, id: EntityId) -> Result<(), HostError> {
        self.0.borrow_mut().despawned.push(id);
        Ok(())
    }
    fn feedback(&mut self, fx: &Feedback) -> Result<(), HostError> {
        self.0.borrow_mut().feedback.push(fx.clone());
        Ok(())
    }
    fn hud(&mut self, _: &[HudLine]) -> Result<(), HostError> {
        Ok(())
    }
    fn clear(&mut self) -> Result<(), HostError> {
        self.0.borrow_mut().clears += 1;
        Ok(())
    }
}

struct RecordingAudio(SharedLog);

impl AudioSink for RecordingAudio {
    fn play_cue(&mut self, cue: Cue) -> Result<(), HostError> {
        self.0.borrow_mut().cues.push(cue);
        Ok(())
    }
    fn play_track(&mut self, track: Track, _: f64) -> Result<(), HostError> {
        self.0.borrow_mut().tracks.push(track);
        Ok(())
    }
    fn stop_all(&mut self) -> Result<(), HostError> {
        self.0.borrow_mut().stops += 1;
        Ok(())
    }
    fn set_muted(&mut self, _: bool) {}
}

/// A host surface whose every side effect lands in the returned log.
pub fn recording_host() -> (HostSurface, SharedLog) {
    let log = SharedLog::default();
    let host = HostSurface::new(Box::new(RecordingSink(log.clone())), Box::new(RecordingAudio(log.clone())));
    (host, log)
}

//! Virtual-time timer wheel owned by a session.
//!
//! Every periodic loop (movement tick, spawner, difficulty ramp, countdown) and
//! every delayed follow-up (staggered spawns, combo timeout, fan volleys, music
//! cues) is a timer here, so a whole session can be cancelled as a group with
//! one call. Time only moves when the host calls [`Scheduler::pop_due`] with a
//! clock reading, which keeps the game loop deterministic under test.

/// Repeating timers that fall further behind than this many periods are
/// fast-forwarded instead of replaying every missed period.
pub const MAX_CATCH_UP_PERIODS: f64 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    task: T,
    due: f64,
    period: Option<f64>,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: f64,
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T: Clone> Scheduler<T> {
    pub fn new(now: f64) -> Self {
        Self { now, timers: Vec::new(), next_id: 0 }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    fn alloc(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    /// Fixed-rate timer; first fires one `period` from now.
    pub fn every(&mut self, period_ms: f64, task: T) -> TimerId {
        let id = self.alloc();
        let period = period_ms.max(1.0);
        self.timers.push(Timer { id, task, due: self.now + period, period: Some(period) });
        id
    }

    /// One-shot timer firing `delay_ms` from now.
    pub fn once(&mut self, delay_ms: f64, task: T) -> TimerId {
        let id = self.alloc();
        self.timers.push(Timer { id, task, due: self.now + delay_ms.max(0.0), period: None });
        id
    }

    /// Restart a repeating timer with a new period, counted from now.
    /// Returns false if the timer no longer exists.
    pub fn rearm(&mut self, id: TimerId, period_ms: f64) -> bool {
        let now = self.now;
        match self.timers.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                let period = period_ms.max(1.0);
                t.period = Some(period);
                t.due = now + period;
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Pop the earliest timer due at or before `until`, moving virtual time to
    /// its due instant. Ties resolve in creation order. Repeating timers are
    /// re-queued one period later; one-shots are dropped.
    pub fn pop_due(&mut self, until: f64) -> Option<(f64, T)> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i)?;
        let due = self.timers[idx].due;
        self.now = self.now.max(due);
        match self.timers[idx].period {
            Some(period) => {
                let t = &mut self.timers[idx];
                t.due += period;
                let behind = until - t.due;
                if behind > period * MAX_CATCH_UP_PERIODS {
                    t.due = until - period * MAX_CATCH_UP_PERIODS;
                }
                Some((due, t.task.clone()))
            }
            None => {
                let t = self.timers.swap_remove(idx);
                Some((due, t.task))
            }
        }
    }

    /// Move virtual time forward without firing anything.
    pub fn settle(&mut self, now: f64) {
        self.now = self.now.max(now);
    }
}

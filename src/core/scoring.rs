//! Score arithmetic shared by both games.

/// Subtract a penalty, flooring the score at zero.
pub fn apply_penalty(score: u64, penalty: u64) -> u64 {
    score.saturating_sub(penalty)
}

/// `min(floor(combo / 3) + 1, cap)`.
pub fn combo_multiplier(combo: u32, cap: u32) -> u32 {
    (combo / 3 + 1).min(cap)
}

/// Streak of consecutive good hits. Any hit re-arms the reset deadline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComboState {
    pub count: u32,
    pub max: u32,
    pub deadline: Option<f64>,
}

impl ComboState {
    /// Register a good hit at `now`; returns the new combo count.
    pub fn hit(&mut self, now: f64, window_ms: f64) -> u32 {
        self.count += 1;
        self.max = self.max.max(self.count);
        self.deadline = Some(now + window_ms);
        self.count
    }

    pub fn break_combo(&mut self) {
        self.count = 0;
        self.deadline = None;
    }

    pub fn expired(&self, now: f64) -> bool {
        matches!(self.deadline, Some(d) if now >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_floors_at_zero() {
        assert_eq!(apply_penalty(30, 10), 20);
        assert_eq!(apply_penalty(5, 25), 0);
        assert_eq!(apply_penalty(0, 15), 0);
    }

    #[test]
    fn combo_multiplier_table() {
        let cap = 10;
        assert_eq!(combo_multiplier(0, cap), 1);
        assert_eq!(combo_multiplier(2, cap), 1);
        assert_eq!(combo_multiplier(3, cap), 2);
        assert_eq!(combo_multiplier(5, cap), 2);
        assert_eq!(combo_multiplier(9, cap), 4);
        assert_eq!(combo_multiplier(30, cap), 10);
        assert_eq!(combo_multiplier(300, cap), 10);
    }

    #[test]
    fn combo_tracks_max_and_deadline() {
        let mut c = ComboState::default();
        c.hit(0.0, 2000.0);
        c.hit(500.0, 2000.0);
        assert_eq!(c.count, 2);
        assert!(!c.expired(2000.0));
        assert!(c.expired(2500.0));
        c.break_combo();
        assert_eq!(c.count, 0);
        assert_eq!(c.max, 2);
        assert!(!c.expired(10_000.0));
    }
}

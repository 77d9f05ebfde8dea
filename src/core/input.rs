//! Input sampler: held keys plus a queue of pointer clicks since the last tick.

use std::collections::HashSet;

use super::geom::Vec2;

/// Logical game keys. Several physical keys map onto each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    RotateLeft,
    RotateRight,
    Thrust,
    Reverse,
    Fire,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value (case-insensitive) onto a game key.
    pub fn from_dom_key(key: &str) -> Option<Key> {
        match key.to_ascii_lowercase().as_str() {
            "a" | "arrowleft" => Some(Key::RotateLeft),
            "d" | "arrowright" => Some(Key::RotateRight),
            "w" | "arrowup" => Some(Key::Thrust),
            "s" | "arrowdown" => Some(Key::Reverse),
            " " | "space" | "spacebar" => Some(Key::Fire),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct InputSampler {
    held: HashSet<Key>,
    clicks: Vec<Vec2>,
}

impl InputSampler {
    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Record a pointer click in play-field coordinates.
    pub fn click(&mut self, x: f64, y: f64) {
        self.clicks.push(Vec2::new(x, y));
    }

    pub fn drain_clicks(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.clicks)
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.clicks.clear();
    }
}

//! Parade cat categories and the random draws that produce them.

use rand::Rng;

use super::levels;
use crate::core::geom::Size;

pub const CAT_GLYPHS: [&str; 10] = ["🐱", "😸", "😹", "😻", "😽", "🙀", "😿", "😾", "🐈", "🐈‍⬛"];
pub const TROLL_GLYPHS: [&str; 10] = ["💀", "👹", "👺", "🤡", "👻", "🔥", "💥", "⚡", "🌪️", "💢"];

const GIANT_CHANCE: f64 = 0.08;
const RARE_CHANCE: f64 = 0.10;
const SPEED_CHANCE: f64 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CatKind {
    Normal,
    Speed,
    Rare,
    Giant,
    /// Clicking one costs `penalty` points and breaks the combo.
    Troll { penalty: u64 },
}

impl CatKind {
    /// Base points before the combo multiplier. Trolls award nothing.
    pub fn points(self) -> u64 {
        match self {
            CatKind::Normal => 1,
            CatKind::Speed => 4,
            CatKind::Rare => 6,
            CatKind::Giant => 8,
            CatKind::Troll { .. } => 0,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            CatKind::Normal => "cat",
            CatKind::Speed => "speed-cat",
            CatKind::Rare => "rare-cat",
            CatKind::Giant => "giant-cat",
            CatKind::Troll { .. } => "troll-cat",
        }
    }

    pub fn size(self) -> Size {
        match self {
            CatKind::Giant => Size::square(64.0),
            _ => Size::square(40.0),
        }
    }

    pub fn is_troll(self) -> bool {
        matches!(self, CatKind::Troll { .. })
    }

    /// Hits worth celebrating with a full-screen flash.
    pub fn flashes(self) -> bool {
        matches!(self, CatKind::Rare | CatKind::Giant)
    }
}

/// Weighted category draw: troll (per-level chance) beats giant, rare, speed.
pub fn draw_kind<R: Rng>(rng: &mut R, level: u32) -> CatKind {
    let troll = rng.gen_bool(levels::level(level).troll_chance);
    let rare = rng.gen_bool(RARE_CHANCE);
    let speed = rng.gen_bool(SPEED_CHANCE);
    let giant = rng.gen_bool(GIANT_CHANCE);
    if troll {
        let penalty = if rng.gen_bool(0.3) {
            10
        } else if rng.gen_bool(0.6) {
            15
        } else {
            25
        };
        CatKind::Troll { penalty }
    } else if giant {
        CatKind::Giant
    } else if rare {
        CatKind::Rare
    } else if speed {
        CatKind::Speed
    } else {
        CatKind::Normal
    }
}

pub fn draw_glyph<R: Rng>(rng: &mut R, kind: CatKind) -> &'static str {
    let pool: &[&'static str] = if kind.is_troll() { &TROLL_GLYPHS } else { &CAT_GLYPHS };
    pool[rng.gen_range(0..pool.len())]
}

/// Seconds a cat of `kind` takes to cross the track at `level`.
pub fn run_duration_secs<R: Rng>(rng: &mut R, kind: CatKind, level: u32) -> f64 {
    let l = level as f64;
    match kind {
        CatKind::Giant => (18.0 - l * 0.8).max(12.0),
        CatKind::Troll { .. } => (6.0 - l * 0.4).max(1.5) * rng.gen_range(0.7..1.0),
        CatKind::Speed => (4.0 - l * 0.3).max(1.2) * rng.gen_range(0.6..1.0),
        _ if level <= 1 => rng.gen_range(8.0..10.0),
        _ => (10.0 - l * 0.8).max(1.8) * levels::level(level).speed_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn troll_share_grows_with_level() {
        let mut rng = SmallRng::seed_from_u64(7);
        let count = |rng: &mut SmallRng, level| (0..4000).filter(|_| draw_kind(rng, level).is_troll()).count();
        let low = count(&mut rng, 1);
        let high = count(&mut rng, 10);
        assert!(high > low * 4, "low={low} high={high}");
    }

    #[test]
    fn troll_penalties_are_known_values() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..2000 {
            if let CatKind::Troll { penalty } = draw_kind(&mut rng, 10) {
                assert!(matches!(penalty, 10 | 15 | 25));
            }
        }
    }

    #[test]
    fn durations_respect_floors() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            assert!(run_duration_secs(&mut rng, CatKind::Giant, 10) >= 12.0);
            assert!(run_duration_secs(&mut rng, CatKind::Speed, 10) >= 1.2 * 0.6);
            let first = run_duration_secs(&mut rng, CatKind::Normal, 1);
            assert!((8.0..10.0).contains(&first));
        }
        // level 10 ordinary cats: max(1.8, 2.0) * 2.0
        assert_eq!(run_duration_secs(&mut rng, CatKind::Normal, 10), 4.0);
    }

    #[test]
    fn points_by_kind() {
        assert_eq!(CatKind::Normal.points(), 1);
        assert_eq!(CatKind::Speed.points(), 4);
        assert_eq!(CatKind::Rare.points(), 6);
        assert_eq!(CatKind::Giant.points(), 8);
        assert_eq!(CatKind::Troll { penalty: 15 }.points(), 0);
    }
}

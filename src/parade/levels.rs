// Cat Parade level table.
// Each entry: score needed to leave the level, chance a spawned cat is a troll,
// and the run-speed bonus applied to ordinary cats.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelDesc {
    pub level: u32,
    pub requirement: u64,
    pub troll_chance: f64,
    pub speed_bonus: f64,
}

pub const MAX_LEVEL: u32 = 10;

pub static LEVELS: [LevelDesc; MAX_LEVEL as usize] = [
    LevelDesc { level: 1, requirement: 10, troll_chance: 0.03, speed_bonus: 1.0 },
    LevelDesc { level: 2, requirement: 25, troll_chance: 0.05, speed_bonus: 1.0 },
    LevelDesc { level: 3, requirement: 50, troll_chance: 0.08, speed_bonus: 1.1 },
    LevelDesc { level: 4, requirement: 80, troll_chance: 0.12, speed_bonus: 1.1 },
    LevelDesc { level: 5, requirement: 120, troll_chance: 0.15, speed_bonus: 1.2 },
    LevelDesc { level: 6, requirement: 170, troll_chance: 0.20, speed_bonus: 1.2 },
    LevelDesc { level: 7, requirement: 230, troll_chance: 0.25, speed_bonus: 1.3 },
    LevelDesc { level: 8, requirement: 300, troll_chance: 0.30, speed_bonus: 1.4 },
    LevelDesc { level: 9, requirement: 380, troll_chance: 0.35, speed_bonus: 1.5 },
    LevelDesc { level: 10, requirement: 500, troll_chance: 0.40, speed_bonus: 2.0 },
];

/// Level descriptor; out-of-range levels clamp into `1..=MAX_LEVEL`.
pub fn level(n: u32) -> &'static LevelDesc {
    &LEVELS[(n.clamp(1, MAX_LEVEL) - 1) as usize]
}

/// Milliseconds between regular spawns.
pub fn spawn_interval_ms(level: u32) -> f64 {
    if level <= 1 {
        700.0
    } else {
        (900.0 - level as f64 * 50.0).max(400.0)
    }
}

/// Cats released in the opening burst of a session.
pub fn initial_burst(level: u32) -> u32 {
    if level <= 1 { 15 } else { (12 + level).min(20) }
}

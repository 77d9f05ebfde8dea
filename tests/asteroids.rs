mod common;

use cat_arcade::asteroids::{AsteroidsConfig, AsteroidsPhase, CatAsteroids};
use cat_arcade::core::{Cue, Feedback, Key, Track, Vec2};

use common::{SharedLog, recording_host};

// The ship starts at (600, 350) with a 30x22 hull.
const ON_SHIP: Vec2 = Vec2::new(600.0, 350.0);

/// Random spawner effectively off; every rock is placed by the test.
fn calm() -> AsteroidsConfig {
    let mut config = AsteroidsConfig::default();
    config.difficulty.start_spawn_ms = 1e9;
    config
}

fn start(config: AsteroidsConfig) -> (CatAsteroids, SharedLog) {
    let (host, log) = recording_host();
    let mut engine = CatAsteroids::new(config).unwrap().with_seed(3);
    engine.start_session(host, 0.0);
    (engine, log)
}

fn drop_rock(engine: &mut CatAsteroids, pos: Vec2, vel: Vec2) {
    engine.act(|rules, ctx| rules.spawn_rock_at(ctx, pos, vel, false));
}

#[test]
fn collision_costs_exactly_one_life() {
    let (mut engine, log) = start(calm());
    drop_rock(&mut engine, ON_SHIP, Vec2::ZERO);
    engine.advance(16.0);

    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.lives, 2);
    assert_eq!(snap.asteroids, 0);
    assert_eq!(snap.phase, AsteroidsPhase::Playing);
    let log = log.borrow();
    assert_eq!(log.count_feedback(|f| *f == Feedback::LifeLost { lives: 2 }), 1);
    assert!(log.cues.contains(&Cue::Damage));
}

#[test]
fn losing_last_life_ends_the_game_and_all_timers() {
    let (mut engine, log) = start(calm());
    for _ in 0..3 {
        drop_rock(&mut engine, ON_SHIP, Vec2::ZERO);
    }
    engine.advance(16.0);

    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.lives, 0);
    assert_eq!(snap.phase, AsteroidsPhase::GameOver);
    assert!(!engine.is_running());
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(log.borrow().count_feedback(|f| *f == Feedback::GameOver), 1);
    assert!(log.borrow().stops >= 1);

    // nothing spawns or moves once the session is over
    let spawned = log.borrow().spawned.len();
    engine.advance(60_000.0);
    assert_eq!(log.borrow().spawned.len(), spawned);
    assert_eq!(engine.snapshot().unwrap(), snap);
}

#[test]
fn rock_leaving_the_field_costs_nothing() {
    let (mut engine, log) = start(calm());
    drop_rock(&mut engine, Vec2::new(1150.0, 10.0), Vec2::new(10.0, 0.0));
    engine.advance(1_000.0);

    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.asteroids, 0);
    assert_eq!(snap.lives, 3);
    assert_eq!(snap.score, 0);
    assert_eq!(log.borrow().alive().len(), 1, "only the ship should remain");
}

#[test]
fn rocks_move_by_their_velocity_each_tick() {
    let (mut engine, _log) = start(calm());
    drop_rock(&mut engine, Vec2::new(100.0, 100.0), Vec2::new(2.0, 1.0));
    engine.advance(16.0);
    let pos = engine.act(|rules, _| rules.asteroids()[0].body.pos).unwrap();
    assert_eq!(pos, Vec2::new(102.0, 101.0));
    engine.advance(48.0);
    let pos = engine.act(|rules, _| rules.asteroids()[0].body.pos).unwrap();
    assert_eq!(pos, Vec2::new(106.0, 103.0));
}

#[test]
fn boss_defeat_pays_bonus_and_raises_the_bar() {
    let mut config = calm();
    config.boss.base_hp = 1;
    config.boss.fire_chance = 0.0;
    let (mut engine, log) = start(config);

    engine.act(|rules, _| rules.force_boss());
    engine.advance(16.0);
    assert_eq!(engine.snapshot().unwrap().phase, AsteroidsPhase::BossWarning);
    engine.advance(3_100.0);
    assert_eq!(engine.snapshot().unwrap().phase, AsteroidsPhase::BossFight);

    // the boss drifts across the ship's line of fire
    engine.input_mut().unwrap().press(Key::Fire);
    engine.advance(3_600.0);
    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.phase, AsteroidsPhase::Playing);
    assert_eq!(snap.score, 15_000);
    assert_eq!(snap.bosses_defeated, 1);
    assert_eq!(snap.boss_tier, 2);
    assert_eq!(snap.next_boss_score, 20_000);
    assert!(log.borrow().cues.contains(&Cue::Victory));

    engine.advance(6_000.0);
    assert_eq!(
        log.borrow().tracks,
        vec![Track::AsteroidTheme, Track::BossWarning, Track::BossBattle, Track::AsteroidTheme]
    );
}

#[test]
fn second_boss_has_double_hit_points() {
    let mut config = calm();
    config.boss.base_hp = 1;
    config.boss.fire_chance = 0.0;
    let (mut engine, _log) = start(config);

    engine.act(|rules, _| rules.force_boss());
    engine.advance(3_100.0);
    engine.input_mut().unwrap().press(Key::Fire);
    engine.advance(3_600.0);
    engine.input_mut().unwrap().release(Key::Fire);
    assert_eq!(engine.snapshot().unwrap().bosses_defeated, 1);

    engine.act(|rules, _| rules.force_boss());
    engine.advance(7_000.0);
    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.phase, AsteroidsPhase::BossFight);
    assert_eq!(snap.boss_tier, 2);
    assert_eq!(snap.boss_max_hp, 2);
}

#[test]
fn ending_session_clears_every_visual() {
    let (mut engine, log) = start(calm());
    drop_rock(&mut engine, Vec2::new(100.0, 100.0), Vec2::ZERO);
    engine.input_mut().unwrap().press(Key::Fire);
    engine.advance(200.0);
    assert!(log.borrow().alive().len() > 2);

    engine.end_session();
    assert!(log.borrow().alive().is_empty());
    assert_eq!(log.borrow().clears, 1);
    assert_eq!(engine.pending_timers(), 0);
}

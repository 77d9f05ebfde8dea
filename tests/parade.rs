mod common;

use cat_arcade::core::{Feedback, Track, Vec2};
use cat_arcade::parade::{CatKind, CatParade, ParadeConfig, ParadePhase};

use common::{SharedLog, recording_host};

// Scripted cats sit above the lanes (y < 80) so random spawns never overlap
// the click targets.
const ROW_Y: f64 = 10.0;

fn start() -> (CatParade, SharedLog) {
    let (host, log) = recording_host();
    let mut engine = CatParade::new(ParadeConfig::default()).unwrap().with_seed(7);
    engine.start_session(host, 0.0);
    (engine, log)
}

fn place(engine: &mut CatParade, kind: CatKind, x: f64) {
    engine.act(|rules, ctx| rules.spawn_cat_at(ctx, kind, Vec2::new(x, ROW_Y)));
}

fn click(engine: &mut CatParade, x: f64) {
    engine.input_mut().unwrap().click(x + 10.0, ROW_Y + 20.0);
}

#[test]
fn reaching_threshold_exactly_levels_up_once() {
    let (mut engine, log) = start();
    place(&mut engine, CatKind::Rare, 100.0);
    place(&mut engine, CatKind::Speed, 200.0);

    click(&mut engine, 100.0);
    engine.advance(16.0);
    assert_eq!(engine.snapshot().unwrap().score, 6);
    assert_eq!(engine.snapshot().unwrap().level, 1);

    click(&mut engine, 200.0);
    engine.advance(32.0);
    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.score, 10);
    assert_eq!(snap.level, 2);
    assert_eq!(snap.spawn_interval_ms, 800.0);
    assert_eq!(snap.troll_chance, 0.05);
    assert_eq!(log.borrow().count_feedback(|f| matches!(f, Feedback::LevelUp { level: 2 })), 1);
}

#[test]
fn overshoot_advances_one_level_per_tick() {
    let (mut engine, log) = start();
    for i in 0..4 {
        place(&mut engine, CatKind::Giant, 100.0 + 80.0 * f64::from(i));
    }
    for i in 0..4 {
        click(&mut engine, 100.0 + 80.0 * f64::from(i));
    }
    engine.advance(16.0);
    // 8 + 8 + 16 + 16: past both the level 1 and level 2 requirements
    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.score, 48);
    assert_eq!(snap.level, 2);

    place(&mut engine, CatKind::Normal, 500.0);
    click(&mut engine, 500.0);
    engine.advance(32.0);
    assert_eq!(engine.snapshot().unwrap().level, 3);
    assert_eq!(log.borrow().count_feedback(|f| matches!(f, Feedback::LevelUp { .. })), 2);
}

#[test]
fn troll_penalty_never_drives_score_negative() {
    let (mut engine, log) = start();
    place(&mut engine, CatKind::Speed, 100.0);
    place(&mut engine, CatKind::Troll { penalty: 15 }, 200.0);
    click(&mut engine, 100.0);
    engine.advance(16.0);
    click(&mut engine, 200.0);
    engine.advance(32.0);

    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.score, 0);
    assert_eq!(snap.combo, 0);
    assert_eq!(log.borrow().count_feedback(|f| matches!(f, Feedback::PenaltyPopup { penalty: 15, .. })), 1);
    // shake pulses run out and recentre the area
    engine.advance(1_000.0);
    let log = log.borrow();
    let last_shake = log.feedback.iter().rev().find(|f| matches!(f, Feedback::ScreenShake { .. }));
    assert_eq!(last_shake, Some(&Feedback::ScreenShake { offset: Vec2::ZERO }));
}

#[test]
fn ending_session_despawns_everything_and_stops_audio() {
    let (mut engine, log) = start();
    engine.advance(2_000.0);
    assert!(!log.borrow().alive().is_empty());
    assert_eq!(log.borrow().tracks, vec![Track::ParadeSong]);

    engine.end_session();
    let log = log.borrow();
    assert!(log.alive().is_empty());
    assert_eq!(log.clears, 1);
    assert!(log.stops >= 1);
    assert_eq!(engine.pending_timers(), 0);
    assert!(!engine.has_session());
}

#[test]
fn time_up_is_terminal_and_keeps_final_snapshot() {
    let (mut engine, log) = start();
    engine.advance(60_000.0);
    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.phase, ParadePhase::Ended);
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(log.borrow().count_feedback(|f| *f == Feedback::TimeUp), 1);

    let spawned = log.borrow().spawned.len();
    engine.advance(120_000.0);
    assert_eq!(log.borrow().spawned.len(), spawned);
    assert_eq!(engine.snapshot().unwrap(), snap);
}

//! Integration tests for the simulation loop, progress and persistence

use std::cell::RefCell;
use std::rc::Rc;

use floodline::core::{calculate_score, ScoreTable, StateUpdate};
use floodline::engine::{Outcome, Simulation, SimulationConfig};
use floodline::progress::{
    compute_stars, FileStore, LevelResult, MemoryStore, PersistenceProvider, ProgressionTracker,
    ScoreHistory,
};
use floodline::season::{self, PressurePhase, LEVEL_COUNT};
use floodline::types::{GameAction, GameEvent};

fn new_sim() -> Simulation<MemoryStore> {
    Simulation::new(SimulationConfig::default(), MemoryStore::new())
}

fn event_names<S: PersistenceProvider>(sim: &mut Simulation<S>) -> Rc<RefCell<Vec<&'static str>>> {
    let names = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&names);
    sim.subscribe(move |e: &GameEvent| sink.borrow_mut().push(e.name()));
    names
}

fn finish_with_lines<S: PersistenceProvider>(sim: &mut Simulation<S>, lines: u32) {
    sim.update_state(StateUpdate {
        lines: Some(lines),
        ..StateUpdate::default()
    });
}

#[test]
fn test_four_line_clear_at_level_two() {
    let r = calculate_score(4, 2, &ScoreTable::default(), 1.0);
    assert_eq!(r.base, 800);
    assert_eq!(r.bonus, 400);
    assert_eq!(r.total, 2400);
}

#[test]
fn test_star_thresholds() {
    let def = season::level(1).unwrap();
    assert_eq!(def.star_time_ms, 90_000);

    // Under 70% of the threshold.
    assert_eq!(compute_stars(def, 5, 60_000), 3);
    // Under the threshold only.
    assert_eq!(compute_stars(def, 5, 80_000), 2);
    // Past the threshold with no line bonus.
    assert_eq!(compute_stars(def, 5, 120_000), 1);
    // Past the threshold but 150% of the target.
    assert_eq!(compute_stars(def, 8, 120_000), 2);
    assert_eq!(compute_stars(def, 4, 10_000), 0);
}

#[test]
fn test_game_lifecycle() {
    let mut sim = new_sim();
    let names = event_names(&mut sim);

    sim.set_level(1).unwrap();
    assert!(sim.state().playable());
    assert_eq!(sim.environmental_state().phase, PressurePhase::Grace);

    assert!(sim.apply_action(GameAction::HardDrop));
    sim.tick(16);
    assert!(names.borrow().contains(&"piece_placed"));
    assert_eq!(sim.state().board.occupied_count(), 4);

    assert!(sim.apply_action(GameAction::Pause));
    assert!(!sim.state().playable());
    assert!(!sim.apply_action(GameAction::MoveLeft));
    assert!(sim.apply_action(GameAction::Pause));
    assert!(sim.state().playable());
}

#[test]
fn test_grace_ends_on_its_own_clock() {
    let mut sim = new_sim();
    let names = event_names(&mut sim);
    sim.set_level(1).unwrap();

    // Level 1 holds the water for 20 seconds.
    for _ in 0..19 {
        sim.tick(1_000);
        sim.update_state(StateUpdate {
            board: Some(vec![vec![0u8; 10]; 20]),
            ..StateUpdate::default()
        });
    }
    assert_eq!(sim.environmental_state().phase, PressurePhase::Grace);
    sim.tick(1_000);
    assert_eq!(sim.environmental_state().phase, PressurePhase::Rising);
    assert_eq!(
        names.borrow().iter().filter(|&&n| n == "grace_ended").count(),
        1
    );
}

#[test]
fn test_campaign_unlock_chain() {
    let mut tracker = ProgressionTracker::new();
    assert!(tracker.is_unlocked(1));
    assert!(!tracker.is_unlocked(2));

    for id in 1..=LEVEL_COUNT {
        let def = season::level(id).unwrap();
        let update = tracker
            .record_attempt(
                id,
                LevelResult {
                    lines: def.target_lines,
                    score: 1_000,
                    elapsed_ms: def.star_time_ms * 2,
                },
            )
            .unwrap();
        assert!(update.newly_completed);
        assert_eq!(update.stars, 1);
        if id < LEVEL_COUNT {
            assert_eq!(update.unlocked_levels, vec![id + 1]);
        }

        for l in 1..LEVEL_COUNT {
            if tracker.is_unlocked(l + 1) {
                assert!(tracker.is_completed(l), "level {} unlocked early", l + 1);
            }
        }
    }

    assert_eq!(tracker.total_stars(), LEVEL_COUNT);
    assert_eq!(tracker.bonuses().count(), 4);
}

#[test]
fn test_progress_survives_a_new_simulation() {
    let dir = tempfile::tempdir().unwrap();
    let config = SimulationConfig {
        player: "ada".to_string(),
        ..SimulationConfig::default()
    };

    let mut first = Simulation::new(config.clone(), FileStore::new(dir.path()));
    first.set_wall_clock_ms(1_700_000_000_000);
    first.set_level(1).unwrap();
    finish_with_lines(&mut first, 5);
    assert!(matches!(
        first.outcome(),
        Some(Outcome::Completed { level: 1, .. })
    ));
    drop(first);

    let mut second = Simulation::new(config, FileStore::new(dir.path()));
    assert!(second.progression().is_completed(1));
    assert!(second.progression().is_unlocked(2));
    let best = second.history().best().unwrap();
    assert_eq!(best.identity, "ada");
    assert_eq!(best.level, 1);
    assert_eq!(best.timestamp, 1_700_000_000_000);

    second.set_level(2).unwrap();
    assert_eq!(second.current_level().id, 2);
}

#[test]
fn test_corrupt_store_reads_as_fresh() {
    let mut store = MemoryStore::new();
    store.set("floodline.progress", "{not json").unwrap();
    store.set("floodline.scores", "[1, 2, 3]").unwrap();

    let sim = Simulation::new(SimulationConfig::default(), store);
    assert_eq!(sim.progression(), &ProgressionTracker::new());
    assert!(sim.history().is_empty());
    assert_eq!(ScoreHistory::load(sim.store()).len(), 0);
}

#[test]
fn test_same_seed_replays_the_same_run() {
    let run = || {
        let mut sim = new_sim();
        sim.set_level(1).unwrap();
        for _ in 0..400 {
            if sim.outcome().is_some() {
                break;
            }
            sim.autoplay();
            sim.tick(16);
        }
        (sim.state(), sim.environmental_state(), sim.outcome())
    };

    let (a_state, a_env, a_outcome) = run();
    let (b_state, b_env, b_outcome) = run();
    assert_eq!(a_state, b_state);
    assert_eq!(a_env, b_env);
    assert_eq!(a_outcome, b_outcome);
    assert!(a_state.board.occupied_count() > 0 || a_state.lines > 0);
}

#[test]
fn test_planner_clears_lines_on_level_one() {
    let mut sim = new_sim();
    sim.set_level(1).unwrap();

    for _ in 0..5_000 {
        if sim.outcome().is_some() {
            break;
        }
        sim.autoplay();
        sim.tick(16);
    }
    assert!(sim.session().lines() > 0);
}

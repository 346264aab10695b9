//! Headless Floodline runner (default binary).
//!
//! Plays one campaign level with the built-in placement planner, logging
//! events as they fire, and saves progress and scores under the configured
//! directory. Configure with `FLOODLINE_CONFIG` and the `FLOODLINE_*`
//! variables; set `RUST_LOG` to change verbosity.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use floodline::engine::{Outcome, Simulation, SimulationConfig};
use floodline::progress::FileStore;
use floodline::types::GameEvent;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimulationConfig::from_env().context("loading configuration")?;
    let store = FileStore::new(config.save_dir.clone());
    log::debug!("saving under {}", store.dir().display());

    let level = config.level;
    let tick_ms = config.tick_ms;
    let max_ticks = config.max_ticks;
    let player = config.player.clone();

    let mut sim = Simulation::new(config, store);
    sim.subscribe(log_event);
    sim.set_wall_clock_ms(now_ms());
    sim.set_level(level)
        .with_context(|| format!("entering level {}", level))?;

    let mut ticks = 0u64;
    while sim.outcome().is_none() && ticks < max_ticks {
        sim.autoplay();
        sim.tick(tick_ms);
        ticks += 1;
    }

    match sim.outcome() {
        Some(Outcome::Completed {
            level,
            stars,
            score,
            elapsed_ms,
        }) => log::info!(
            "{} cleared level {} with {} star(s), score {} in {:.1}s",
            player,
            level,
            stars,
            score,
            elapsed_ms as f64 / 1000.0
        ),
        Some(Outcome::Failed { level, reason }) => log::info!(
            "{} failed level {} ({}) after {} lines",
            player,
            level,
            reason.as_str(),
            sim.session().lines()
        ),
        None => log::info!(
            "stopped after {} ticks: {} lines, score {}",
            ticks,
            sim.session().lines(),
            sim.session().score()
        ),
    }

    if let Some(best) = sim.history().best() {
        log::info!("best score on record: {} ({})", best.score, best.identity);
    }
    Ok(())
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::LevelEntered {
            level,
            name,
            season,
        } => log::info!("level {} \"{}\" ({})", level, name, season.as_str()),
        GameEvent::HazardSpawned { kind, intensity, .. } => {
            log::info!("hazard {} at {:.2}", kind.as_str(), intensity)
        }
        GameEvent::MechanicActivated { name } => log::info!("mechanic {} active", name),
        GameEvent::PressureCritical => log::warn!("flood gauge is full"),
        GameEvent::LevelUnlocked { level } => log::info!("unlocked level {}", level),
        GameEvent::WorldUnlocked { world } => log::info!("unlocked world {}", world),
        GameEvent::BonusUnlocked { name } => log::info!("unlocked bonus {}", name),
        other => log::debug!("{}", other.name()),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

//! Simulation - one session, its flood gauge and its season, ticked together
//!
//! Every [`Simulation::tick`] runs the same fixed order:
//!
//! 1. refresh the session's modifiers from the director (plus bonuses)
//! 2. release deferred inputs, apply gravity, lower the gauge for cleared lines
//! 3. advance the flood gauge; a full gauge floods the session
//! 4. advance hazards, wildlife and mechanics
//! 5. publish the buffered events in that order
//! 6. settle the level outcome once, record it and persist
//!
//! Piece commands submitted while an input delay is in force are queued and
//! released by later ticks once the delay has elapsed.

use std::collections::VecDeque;

use thiserror::Error;

use floodline_core::{
    Board, EventBus, GameConfig, GameMode, GameSession, LineClear, MoveOutcome, Objective,
    SessionSnapshot, StateUpdate, SubscriptionId, UpdateReport,
};
use floodline_progress::{
    Bonus, LevelResult, PersistenceProvider, ProgressionTracker, ScoreEntry, ScoreHistory,
};
use floodline_season::{
    self as season, ActiveHazard, ActiveWildlife, EnvironmentalPressure, EnvironmentalState,
    LevelDefinition, MechanicContext, SeasonError, SeasonalDirector,
};

use crate::config::SimulationConfig;
use crate::place::{self, Placement};
use crate::types::{FailureReason, GameAction, GameEvent, ModifierKey, ModifierMap, Rotation};

/// Grace added to every level once `ExtendedGrace` is unlocked
pub const EXTENDED_GRACE_MS: u64 = 5_000;

/// Water rise multiplier applied once `SlowTide` is unlocked
pub const SLOW_TIDE_FACTOR: f64 = 0.9;

/// Score multiplier applied once `ScoreBoost` is unlocked
pub const SCORE_BOOST_FACTOR: f64 = 1.1;

/// Endless rise rate grows by this fraction of the base per difficulty level
pub const ENDLESS_RATE_STEP: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no level with id {0}")]
    UnknownLevel(u32),
    #[error("level {0} is locked")]
    LevelLocked(u32),
    #[error("endless mode is locked")]
    EndlessLocked,
    #[error(transparent)]
    Season(#[from] SeasonError),
}

/// A piece input that may be held back by an input delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceCommand {
    Move { dx: i8, dy: i8 },
    Rotate { clockwise: bool },
    SoftDrop,
    HardDrop,
    /// Rotate, shift and hard drop in one step
    Place { x: i8, rotation: Rotation },
}

#[derive(Debug, Clone, Copy)]
struct Deferred {
    command: PieceCommand,
    remaining_ms: u64,
}

/// How the current level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed {
        level: u32,
        stars: u8,
        score: u64,
        elapsed_ms: u64,
    },
    Failed {
        level: u32,
        reason: FailureReason,
    },
}

pub struct Simulation<S: PersistenceProvider> {
    config: SimulationConfig,
    session: GameSession,
    pressure: EnvironmentalPressure,
    director: SeasonalDirector,
    progress: ProgressionTracker,
    history: ScoreHistory,
    store: S,
    bus: EventBus,
    deferred: VecDeque<Deferred>,
    outbox: Vec<GameEvent>,
    outcome: Option<Outcome>,
    endless: bool,
    wall_clock_ms: u64,
}

fn campaign_config(base: &GameConfig, def: &LevelDefinition) -> GameConfig {
    GameConfig {
        mode: GameMode::Campaign,
        objective: Some(Objective::Lines(def.target_lines)),
        curve: base.curve.with_base_interval(def.base_drop_interval_ms),
        ..base.clone()
    }
}

fn endless_config(base: &GameConfig, def: &LevelDefinition) -> GameConfig {
    GameConfig {
        mode: GameMode::Endless,
        objective: None,
        curve: base.curve.with_base_interval(def.base_drop_interval_ms),
        ..base.clone()
    }
}

impl<S: PersistenceProvider> Simulation<S> {
    /// Load saved progress from `store`; no level is running until
    /// [`set_level`](Self::set_level) or [`start_endless`](Self::start_endless)
    pub fn new(config: SimulationConfig, store: S) -> Self {
        let progress = ProgressionTracker::load(&store);
        let history = ScoreHistory::load(&store);
        let director = SeasonalDirector::new(config.director, config.seed);
        let session = GameSession::new(
            campaign_config(&config.game, director.current_level()),
            config.seed,
        );

        Self {
            pressure: EnvironmentalPressure::new(config.pressure),
            config,
            session,
            director,
            progress,
            history,
            store,
            bus: EventBus::new(),
            deferred: VecDeque::new(),
            outbox: Vec::new(),
            outcome: None,
            endless: false,
            wall_clock_ms: 0,
        }
    }

    // Lifecycle

    /// Start campaign level `n`; it must be unlocked
    pub fn set_level(&mut self, n: u32) -> Result<(), EngineError> {
        let def = season::level(n).ok_or(EngineError::UnknownLevel(n))?;
        if !self.progress.is_unlocked(n) {
            return Err(EngineError::LevelLocked(n));
        }
        self.enter(def, false)
    }

    /// Start endless play from the hardest level's parameters
    pub fn start_endless(&mut self) -> Result<(), EngineError> {
        if !self.progress.has_bonus(Bonus::EndlessMode) {
            return Err(EngineError::EndlessLocked);
        }
        self.enter(season::final_level(), true)
    }

    /// Replay the current level (or endless run) from the start
    pub fn restart(&mut self) -> Result<(), EngineError> {
        let def = self.director.current_level();
        self.enter(def, self.endless)
    }

    fn enter(&mut self, def: &'static LevelDefinition, endless: bool) -> Result<(), EngineError> {
        self.director.set_level(def.id, &mut self.pressure)?;
        if self.progress.has_bonus(Bonus::ExtendedGrace) {
            let grace = self.pressure.state().grace_period_ms + EXTENDED_GRACE_MS;
            self.pressure.configure(def.rise_rate, Some(grace));
        }

        let game = if endless {
            endless_config(&self.config.game, def)
        } else {
            campaign_config(&self.config.game, def)
        };
        self.session = GameSession::new(game, self.config.seed);
        self.endless = endless;
        self.outcome = None;
        self.deferred.clear();

        if endless {
            log::info!("starting endless run");
            self.scale_endless();
        }
        let modifiers = self.seasonal_piece_modifiers();
        self.session.set_modifiers(modifiers);
        self.session.start();

        self.drain_director();
        self.drain_session();
        self.drain_pressure();
        self.flush();
        Ok(())
    }

    // Commands

    /// Spawn the next piece when none is falling
    pub fn spawn_piece(&mut self) -> bool {
        if !self.is_live() || self.session.current_piece().is_some() {
            return false;
        }
        let spawned = self.session.spawn_piece();
        self.after_command();
        spawned
    }

    pub fn move_piece(&mut self, dx: i8, dy: i8) -> bool {
        self.dispatch(PieceCommand::Move { dx, dy })
    }

    pub fn rotate_piece(&mut self, clockwise: bool) -> bool {
        self.dispatch(PieceCommand::Rotate { clockwise })
    }

    pub fn soft_drop(&mut self) -> bool {
        self.dispatch(PieceCommand::SoftDrop)
    }

    pub fn hard_drop(&mut self) -> bool {
        self.dispatch(PieceCommand::HardDrop)
    }

    /// Steer the falling piece to `x` in `rotation` and drop it
    pub fn place(&mut self, x: i8, rotation: Rotation) -> bool {
        self.dispatch(PieceCommand::Place { x, rotation })
    }

    /// Plan and submit a placement for the falling piece
    ///
    /// Does nothing while earlier inputs are still waiting out a delay.
    /// Returns `None` when the piece cannot be steered to the plan.
    pub fn autoplay(&mut self) -> Option<Placement> {
        if !self.is_live() || !self.deferred.is_empty() {
            return None;
        }
        let piece = self.session.current_piece()?;
        let plan = place::best_placement(self.session.board(), piece)?;
        self.place(plan.x, plan.rotation).then_some(plan)
    }

    /// Apply a discrete command; piece inputs honour the input delay
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::MoveLeft => self.move_piece(-1, 0),
            GameAction::MoveRight => self.move_piece(1, 0),
            GameAction::SoftDrop => self.soft_drop(),
            GameAction::HardDrop => self.hard_drop(),
            GameAction::RotateCw => self.rotate_piece(true),
            GameAction::RotateCcw => self.rotate_piece(false),
            GameAction::Pause => {
                if self.outcome.is_some() {
                    return false;
                }
                let toggled = self.session.apply_action(GameAction::Pause);
                self.after_command();
                toggled
            }
            GameAction::Restart => match self.restart() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("restart failed: {}", e);
                    false
                }
            },
        }
    }

    /// External grace expiry signal
    pub fn grace_timer_expired(&mut self) {
        self.pressure.grace_timer_expired();
        self.drain_pressure();
        self.flush();
    }

    /// Apply a batch of session fields through the session's validation
    pub fn update_state(&mut self, update: StateUpdate) -> UpdateReport {
        let report = self.session.update(update);
        self.after_command();
        report
    }

    /// Clear full rows of any board without touching the session
    pub fn clear_lines(&self, board: &Board) -> LineClear {
        board.clear_lines()
    }

    /// Timestamp written into score history entries
    pub fn set_wall_clock_ms(&mut self, now_ms: u64) {
        self.wall_clock_ms = now_ms;
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Advance everything by `delta_ms`
    pub fn tick(&mut self, delta_ms: u32) {
        if !self.is_live() {
            return;
        }

        let modifiers = self.seasonal_piece_modifiers();
        self.session.set_modifiers(modifiers.clone());
        if self.endless {
            self.scale_endless();
        }

        self.release_deferred(delta_ms);
        self.session.tick(delta_ms);
        self.drain_session();

        self.pressure.tick(delta_ms, &modifiers);
        if self.pressure.is_critical() && !self.session.is_game_over() {
            self.session.end(FailureReason::Flooded);
        }
        self.drain_pressure();
        self.drain_session();

        let ctx = MechanicContext {
            elapsed_ms: self.session.elapsed_ms(),
            lines: self.session.lines(),
            score: self.session.score(),
        };
        self.director.tick(delta_ms, &ctx);
        self.drain_director();

        self.flush();
        self.settle();
    }

    // Reads

    pub fn state(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn current_level(&self) -> &'static LevelDefinition {
        self.director.current_level()
    }

    pub fn environmental_state(&self) -> EnvironmentalState {
        self.pressure.state()
    }

    /// Director modifiers with unlocked bonuses folded in
    pub fn seasonal_piece_modifiers(&self) -> ModifierMap {
        let mut map = self.director.seasonal_piece_modifiers();
        if self.progress.has_bonus(Bonus::SlowTide) {
            let rise = map.get(ModifierKey::WaterRiseMultiplier);
            map.set(ModifierKey::WaterRiseMultiplier, rise * SLOW_TIDE_FACTOR);
        }
        if self.progress.has_bonus(Bonus::ScoreBoost) {
            let score = map.get(ModifierKey::ScoreMultiplier);
            map.set(ModifierKey::ScoreMultiplier, score * SCORE_BOOST_FACTOR);
        }
        map
    }

    pub fn active_hazards(&self) -> &[ActiveHazard] {
        self.director.active_hazards()
    }

    pub fn active_wildlife(&self) -> &[ActiveWildlife] {
        self.director.active_wildlife()
    }

    pub fn active_mechanics(&self) -> Vec<&'static str> {
        self.director.active_mechanics()
    }

    pub fn progression(&self) -> &ProgressionTracker {
        &self.progress
    }

    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_endless(&self) -> bool {
        self.endless
    }

    /// Inputs still waiting out an input delay
    pub fn pending_inputs(&self) -> usize {
        self.deferred.len()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // Internals

    fn is_live(&self) -> bool {
        self.outcome.is_none()
            && self.session.started()
            && !self.session.is_paused()
            && !self.session.is_game_over()
    }

    fn dispatch(&mut self, command: PieceCommand) -> bool {
        if !self.is_live() {
            return false;
        }
        let delay = self.seasonal_piece_modifiers().input_delay_ms();
        if delay > 0 {
            self.deferred.push_back(Deferred {
                command,
                remaining_ms: delay,
            });
            return true;
        }
        let applied = self.execute(command);
        self.after_command();
        applied
    }

    fn execute(&mut self, command: PieceCommand) -> bool {
        match command {
            PieceCommand::Move { dx, dy } => {
                !matches!(self.session.move_piece(dx, dy), MoveOutcome::Blocked)
            }
            PieceCommand::Rotate { clockwise } => self.session.rotate_piece(clockwise),
            PieceCommand::SoftDrop => self.session.soft_drop(),
            PieceCommand::HardDrop => {
                let had_piece = self.session.current_piece().is_some();
                self.session.hard_drop();
                had_piece
            }
            PieceCommand::Place { x, rotation } => {
                match place::apply_place(&mut self.session, x, rotation) {
                    Ok(_) => true,
                    Err(e) => {
                        log::debug!("placement rejected: {}", e);
                        false
                    }
                }
            }
        }
    }

    /// Run queued inputs whose delay has elapsed, oldest first
    fn release_deferred(&mut self, delta_ms: u32) {
        for d in &mut self.deferred {
            d.remaining_ms = d.remaining_ms.saturating_sub(delta_ms as u64);
        }
        while self.deferred.front().is_some_and(|d| d.remaining_ms == 0) {
            if let Some(d) = self.deferred.pop_front() {
                self.execute(d.command);
            }
        }
    }

    fn after_command(&mut self) {
        self.drain_session();
        self.drain_pressure();
        self.flush();
        self.settle();
    }

    fn scale_endless(&mut self) {
        let base = season::final_level().rise_rate;
        let steps = self.session.level().saturating_sub(1) as f64;
        self.pressure
            .set_base_rise_rate(base * (1.0 + ENDLESS_RATE_STEP * steps));
    }

    fn drain_session(&mut self) {
        for event in self.session.take_events() {
            if let GameEvent::LinesCleared { count, .. } = event {
                self.pressure.lower_for_lines(count);
            }
            self.outbox.push(event);
        }
    }

    fn drain_pressure(&mut self) {
        self.outbox.extend(self.pressure.take_events());
    }

    fn drain_director(&mut self) {
        self.outbox.extend(self.director.take_events());
    }

    fn flush(&mut self) {
        let events = std::mem::take(&mut self.outbox);
        for event in &events {
            log::trace!("event {}", event.name());
        }
        self.bus.publish_all(&events);
    }

    /// Detect completion or failure once and record it
    fn settle(&mut self) {
        if self.outcome.is_some() || !self.session.started() {
            return;
        }
        let completed = !self.endless && self.session.objective_met();
        let failure = self.session.failure();
        if !completed && failure.is_none() {
            return;
        }

        let def = self.director.current_level();
        let result = LevelResult {
            lines: self.session.lines(),
            score: self.session.score(),
            elapsed_ms: self.session.elapsed_ms(),
        };

        let mut unlocks = Vec::new();
        let mut stars = 0;
        if !self.endless {
            match self.progress.record_attempt(def.id, result) {
                Ok(update) => {
                    stars = update.stars;
                    unlocks = update.unlock_events();
                }
                Err(e) => log::warn!("could not record attempt: {}", e),
            }
        }

        let outcome = match failure {
            Some(reason) if !completed => {
                log::info!(
                    "level {} failed ({}) with {} points",
                    def.id,
                    reason.as_str(),
                    result.score
                );
                Outcome::Failed {
                    level: def.id,
                    reason,
                }
            }
            _ => {
                log::info!(
                    "level {} completed with {} stars and {} points",
                    def.id,
                    stars,
                    result.score
                );
                Outcome::Completed {
                    level: def.id,
                    stars,
                    score: result.score,
                    elapsed_ms: result.elapsed_ms,
                }
            }
        };
        self.outcome = Some(outcome);

        let entry = ScoreEntry {
            identity: self.config.player.clone(),
            score: result.score,
            timestamp: self.wall_clock_ms,
            level: if self.endless {
                self.session.level()
            } else {
                def.id
            },
            lines: result.lines,
        };
        if let Some(rank) = self.history.record(entry) {
            log::info!("score ranked #{} in history", rank);
        }

        self.progress.save(&mut self.store);
        self.history.save(&mut self.store);

        self.outbox.push(match outcome {
            Outcome::Completed {
                level,
                stars,
                score,
                elapsed_ms,
            } => GameEvent::LevelCompleted {
                level,
                stars,
                score,
                elapsed_ms,
            },
            Outcome::Failed { level, reason } => GameEvent::LevelFailed { level, reason },
        });
        self.outbox.extend(unlocks);
        self.flush();
    }
}

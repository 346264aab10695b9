//! Game session module - owns the board, falling piece and counters
//!
//! This module ties together board, pieces, RNG, scoring and difficulty. It
//! handles gravity timing, piece movement, placement, line clears and the
//! session lifecycle. Events are buffered and drained with
//! [`GameSession::take_events`].
//!
//! Pieces lock as soon as a downward move collides; there is no lock delay.

use crate::board::Board;
use crate::config::GameConfig;
use crate::controller::{self, MoveOutcome};
use crate::difficulty::ObjectiveProgress;
use crate::pieces::Piece;
use crate::rng::PieceQueue;
use crate::scoring::{calculate_drop_score, calculate_score};
use crate::snapshot::SessionSnapshot;
use crate::update::{RejectedField, StateUpdate, StateViolation, UpdateReport};
use crate::types::{FailureReason, GameAction, GameEvent, ModifierMap};

/// A single play session
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    seed: u32,
    board: Board,
    current: Option<Piece>,
    next: Option<Piece>,
    queue: PieceQueue,
    score: u64,
    level: u32,
    lines: u32,
    game_over: bool,
    failure: Option<FailureReason>,
    paused: bool,
    started: bool,
    drop_timer_ms: u32,
    elapsed_ms: u64,
    modifiers: ModifierMap,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Create a new, unstarted session with the given RNG seed
    pub fn new(config: GameConfig, seed: u32) -> Self {
        let mut queue = PieceQueue::new(seed);
        let next = Piece::new(queue.draw());

        Self {
            board: Board::new(config.width, config.height),
            level: config.curve.starting_level,
            config,
            seed,
            current: None,
            next: Some(next),
            queue,
            score: 0,
            lines: 0,
            game_over: false,
            failure: None,
            paused: false,
            started: false,
            drop_timer_ms: 0,
            elapsed_ms: 0,
            modifiers: ModifierMap::new(),
            events: Vec::new(),
        }
    }

    /// Start the session and spawn the first piece
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.spawn_piece();
    }

    /// Replace the whole session with a fresh, unstarted one
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone(), self.seed);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_piece(&self) -> Option<&Piece> {
        self.current.as_ref()
    }

    pub fn next_piece(&self) -> Option<&Piece> {
        self.next.as_ref()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn failure(&self) -> Option<FailureReason> {
        self.failure
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Time spent in play (paused and game-over time excluded)
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn modifiers(&self) -> &ModifierMap {
        &self.modifiers
    }

    /// Replace the active seasonal modifiers
    pub fn set_modifiers(&mut self, modifiers: ModifierMap) {
        self.modifiers = modifiers;
    }

    pub fn objective_progress(&self) -> ObjectiveProgress {
        ObjectiveProgress {
            lines: self.lines,
            score: self.score,
            elapsed_ms: self.elapsed_ms,
        }
    }

    /// Whether the configured objective has been reached
    pub fn objective_met(&self) -> bool {
        self.config.objective().is_complete(&self.objective_progress())
    }

    /// Drain buffered events in emission order
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_live(&self) -> bool {
        self.started && !self.paused && !self.game_over
    }

    /// Gravity interval after the seasonal drop-speed multiplier
    pub fn drop_interval_ms(&self) -> u32 {
        let base = self.config.curve.drop_interval_ms(self.level);
        let speed = self.modifiers.drop_speed_multiplier();
        if !speed.is_finite() || speed <= 0.0 {
            return base.max(1);
        }
        ((base as f64 / speed).round() as u32).max(1)
    }

    /// Row the current piece would land on
    pub fn ghost_y(&self) -> Option<i8> {
        self.current
            .as_ref()
            .map(|p| controller::ghost_y(&self.board, p))
    }

    /// Spawn the next piece at the top of the board
    ///
    /// Returns false and ends the session if the spawn cells are blocked.
    pub fn spawn_piece(&mut self) -> bool {
        if self.game_over {
            return false;
        }

        let piece = match self.next.take() {
            Some(p) => p,
            None => Piece::new(self.queue.draw()),
        };
        self.next = Some(Piece::new(self.queue.draw()));
        self.drop_timer_ms = 0;

        match controller::spawn(&self.board, piece) {
            Ok(piece) => {
                log::debug!("spawned {:?} at x={}", piece.kind, piece.x);
                self.events.push(GameEvent::PieceSpawned { kind: piece.kind });
                self.current = Some(piece);
                true
            }
            Err(_) => {
                self.current = None;
                self.end(FailureReason::BlockedSpawn);
                false
            }
        }
    }

    /// End the session; later calls keep the first reason
    pub fn end(&mut self, reason: FailureReason) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.failure = Some(reason);
        self.events.push(GameEvent::GameOver { reason });
    }

    /// Move the current piece
    ///
    /// A downward move into a collision places the piece instead.
    pub fn move_piece(&mut self, dx: i8, dy: i8) -> MoveOutcome {
        if !self.is_live() {
            return MoveOutcome::Blocked;
        }
        let Some(current) = self.current.as_ref() else {
            return MoveOutcome::Blocked;
        };

        let outcome = controller::translate(&self.board, current, dx, dy);
        match &outcome {
            MoveOutcome::Moved(p) => self.current = Some(p.clone()),
            MoveOutcome::Landed => self.place_current(),
            MoveOutcome::Blocked => {}
        }
        outcome
    }

    /// Rotate the current piece; false when no kick fits
    pub fn rotate_piece(&mut self, clockwise: bool) -> bool {
        if !self.is_live() {
            return false;
        }
        let Some(current) = self.current.as_ref() else {
            return false;
        };
        match controller::rotate(&self.board, current, clockwise) {
            Some(rotated) => {
                self.current = Some(rotated);
                true
            }
            None => false,
        }
    }

    /// Move down one row, scoring a soft drop point on success
    pub fn soft_drop(&mut self) -> bool {
        match self.move_piece(0, 1) {
            MoveOutcome::Moved(_) => {
                self.score += calculate_drop_score(1, false, &self.config.scores);
                true
            }
            MoveOutcome::Landed => true,
            MoveOutcome::Blocked => false,
        }
    }

    /// Drop to the floor and place; returns the distance fallen
    pub fn hard_drop(&mut self) -> u32 {
        if !self.is_live() {
            return 0;
        }
        let Some(current) = self.current.as_ref() else {
            return 0;
        };

        let (dropped, distance) = controller::hard_drop(&self.board, current);
        self.current = Some(dropped);
        self.score += calculate_drop_score(distance, true, &self.config.scores);
        self.place_current();
        distance
    }

    /// Merge the current piece into the board, clear lines and spawn the next
    fn place_current(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };

        let written = self.board.lock_piece(&piece);
        self.events.push(GameEvent::PiecePlaced { cells: written });

        let rows = self.board.clear_full_rows();
        if !rows.is_empty() {
            let count = rows.len() as u32;
            self.lines = self.lines.saturating_add(count);
            let by_lines = self
                .config
                .curve
                .level_for_lines(self.lines, self.config.max_level());
            self.level = self.level.max(by_lines);

            let mut multiplier = self.modifiers.score_multiplier();
            if self.config.mode.scales_score() {
                multiplier *= self.config.curve.score_multiplier(self.level);
            }
            let result = calculate_score(count, self.level, &self.config.scores, multiplier);
            self.score = self.score.saturating_add(result.total);

            log::debug!("cleared {} rows for {} points", count, result.total);
            self.events.push(GameEvent::LinesCleared {
                count,
                rows,
                points: result.total,
            });
        }

        self.spawn_piece();
    }

    /// Main game tick - advance timers and apply gravity
    ///
    /// Returns true if the piece moved or was placed.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        if !self.is_live() {
            return false;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms as u64);

        if self.current.is_none() && !self.spawn_piece() {
            return false;
        }

        self.drop_timer_ms = self.drop_timer_ms.saturating_add(delta_ms);
        let mut acted = false;
        loop {
            let interval = self.drop_interval_ms();
            if self.drop_timer_ms < interval {
                break;
            }
            self.drop_timer_ms -= interval;
            acted = true;
            match self.move_piece(0, 1) {
                MoveOutcome::Moved(_) => {}
                // Placement reset the timer for the new piece.
                MoveOutcome::Landed | MoveOutcome::Blocked => break,
            }
        }
        acted
    }

    /// Apply a discrete command
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::MoveLeft => matches!(self.move_piece(-1, 0), MoveOutcome::Moved(_)),
            GameAction::MoveRight => matches!(self.move_piece(1, 0), MoveOutcome::Moved(_)),
            GameAction::SoftDrop => self.soft_drop(),
            GameAction::HardDrop => {
                let live = self.is_live() && self.current.is_some();
                self.hard_drop();
                live
            }
            GameAction::RotateCw => self.rotate_piece(true),
            GameAction::RotateCcw => self.rotate_piece(false),
            GameAction::Pause => {
                if !self.started || self.game_over {
                    return false;
                }
                self.paused = !self.paused;
                true
            }
            GameAction::Restart => {
                self.reset();
                self.start();
                true
            }
        }
    }

    /// Apply a batch of proposed field values
    ///
    /// Each field is validated on its own; invalid ones are dropped with a
    /// warning and listed in the report while valid ones are committed.
    /// `StateChanged` is emitted when a committed value differs.
    pub fn update(&mut self, update: StateUpdate) -> UpdateReport {
        let mut report = UpdateReport::default();

        if let Some(rows) = update.board {
            match self.check_board(&rows) {
                Ok(board) => {
                    report.changed |= board != self.board;
                    self.board = board;
                    report.applied.push("board");
                }
                Err(reason) => report.rejected.push(RejectedField::new("board", reason)),
            }
        }

        if let Some(piece) = update.current_piece {
            match self.check_current(piece.as_ref()) {
                Ok(()) => {
                    report.changed |= !same_slot(self.current.as_ref(), piece.as_ref());
                    self.current = piece;
                    report.applied.push("currentPiece");
                }
                Err(reason) => report
                    .rejected
                    .push(RejectedField::new("currentPiece", reason)),
            }
        }

        if let Some(piece) = update.next_piece {
            match piece.as_ref() {
                Some(p) if !p.is_well_formed() => report
                    .rejected
                    .push(RejectedField::new("nextPiece", "piece is malformed")),
                _ => {
                    report.changed |= !same_slot(self.next.as_ref(), piece.as_ref());
                    self.next = piece;
                    report.applied.push("nextPiece");
                }
            }
        }

        if let Some(score) = update.score {
            if score < self.score {
                report
                    .rejected
                    .push(RejectedField::new("score", "score cannot decrease"));
            } else {
                report.changed |= score != self.score;
                self.score = score;
                report.applied.push("score");
            }
        }

        if let Some(level) = update.level {
            let min = self.config.curve.starting_level;
            let max = self.config.max_level();
            if level < min || level > max {
                report.rejected.push(RejectedField::new(
                    "level",
                    format!("level {level} outside {min}..={max}"),
                ));
            } else if level < self.level {
                report
                    .rejected
                    .push(RejectedField::new("level", "level cannot decrease"));
            } else {
                report.changed |= level != self.level;
                self.level = level;
                report.applied.push("level");
            }
        }

        if let Some(lines) = update.lines {
            if lines < self.lines {
                report
                    .rejected
                    .push(RejectedField::new("lines", "lines cannot decrease"));
            } else {
                report.changed |= lines != self.lines;
                self.lines = lines;
                report.applied.push("lines");
            }
        }

        if let Some(over) = update.is_game_over {
            if over {
                report.changed |= !self.game_over;
                self.end(FailureReason::Aborted);
                report.applied.push("isGameOver");
            } else if self.game_over {
                report.rejected.push(RejectedField::new(
                    "isGameOver",
                    "an ended session cannot resume",
                ));
            } else {
                report.applied.push("isGameOver");
            }
        }

        if let Some(paused) = update.is_paused {
            report.changed |= paused != self.paused;
            self.paused = paused;
            report.applied.push("isPaused");
        }

        for rejected in &report.rejected {
            log::warn!("dropped update field {}: {}", rejected.field, rejected.reason);
        }
        if report.changed {
            self.events.push(GameEvent::StateChanged);
        }
        report
    }

    /// Apply an update from loosely-typed JSON; type errors join the report
    pub fn update_json(&mut self, value: &serde_json::Value) -> UpdateReport {
        let (update, type_errors) = StateUpdate::from_json(value);
        for rejected in &type_errors {
            log::warn!("dropped update field {}: {}", rejected.field, rejected.reason);
        }
        let mut report = self.update(update);
        report.rejected.splice(0..0, type_errors);
        report
    }

    fn check_board(&self, rows: &[Vec<u8>]) -> Result<Board, String> {
        let board = Board::from_rows(rows).map_err(|e| e.to_string())?;
        if board.width() != self.config.width || board.height() != self.config.height {
            return Err(format!(
                "board is {}x{}, expected {}x{}",
                board.width(),
                board.height(),
                self.config.width,
                self.config.height
            ));
        }
        Ok(board)
    }

    /// A proposed falling piece must be well formed and fit the committed board
    fn check_current(&self, piece: Option<&Piece>) -> Result<(), String> {
        let Some(piece) = piece else {
            return Ok(());
        };
        if !piece.is_well_formed() {
            return Err("piece is malformed".to_string());
        }
        if self.board.collides(piece, 0, 0) {
            return Err("piece overlaps the board".to_string());
        }
        Ok(())
    }

    /// Recompute structural invariants; never repairs anything
    pub fn validate_state(&self) -> Result<(), Vec<StateViolation>> {
        let mut violations = Vec::new();

        let expected = (self.config.width, self.config.height);
        let actual = (self.board.width(), self.board.height());
        if actual != expected || !self.board.is_rectangular() {
            violations.push(StateViolation::BoardShape { expected, actual });
        }

        let min = self.config.curve.starting_level;
        let max = self.config.max_level();
        if self.level < min || self.level > max {
            violations.push(StateViolation::LevelOutOfRange {
                level: self.level,
                min,
                max,
            });
        }

        if let Some(current) = &self.current {
            if !current.is_well_formed() {
                violations.push(StateViolation::MalformedPiece {
                    slot: "currentPiece",
                });
            } else if self.board.collides(current, 0, 0) {
                violations.push(StateViolation::ActiveOverlaps);
            }
        }
        if let Some(next) = &self.next {
            if !next.is_well_formed() {
                violations.push(StateViolation::MalformedPiece { slot: "nextPiece" });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Owned, immutable copy of everything a presentation layer reads
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.clone(),
            current: self.current.clone(),
            next: self.next.clone(),
            ghost_y: self.ghost_y(),
            score: self.score,
            level: self.level,
            lines: self.lines,
            game_over: self.game_over,
            failure: self.failure,
            paused: self.paused,
            started: self.started,
            elapsed_ms: self.elapsed_ms,
            drop_timer_ms: self.drop_timer_ms,
            drop_interval_ms: self.drop_interval_ms(),
        }
    }

    /// Mutable board access for scenario setup
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(GameConfig::default(), 1)
    }
}

/// Structural comparison of two piece slots
fn same_slot(a: Option<&Piece>, b: Option<&Piece>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_placement(b),
        _ => false,
    }
}

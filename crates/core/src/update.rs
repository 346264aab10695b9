//! Batched external state updates and structural validation
//!
//! A [`StateUpdate`] proposes new values for any subset of session fields.
//! The session checks each field on its own, commits the valid ones and
//! lists the rejected ones in an [`UpdateReport`].

use serde_json::Value;

use crate::pieces::{Piece, Shape};
use crate::types::{Cell, PieceKind, Rotation};

/// Proposed session fields; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    /// Replacement grid, top row first
    pub board: Option<Vec<Vec<Cell>>>,
    /// `Some(None)` clears the falling piece
    pub current_piece: Option<Option<Piece>>,
    pub next_piece: Option<Option<Piece>>,
    pub score: Option<u64>,
    pub level: Option<u32>,
    pub lines: Option<u32>,
    pub is_game_over: Option<bool>,
    pub is_paused: Option<bool>,
}

/// A field dropped from an update, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedField {
    pub field: &'static str,
    pub reason: String,
}

impl RejectedField {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Outcome of [`GameSession::update`](crate::GameSession::update)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Fields that passed validation and were committed
    pub applied: Vec<&'static str>,
    pub rejected: Vec<RejectedField>,
    /// Whether any committed field differed from the previous value
    pub changed: bool,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Structural problem found by [`GameSession::validate_state`](crate::GameSession::validate_state)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateViolation {
    BoardShape {
        expected: (u8, u8),
        actual: (u8, u8),
    },
    LevelOutOfRange {
        level: u32,
        min: u32,
        max: u32,
    },
    MalformedPiece {
        slot: &'static str,
    },
    ActiveOverlaps,
}

impl StateUpdate {
    /// Read an update from a loosely-typed JSON object
    ///
    /// Recognised keys are `board`, `currentPiece`, `nextPiece`, `score`,
    /// `level`, `lines`, `isGameOver` and `isPaused`. A key whose value has
    /// the wrong type is reported and skipped; unknown keys are ignored.
    pub fn from_json(value: &Value) -> (StateUpdate, Vec<RejectedField>) {
        let mut update = StateUpdate::default();
        let mut rejected = Vec::new();

        let Some(obj) = value.as_object() else {
            rejected.push(RejectedField::new("update", "expected a JSON object"));
            return (update, rejected);
        };

        macro_rules! field {
            ($key:literal, $target:expr, $parse:expr) => {
                if let Some(v) = obj.get($key) {
                    match $parse(v) {
                        Ok(parsed) => $target = Some(parsed),
                        Err(reason) => rejected.push(RejectedField::new($key, reason)),
                    }
                }
            };
        }

        field!("board", update.board, parse_board);
        field!("currentPiece", update.current_piece, parse_optional_piece);
        field!("nextPiece", update.next_piece, parse_optional_piece);
        field!("score", update.score, parse_u64);
        field!("level", update.level, parse_u32);
        field!("lines", update.lines, parse_u32);
        field!("isGameOver", update.is_game_over, parse_bool);
        field!("isPaused", update.is_paused, parse_bool);

        (update, rejected)
    }
}

fn parse_bool(v: &Value) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| "expected a boolean".to_string())
}

fn parse_u64(v: &Value) -> Result<u64, String> {
    v.as_u64()
        .ok_or_else(|| "expected a non-negative integer".to_string())
}

fn parse_u32(v: &Value) -> Result<u32, String> {
    parse_u64(v)
        .and_then(|n| u32::try_from(n).map_err(|_| "integer out of range".to_string()))
}

fn parse_i8(v: &Value) -> Result<i8, String> {
    v.as_i64()
        .and_then(|n| i8::try_from(n).ok())
        .ok_or_else(|| "expected a small integer".to_string())
}

fn parse_cell(v: &Value) -> Result<Cell, String> {
    v.as_u64()
        .and_then(|n| Cell::try_from(n).ok())
        .ok_or_else(|| "cells must be integers in 0..=255".to_string())
}

fn parse_matrix(v: &Value) -> Result<Vec<Vec<Cell>>, String> {
    let rows = v.as_array().ok_or("expected an array of rows")?;
    rows.iter()
        .map(|row| -> Result<Vec<Cell>, String> {
            row.as_array()
                .ok_or_else(|| "expected each row to be an array".to_string())?
                .iter()
                .map(parse_cell)
                .collect()
        })
        .collect()
}

fn parse_board(v: &Value) -> Result<Vec<Vec<Cell>>, String> {
    parse_matrix(v)
}

fn parse_rotation(v: &Value) -> Result<Rotation, String> {
    let s = v.as_str().ok_or("expected a rotation name")?;
    [Rotation::North, Rotation::East, Rotation::South, Rotation::West]
        .into_iter()
        .find(|r| r.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown rotation {s:?}"))
}

/// `null` clears the slot; an object describes a piece
fn parse_optional_piece(v: &Value) -> Result<Option<Piece>, String> {
    if v.is_null() {
        return Ok(None);
    }
    let obj = v.as_object().ok_or("expected a piece object or null")?;

    let shape_rows = parse_matrix(obj.get("shape").ok_or("piece is missing its shape")?)?;
    let shape = Shape::from_rows(&shape_rows).map_err(|e| e.to_string())?;
    let x = parse_i8(obj.get("x").unwrap_or(&Value::from(0)))?;
    let y = parse_i8(obj.get("y").unwrap_or(&Value::from(0)))?;
    let color = parse_cell(obj.get("color").ok_or("piece is missing its color")?)?;

    let kind = match obj.get("kind") {
        None | Some(Value::Null) => None,
        Some(k) => {
            let s = k.as_str().ok_or("expected a piece kind name")?;
            Some(PieceKind::from_str(s).ok_or_else(|| format!("unknown piece kind {s:?}"))?)
        }
    };
    let rotation = match obj.get("rotation") {
        None | Some(Value::Null) => Rotation::North,
        Some(r) => parse_rotation(r)?,
    };

    Ok(Some(Piece {
        kind,
        color,
        shape,
        rotation,
        x,
        y,
    }))
}

//! Pieces module - shape catalog, rotation strategies and wall kicks
//!
//! Every piece carries its shape as a small 0/1 matrix. The seven catalog
//! kinds rotate through an explicit 4-state table (SRS orientations) so kick
//! behaviour matches the guideline; pieces without a kind fall back to a
//! generic 90° matrix rotation. Both strategies sit behind [`Rotator`].
//!
//! Coordinates are y-down: `y = 0` is the top row and kicks with a negative
//! `dy` move the piece up.

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::types::{Cell, PieceKind, Rotation, EMPTY_CELL, MAX_SHAPE_DIM};

/// Offset of a single mino (or a kick) relative to the piece origin
pub type MinoOffset = (i8, i8);

const MAX_SHAPE_CELLS: usize = (MAX_SHAPE_DIM as usize) * (MAX_SHAPE_DIM as usize);

/// Why a shape matrix was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape has no rows")]
    Empty,
    #[error("shape rows have unequal lengths")]
    Ragged,
    #[error("shape is {width}x{height}, larger than {max}x{max}")]
    TooLarge { width: usize, height: usize, max: u8 },
    #[error("shape cell ({x}, {y}) holds {value}, expected 0 or 1")]
    NotBinary { x: usize, y: usize, value: u8 },
    #[error("shape has no filled cells")]
    NoFilledCells,
}

/// A piece shape: a row-major 0/1 matrix of at most 4x4 cells
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    width: u8,
    height: u8,
    cells: ArrayVec<u8, MAX_SHAPE_CELLS>,
}

impl Shape {
    /// Build a shape from matrix rows, validating size and contents
    ///
    /// ```
    /// use floodline_core::Shape;
    ///
    /// let s = Shape::from_rows(&[[1u8, 1, 0], [0, 1, 1]]).unwrap();
    /// assert_eq!((s.width(), s.height()), (3, 2));
    /// assert_eq!(s.filled_count(), 4);
    /// ```
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, ShapeError> {
        let height = rows.len();
        if height == 0 {
            return Err(ShapeError::Empty);
        }
        let width = rows[0].as_ref().len();
        if width == 0 {
            return Err(ShapeError::Empty);
        }
        if rows.iter().any(|r| r.as_ref().len() != width) {
            return Err(ShapeError::Ragged);
        }
        let max = MAX_SHAPE_DIM as usize;
        if width > max || height > max {
            return Err(ShapeError::TooLarge {
                width,
                height,
                max: MAX_SHAPE_DIM,
            });
        }

        let mut cells = ArrayVec::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.as_ref().iter().enumerate() {
                if value > 1 {
                    return Err(ShapeError::NotBinary { x, y, value });
                }
                cells.push(value);
            }
        }

        let shape = Self {
            width: width as u8,
            height: height as u8,
            cells,
        };
        if shape.filled_count() == 0 {
            return Err(ShapeError::NoFilledCells);
        }
        Ok(shape)
    }

    /// Build a square shape of side `size` from catalog mino offsets
    fn from_minos(size: u8, minos: &[MinoOffset]) -> Self {
        let mut cells: ArrayVec<u8, MAX_SHAPE_CELLS> = ArrayVec::new();
        for _ in 0..(size as usize * size as usize) {
            cells.push(0);
        }
        for &(x, y) in minos {
            cells[y as usize * size as usize + x as usize] = 1;
        }
        Self {
            width: size,
            height: size,
            cells,
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Whether cell (x, y) of the matrix is filled
    pub fn is_filled(&self, x: u8, y: u8) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize] != 0
    }

    /// Offsets of every filled cell, row by row
    pub fn minos(&self) -> impl Iterator<Item = MinoOffset> + '_ {
        let w = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != 0)
            .map(move |(i, _)| ((i % w) as i8, (i / w) as i8))
    }

    pub fn filled_count(&self) -> u32 {
        self.cells.iter().filter(|&&c| c != 0).count() as u32
    }

    /// Rotate 90° clockwise: `new[col][rows-1-row] = old[row][col]`
    pub fn rotated_cw(&self) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut cells: ArrayVec<u8, MAX_SHAPE_CELLS> = ArrayVec::new();
        for _ in 0..(w * h) {
            cells.push(0);
        }
        // New matrix is h wide and w tall.
        for row in 0..h {
            for col in 0..w {
                let new_row = col;
                let new_col = h - 1 - row;
                cells[new_row * h + new_col] = self.cells[row * w + col];
            }
        }
        Self {
            width: self.height,
            height: self.width,
            cells,
        }
    }

    /// Rotate 90° counter-clockwise: `new[cols-1-col][row] = old[row][col]`
    pub fn rotated_ccw(&self) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut cells: ArrayVec<u8, MAX_SHAPE_CELLS> = ArrayVec::new();
        for _ in 0..(w * h) {
            cells.push(0);
        }
        for row in 0..h {
            for col in 0..w {
                let new_row = w - 1 - col;
                let new_col = row;
                cells[new_row * h + new_col] = self.cells[row * w + col];
            }
        }
        Self {
            width: self.height,
            height: self.width,
            cells,
        }
    }

    /// Matrix rows, for display and tests
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width as usize)
            .map(|r| r.to_vec())
            .collect()
    }
}

// Catalog orientations, indexed by `Rotation::index()`.

const I_STATES: [[MinoOffset; 4]; 4] = [
    [(0, 1), (1, 1), (2, 1), (3, 1)],
    [(2, 0), (2, 1), (2, 2), (2, 3)],
    [(0, 2), (1, 2), (2, 2), (3, 2)],
    [(1, 0), (1, 1), (1, 2), (1, 3)],
];

const O_STATES: [[MinoOffset; 4]; 4] = [[(0, 0), (1, 0), (0, 1), (1, 1)]; 4];

const T_STATES: [[MinoOffset; 4]; 4] = [
    [(1, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (1, 2)],
    [(1, 0), (0, 1), (1, 1), (1, 2)],
];

const S_STATES: [[MinoOffset; 4]; 4] = [
    [(1, 0), (2, 0), (0, 1), (1, 1)],
    [(1, 0), (1, 1), (2, 1), (2, 2)],
    [(1, 1), (2, 1), (0, 2), (1, 2)],
    [(0, 0), (0, 1), (1, 1), (1, 2)],
];

const Z_STATES: [[MinoOffset; 4]; 4] = [
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(2, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (1, 2), (2, 2)],
    [(1, 0), (0, 1), (1, 1), (0, 2)],
];

const J_STATES: [[MinoOffset; 4]; 4] = [
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (2, 2)],
    [(1, 0), (1, 1), (0, 2), (1, 2)],
];

const L_STATES: [[MinoOffset; 4]; 4] = [
    [(2, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (1, 2), (2, 2)],
    [(0, 1), (1, 1), (2, 1), (0, 2)],
    [(0, 0), (1, 0), (1, 1), (1, 2)],
];

/// Side length of the bounding box a catalog kind rotates in
pub fn box_size(kind: PieceKind) -> u8 {
    match kind {
        PieceKind::I => 4,
        PieceKind::O => 2,
        _ => 3,
    }
}

/// Catalog shape for a kind in a given rotation state
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> Shape {
    let states = match kind {
        PieceKind::I => &I_STATES,
        PieceKind::O => &O_STATES,
        PieceKind::T => &T_STATES,
        PieceKind::S => &S_STATES,
        PieceKind::Z => &Z_STATES,
        PieceKind::J => &J_STATES,
        PieceKind::L => &L_STATES,
    };
    Shape::from_minos(box_size(kind), &states[rotation.index()])
}

/// Kick offsets tried in order for one rotation transition
pub type KickList = [MinoOffset; 5];

/// Kick tables indexed by [`kick_index`]
pub type KickTable = [KickList; 8];

/// J, L, S, T, Z kicks (y-down)
const JLSTZ_KICKS: KickTable = [
    // N->E
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    // N->W
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    // E->N
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    // E->S
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    // S->E
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    // S->W
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    // W->S
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    // W->N
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
];

/// I piece kicks, two columns wide (y-down)
const I_KICKS: KickTable = [
    // N->E
    [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
    // N->W
    [(0, 0), (-1, 0), (2, 0), (-1, -2), (2, 1)],
    // E->N
    [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
    // E->S
    [(0, 0), (-1, 0), (2, 0), (-1, -2), (2, 1)],
    // S->E
    [(0, 0), (1, 0), (-2, 0), (1, 2), (-2, -1)],
    // S->W
    [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
    // W->S
    [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
    // W->N
    [(0, 0), (1, 0), (-2, 0), (1, 2), (-2, -1)],
];

/// O never needs to move when it rotates
const O_KICKS: [MinoOffset; 1] = [(0, 0)];

/// Fallback for matrix-rotated pieces
const MATRIX_KICKS: [MinoOffset; 4] = [(0, 0), (-1, 0), (1, 0), (0, -1)];

/// Index of a rotation transition in a [`KickTable`]
fn kick_index(from: Rotation, clockwise: bool) -> usize {
    match (from, clockwise) {
        (Rotation::North, true) => 0,
        (Rotation::North, false) => 1,
        (Rotation::East, false) => 2,
        (Rotation::East, true) => 3,
        (Rotation::South, false) => 4,
        (Rotation::South, true) => 5,
        (Rotation::West, false) => 6,
        (Rotation::West, true) => 7,
    }
}

/// Rotation strategy, chosen from the piece identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotator {
    /// Explicit 4-state table for a catalog kind
    Table(PieceKind),
    /// Generic 90° matrix rotation
    Matrix,
}

impl Rotator {
    pub fn for_piece(piece: &Piece) -> Self {
        match piece.kind {
            Some(kind) => Rotator::Table(kind),
            None => Rotator::Matrix,
        }
    }

    /// Shape and rotation state after one quarter turn
    pub fn rotated(&self, piece: &Piece, clockwise: bool) -> (Shape, Rotation) {
        let rotation = if clockwise {
            piece.rotation.rotate_cw()
        } else {
            piece.rotation.rotate_ccw()
        };
        let shape = match self {
            Rotator::Table(kind) => get_shape(*kind, rotation),
            Rotator::Matrix if clockwise => piece.shape.rotated_cw(),
            Rotator::Matrix => piece.shape.rotated_ccw(),
        };
        (shape, rotation)
    }

    /// Kick offsets to try, in order, for a turn starting at `from`
    pub fn kicks(&self, from: Rotation, clockwise: bool) -> &'static [MinoOffset] {
        match self {
            Rotator::Table(PieceKind::O) => &O_KICKS,
            Rotator::Table(PieceKind::I) => &I_KICKS[kick_index(from, clockwise)],
            Rotator::Table(_) => &JLSTZ_KICKS[kick_index(from, clockwise)],
            Rotator::Matrix => &MATRIX_KICKS,
        }
    }
}

/// A falling piece
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    /// Catalog kind, or `None` for a custom matrix piece
    pub kind: Option<PieceKind>,
    /// Color id written into the board on placement
    pub color: Cell,
    pub shape: Shape,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl Piece {
    /// Catalog piece in its spawn orientation at the origin
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind: Some(kind),
            color: kind.color_id(),
            shape: get_shape(kind, Rotation::North),
            rotation: Rotation::North,
            x: 0,
            y: 0,
        }
    }

    /// Untyped piece; rotates through the matrix fallback
    pub fn custom(shape: Shape, color: Cell) -> Self {
        Self {
            kind: None,
            color,
            shape,
            rotation: Rotation::North,
            x: 0,
            y: 0,
        }
    }

    /// Catalog piece horizontally centered on the top row of a board
    pub fn spawned(kind: PieceKind, board_width: u8) -> Self {
        let piece = Self::new(kind);
        let x = spawn_x(board_width, piece.shape.width());
        piece.at(x, 0)
    }

    pub fn at(mut self, x: i8, y: i8) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn translated(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }

    /// Absolute board coordinates of every filled cell
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        self.shape
            .minos()
            .map(move |(dx, dy)| (self.x + dx, self.y + dy))
    }

    /// Structural equality used for change detection: position, color, shape
    pub fn same_placement(&self, other: &Piece) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.color == other.color
            && self.shape == other.shape
    }

    /// Color set, at least one filled cell, and catalog pieces match their table
    pub fn is_well_formed(&self) -> bool {
        if self.color == EMPTY_CELL || self.shape.filled_count() == 0 {
            return false;
        }
        match self.kind {
            Some(kind) => {
                self.color == kind.color_id() && self.shape == get_shape(kind, self.rotation)
            }
            None => true,
        }
    }
}

/// Column that centers a shape of `shape_width` on a board of `board_width`
pub fn spawn_x(board_width: u8, shape_width: u8) -> i8 {
    (board_width.saturating_sub(shape_width) / 2) as i8
}

/// Try to rotate a piece with wall kicks
///
/// `is_free` reports whether an absolute cell can be occupied. Returns the
/// rotated piece and the kick that resolved it, or `None` when every kick
/// collides (the caller keeps the original piece).
pub fn try_rotate(
    piece: &Piece,
    clockwise: bool,
    is_free: impl Fn(i8, i8) -> bool,
) -> Option<(Piece, MinoOffset)> {
    let rotator = Rotator::for_piece(piece);
    let (shape, rotation) = rotator.rotated(piece, clockwise);

    for &(dx, dy) in rotator.kicks(piece.rotation, clockwise) {
        let x = piece.x + dx;
        let y = piece.y + dy;
        if shape.minos().all(|(mx, my)| is_free(x + mx, y + my)) {
            let rotated = Piece {
                shape: shape.clone(),
                rotation,
                x,
                y,
                ..piece.clone()
            };
            return Some((rotated, (dx, dy)));
        }
    }

    None
}

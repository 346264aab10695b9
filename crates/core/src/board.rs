//! Board module - manages the game grid
//!
//! The board is a fixed-size grid where each cell is empty (0) or holds the
//! color id of a placed piece. Cells live in a flat row-major vector for cache
//! locality; dimensions are fixed at construction and never change afterwards.
//! Coordinates: (x, y) with x left to right and y top to bottom.
//!
//! Out-of-bounds coordinates count as occupied, so the board edges act as
//! collision walls.

use thiserror::Error;

use crate::pieces::Piece;
use crate::types::{Cell, BOARD_HEIGHT, BOARD_WIDTH, EMPTY_CELL};

/// Why a board could not be built from rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board has no rows or no columns")]
    Empty,
    #[error("row {row} has {len} cells, expected {expected}")]
    Ragged { row: usize, len: usize, expected: usize },
    #[error("board {width}x{height} exceeds 127 cells per side")]
    TooLarge { width: usize, height: usize },
}

/// Result of clearing full rows from a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClear {
    /// Board after the clear (same dimensions)
    pub board: Board,
    /// Pre-clear indices of the removed rows, top to bottom
    pub rows: Vec<usize>,
}

impl LineClear {
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// The game board
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    width: u8,
    height: u8,
    /// Flat array of cells, row-major order (y * width + x)
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board; sides are clamped to 1..=127
    pub fn new(width: u8, height: u8) -> Self {
        let width = width.clamp(1, i8::MAX as u8);
        let height = height.clamp(1, i8::MAX as u8);
        Self {
            width,
            height,
            cells: vec![EMPTY_CELL; width as usize * height as usize],
        }
    }

    /// Empty 10x20 board
    pub fn standard() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }

    /// Build a board from rows (top row first), rejecting ragged input
    pub fn from_rows<R: AsRef<[Cell]>>(rows: &[R]) -> Result<Self, BoardError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(BoardError::Empty);
        }
        if width > i8::MAX as usize || height > i8::MAX as usize {
            return Err(BoardError::TooLarge { width, height });
        }

        let mut cells = Vec::with_capacity(width * height);
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != width {
                return Err(BoardError::Ragged {
                    row,
                    len: r.len(),
                    expected: width,
                });
            }
            cells.extend_from_slice(r);
        }

        Ok(Self {
            width: width as u8,
            height: height as u8,
            cells,
        })
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i8, y: i8) -> Option<usize> {
        if self.is_out_of_bounds(x, y) {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Get cell at position (x, y); `None` if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y); returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    pub fn is_out_of_bounds(&self, x: i8, y: i8) -> bool {
        x < 0 || x >= self.width as i8 || y < 0 || y >= self.height as i8
    }

    /// Whether (x, y) blocks a piece: filled, or outside the grid
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        match self.get(x, y) {
            Some(cell) => cell != EMPTY_CELL,
            None => true,
        }
    }

    /// Inverse of [`Board::is_occupied`]
    pub fn is_free(&self, x: i8, y: i8) -> bool {
        !self.is_occupied(x, y)
    }

    /// Whether the piece, shifted by (dx, dy), overlaps anything
    pub fn collides(&self, piece: &Piece, dx: i8, dy: i8) -> bool {
        piece
            .cells()
            .any(|(x, y)| self.is_occupied(x + dx, y + dy))
    }

    /// Rows the piece can fall before it would collide
    pub fn drop_distance(&self, piece: &Piece) -> u32 {
        let mut distance: i8 = 0;
        while distance < self.height as i8 && !self.collides(piece, 0, distance + 1) {
            distance += 1;
        }
        distance as u32
    }

    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        if y >= self.height as usize {
            return None;
        }
        let start = y * self.width as usize;
        Some(&self.cells[start..start + self.width as usize])
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y)
            .map(|r| r.iter().all(|&c| c != EMPTY_CELL))
            .unwrap_or(false)
    }

    pub fn is_row_empty(&self, y: usize) -> bool {
        self.row(y)
            .map(|r| r.iter().all(|&c| c == EMPTY_CELL))
            .unwrap_or(false)
    }

    /// Clear all full rows in place
    ///
    /// Returns the cleared pre-clear row indices, top to bottom. Rows above
    /// each cleared row shift down; fresh empty rows fill in at the top.
    pub fn clear_full_rows(&mut self) -> Vec<usize> {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut cleared = Vec::new();
        let mut write_y = height;

        // Scan from bottom to top, compacting surviving rows downward.
        for read_y in (0..height).rev() {
            if self.is_row_full(read_y) {
                cleared.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src = read_y * width;
                    self.cells.copy_within(src..src + width, write_y * width);
                }
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = EMPTY_CELL;
        }

        cleared.reverse();
        cleared
    }

    /// Non-mutating line clear: the new grid plus the removed rows
    pub fn clear_lines(&self) -> LineClear {
        let mut board = self.clone();
        let rows = board.clear_full_rows();
        LineClear { board, rows }
    }

    /// Write a piece's filled cells into the board
    ///
    /// Cells that fall outside the grid (notably above the top row) are
    /// dropped rather than written. Returns how many cells were written.
    pub fn lock_piece(&mut self, piece: &Piece) -> u32 {
        let mut written = 0;
        for (x, y) in piece.cells() {
            if self.set(x, y, piece.color) {
                written += 1;
            }
        }
        written
    }

    /// Copy of this board with the piece merged in
    pub fn with_piece(&self, piece: &Piece) -> Board {
        let mut board = self.clone();
        board.lock_piece(piece);
        board
    }

    /// Number of non-empty cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY_CELL).count()
    }

    /// Height of each column's highest filled cell (0 for empty columns)
    pub fn column_heights(&self) -> Vec<u32> {
        (0..self.width as i8)
            .map(|x| {
                (0..self.height as i8)
                    .find(|&y| self.is_occupied(x, y))
                    .map(|y| (self.height as i8 - y) as u32)
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether the cell vector matches the declared dimensions
    pub fn is_rectangular(&self) -> bool {
        self.width > 0 && self.height > 0 && self.cells.len() == self.width as usize * self.height as usize
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_CELL);
    }

    /// Convert to rows for display/tests
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        self.cells
            .chunks(self.width as usize)
            .map(|r| r.to_vec())
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

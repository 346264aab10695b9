//! Board tests through the facade

use floodline::core::{controller, Board, BoardError, Piece};
use floodline::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH, EMPTY_CELL};

fn filled_row(board: &mut Board, y: i8) {
    for x in 0..board.width() as i8 {
        board.set(x, y, 8);
    }
}

#[test]
fn test_board_new_empty() {
    let board = Board::standard();
    assert_eq!(board.width(), BOARD_WIDTH);
    assert_eq!(board.height(), BOARD_HEIGHT);

    for y in 0..BOARD_HEIGHT as i8 {
        for x in 0..BOARD_WIDTH as i8 {
            assert!(board.is_free(x, y), "Cell ({}, {}) should be free", x, y);
            assert_eq!(board.get(x, y), Some(EMPTY_CELL));
        }
    }
}

#[test]
fn test_board_edges_are_walls() {
    let board = Board::standard();

    assert_eq!(board.get(-1, 0), None);
    assert_eq!(board.get(0, BOARD_HEIGHT as i8), None);
    assert!(board.is_occupied(-1, 5));
    assert!(board.is_occupied(BOARD_WIDTH as i8, 5));
    assert!(board.is_occupied(3, BOARD_HEIGHT as i8));
}

#[test]
fn test_board_set_and_get() {
    let mut board = Board::standard();

    assert!(board.set(5, 10, PieceKind::T.color_id()));
    assert_eq!(board.get(5, 10), Some(PieceKind::T.color_id()));
    assert!(!board.is_free(5, 10));

    assert!(board.set(5, 10, EMPTY_CELL));
    assert!(board.is_free(5, 10));

    assert!(!board.set(-1, 0, 1));
    assert!(!board.set(0, BOARD_HEIGHT as i8, 1));
}

#[test]
fn test_custom_dimensions() {
    let board = Board::new(6, 12);
    assert_eq!((board.width(), board.height()), (6, 12));
    assert_eq!(board.cells().len(), 72);
    assert!(board.is_rectangular());
}

#[test]
fn test_from_rows_rejects_ragged_input() {
    let err = Board::from_rows(&[vec![0u8, 0, 0], vec![0u8, 0]]).unwrap_err();
    assert_eq!(
        err,
        BoardError::Ragged {
            row: 1,
            len: 2,
            expected: 3
        }
    );
    let empty: [Vec<u8>; 0] = [];
    assert_eq!(Board::from_rows(&empty).unwrap_err(), BoardError::Empty);
}

#[test]
fn test_clear_single_bottom_row() {
    let mut board = Board::standard();
    filled_row(&mut board, 19);
    board.set(2, 18, 3);

    let cleared = board.clear_full_rows();
    assert_eq!(cleared, vec![19]);
    // The block above shifted down into the bottom row.
    assert_eq!(board.get(2, 19), Some(3));
    assert!(board.is_row_empty(0));
    assert_eq!(board.occupied_count(), 1);
}

#[test]
fn test_clear_non_adjacent_rows_keeps_order() {
    let mut board = Board::standard();
    filled_row(&mut board, 19);
    board.set(0, 18, 1);
    filled_row(&mut board, 17);
    board.set(1, 16, 2);

    let result = board.clear_lines();
    assert_eq!(result.rows, vec![17, 19]);
    assert_eq!(result.count(), 2);
    assert_eq!(result.board.get(0, 19), Some(1));
    assert_eq!(result.board.get(1, 18), Some(2));
    assert_eq!(result.board.height(), BOARD_HEIGHT);

    // The source board is untouched.
    assert!(board.is_row_full(19));
}

#[test]
fn test_o_piece_then_bottom_row_scenario() {
    let mut board = Board::standard();

    // O at column 4 lands on the floor; nothing clears.
    let o = Piece::new(PieceKind::O).at(4, 0);
    let (landed, _) = controller::hard_drop(&board, &o);
    board.lock_piece(&landed);
    let result = board.clear_lines();
    assert_eq!(result.count(), 0);
    assert_eq!(board.occupied_count(), 4);

    // Four more Os fill the two bottom rows everywhere.
    for x in [0, 2, 6, 8] {
        let o = Piece::new(PieceKind::O).at(x, 0);
        let (landed, _) = controller::hard_drop(&board, &o);
        board.lock_piece(&landed);
    }
    assert!(board.is_row_full(19));

    // Break row 18 so exactly the bottom row clears.
    board.set(9, 18, EMPTY_CELL);
    let result = board.clear_lines();
    assert_eq!(result.count(), 1);
    assert_eq!(result.rows, vec![19]);
    assert!(result.board.is_row_empty(0));
    assert!(!result.board.is_row_full(19));
    assert_eq!(result.board.get(9, 19), Some(EMPTY_CELL));
    assert_eq!(result.board.occupied_count(), 9);
}

#[test]
fn test_collision_and_drop_distance() {
    let mut board = Board::standard();
    let piece = Piece::spawned(PieceKind::I, BOARD_WIDTH);

    // Horizontal I in its north state sits on row 1 of its box.
    assert_eq!(board.drop_distance(&piece), 18);
    filled_row(&mut board, 10);
    assert_eq!(board.drop_distance(&piece), 8);
    assert!(board.collides(&piece, 0, 9));
    assert!(!board.collides(&piece, 0, 8));
}

#[test]
fn test_column_heights() {
    let mut board = Board::new(3, 5);
    board.set(0, 4, 1);
    board.set(2, 1, 1);
    assert_eq!(board.column_heights(), vec![1, 0, 4]);
}

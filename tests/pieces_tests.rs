//! Piece catalog and rotation tests

use floodline::core::pieces::{box_size, spawn_x, try_rotate, Rotator};
use floodline::core::{get_shape, Board, Piece, Shape, ShapeError};
use floodline::types::{PieceKind, Rotation, BOARD_WIDTH};

const ROTATIONS: [Rotation; 4] = [
    Rotation::North,
    Rotation::East,
    Rotation::South,
    Rotation::West,
];

// ============== Shape Tests ==============

#[test]
fn test_i_piece_shapes() {
    let north = get_shape(PieceKind::I, Rotation::North);
    assert_eq!(north.minos().collect::<Vec<_>>(), [(0, 1), (1, 1), (2, 1), (3, 1)]);

    let east = get_shape(PieceKind::I, Rotation::East);
    assert_eq!(east.minos().collect::<Vec<_>>(), [(2, 0), (2, 1), (2, 2), (2, 3)]);
}

#[test]
fn test_o_piece_is_rotation_invariant() {
    let north = get_shape(PieceKind::O, Rotation::North);
    assert_eq!(north.rows(), vec![vec![1u8, 1], vec![1u8, 1]]);
    for rot in ROTATIONS {
        assert_eq!(get_shape(PieceKind::O, rot), north);
    }
}

#[test]
fn test_t_piece_north() {
    let t = get_shape(PieceKind::T, Rotation::North);
    assert_eq!(
        t.rows(),
        vec![vec![0u8, 1, 0], vec![1u8, 1, 1], vec![0u8, 0, 0]]
    );
}

#[test]
fn test_box_sizes() {
    assert_eq!(box_size(PieceKind::I), 4);
    assert_eq!(box_size(PieceKind::O), 2);
    for kind in [PieceKind::T, PieceKind::S, PieceKind::Z, PieceKind::J, PieceKind::L] {
        assert_eq!(box_size(kind), 3);
    }
}

#[test]
fn test_shape_validation() {
    assert_eq!(
        Shape::from_rows(&[vec![1u8, 0], vec![1u8]]).unwrap_err(),
        ShapeError::Ragged
    );
    assert_eq!(
        Shape::from_rows(&[[0u8, 0], [0, 0]]).unwrap_err(),
        ShapeError::NoFilledCells
    );
    assert!(matches!(
        Shape::from_rows(&[[1u8, 2]]).unwrap_err(),
        ShapeError::NotBinary { x: 1, y: 0, value: 2 }
    ));
    assert!(matches!(
        Shape::from_rows(&[[1u8; 5]]).unwrap_err(),
        ShapeError::TooLarge { width: 5, .. }
    ));
}

// ============== Rotation Tests ==============

#[test]
fn test_four_clockwise_turns_restore_every_catalog_piece() {
    let board = Board::standard();
    for kind in PieceKind::ALL {
        let start = Piece::new(kind).at(3, 5);
        let mut piece = start.clone();
        for _ in 0..4 {
            let (next, _) = try_rotate(&piece, true, |x, y| board.is_free(x, y)).unwrap();
            piece = next;
        }
        assert_eq!(piece.shape, start.shape, "{:?}", kind);
        assert_eq!(piece.rotation, Rotation::North);
    }
}

#[test]
fn test_four_matrix_turns_restore_a_custom_piece() {
    let shape = Shape::from_rows(&[[1u8, 1, 1], [0, 0, 1]]).unwrap();
    let mut s = shape.clone();
    for _ in 0..4 {
        s = s.rotated_cw();
    }
    assert_eq!(s, shape);
}

#[test]
fn test_counter_clockwise_undoes_clockwise() {
    let board = Board::standard();
    for kind in PieceKind::ALL {
        let start = Piece::new(kind).at(3, 5);
        let (cw, _) = try_rotate(&start, true, |x, y| board.is_free(x, y)).unwrap();
        let (back, _) = try_rotate(&cw, false, |x, y| board.is_free(x, y)).unwrap();
        assert_eq!(back.shape, start.shape, "{:?}", kind);
        assert_eq!(back.rotation, start.rotation);
    }
}

#[test]
fn test_custom_piece_uses_matrix_rotator() {
    let shape = Shape::from_rows(&[[1u8, 1, 1], [0, 1, 0]]).unwrap();
    let piece = Piece::custom(shape.clone(), 9).at(3, 3);
    assert_eq!(Rotator::for_piece(&piece), Rotator::Matrix);

    let (rotated, kick) = try_rotate(&piece, true, |_, _| true).unwrap();
    assert_eq!(kick, (0, 0));
    assert_eq!(rotated.shape, shape.rotated_cw());
    assert_eq!(rotated.color, 9);
}

#[test]
fn test_wall_kick_off_the_left_wall() {
    let board = Board::standard();
    // Vertical I in the leftmost column; turning flat needs a kick right.
    let east = Piece {
        shape: get_shape(PieceKind::I, Rotation::East),
        rotation: Rotation::East,
        ..Piece::new(PieceKind::I)
    }
    .at(-2, 5);
    assert!(!board.collides(&east, 0, 0));

    let (rotated, kick) = try_rotate(&east, false, |x, y| board.is_free(x, y)).unwrap();
    assert_eq!(kick, (2, 0));
    assert!(!board.collides(&rotated, 0, 0));
    assert_eq!(rotated.rotation, Rotation::North);
}

#[test]
fn test_rotation_fails_when_boxed_in() {
    let piece = Piece::new(PieceKind::T).at(3, 5);
    assert!(try_rotate(&piece, true, |_, _| false).is_none());
}

// ============== Spawn Tests ==============

#[test]
fn test_spawn_is_centered() {
    assert_eq!(spawn_x(BOARD_WIDTH, 4), 3);
    assert_eq!(spawn_x(BOARD_WIDTH, 2), 4);
    assert_eq!(spawn_x(BOARD_WIDTH, 3), 3);

    let o = Piece::spawned(PieceKind::O, BOARD_WIDTH);
    assert_eq!((o.x, o.y), (4, 0));
}

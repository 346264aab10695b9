use criterion::{black_box, criterion_group, criterion_main, Criterion};
use floodline::core::{Board, GameConfig, GameSession};
use floodline::engine::{best_placement, Simulation, SimulationConfig};
use floodline::progress::MemoryStore;

fn bench_session_tick(c: &mut Criterion) {
    let mut session = GameSession::new(GameConfig::default(), 12345);
    session.start();

    c.bench_function("session_tick_16ms", |b| {
        b.iter(|| {
            session.tick(black_box(16));
        })
    });
}

fn bench_simulation_tick(c: &mut Criterion) {
    let mut sim = Simulation::new(SimulationConfig::default(), MemoryStore::new());
    let _ = sim.set_level(1);

    c.bench_function("simulation_tick_16ms", |b| {
        b.iter(|| {
            if sim.outcome().is_some() {
                let _ = sim.restart();
            }
            sim.tick(black_box(16));
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::standard();
            // Fill bottom 4 rows
            for y in 16..20 {
                for x in 0..10 {
                    board.set(x, y, 1);
                }
            }
            board.clear_full_rows();
        })
    });
}

fn bench_placement_search(c: &mut Criterion) {
    let mut session = GameSession::new(GameConfig::default(), 12345);
    session.start();
    for x in 0..9 {
        session.board_mut().set(x, 19, 1);
    }
    let board = session.board().clone();
    let piece = session.current_piece().cloned();

    c.bench_function("best_placement", |b| {
        b.iter(|| {
            if let Some(p) = &piece {
                black_box(best_placement(&board, p));
            }
        })
    });
}

fn bench_try_rotate(c: &mut Criterion) {
    let mut session = GameSession::new(GameConfig::default(), 12345);
    session.start();

    c.bench_function("try_rotate", |b| {
        b.iter(|| {
            session.rotate_piece(true);
        })
    });
}

criterion_group!(
    benches,
    bench_session_tick,
    bench_simulation_tick,
    bench_line_clear,
    bench_placement_search,
    bench_try_rotate
);
criterion_main!(benches);

//! Leaderboard read benchmarks
//!
//! Compares a read served from a fresh snapshot with a full recompute
//! (top-100 query, username join, ranking) at several store sizes.
//!
//! Run with:
//! ```bash
//! cargo bench --bench leaderboard_bench
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::sync::Arc;
use tinca_core::cache::MemoryCache;
use tinca_core::models::{NewScore, NewUser};
use tinca_core::{LeaderboardCache, ManualClock, ScoreStore, SqliteStore};

fn seeded_store(rows: i64) -> Arc<SqliteStore> {
    let store = SqliteStore::in_memory().unwrap();
    let users = (rows / 4).max(1);

    for u in 0..users {
        store
            .insert_user(&NewUser {
                username: format!("player{u}"),
                password_hash: "x".to_string(),
                created_at: 0,
            })
            .unwrap();
    }

    for i in 0..rows {
        store
            .insert_score(&NewScore {
                user_id: 1 + i % users,
                game_id: format!("game-{i}"),
                score: (i * 7919) % 3000,
                timestamp: i,
                date: "2024-06-01".to_string(),
                country: "CN".to_string(),
                created_at: i,
            })
            .unwrap();
    }

    Arc::new(store)
}

fn bench_cached_read(c: &mut Criterion) {
    let store = seeded_store(10_000);
    let board = LeaderboardCache::new(
        store,
        Arc::new(MemoryCache::new()),
        Arc::new(ManualClock::new(0)),
    );
    board.get_leaderboard().unwrap();

    c.bench_function("leaderboard_cached_read", |b| {
        b.iter(|| board.get_leaderboard().unwrap())
    });
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaderboard_recompute");

    for rows in [1_000i64, 10_000, 50_000].iter() {
        let store = seeded_store(*rows);
        let board = LeaderboardCache::new(
            store,
            Arc::new(MemoryCache::new()),
            Arc::new(ManualClock::new(0)),
        );

        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, _| {
            b.iter(|| board.fetch_and_rank().unwrap())
        });
    }

    group.finish();
}

fn bench_floor_lookup(c: &mut Criterion) {
    let store = seeded_store(10_000);
    let board = LeaderboardCache::new(
        store,
        Arc::new(MemoryCache::new()),
        Arc::new(ManualClock::new(0)),
    );

    // No snapshot: floor comes from the store
    c.bench_function("floor_from_store", |b| b.iter(|| board.current_floor()));

    board.get_leaderboard().unwrap();
    c.bench_function("floor_from_snapshot", |b| b.iter(|| board.current_floor()));
}

criterion_group!(benches, bench_cached_read, bench_recompute, bench_floor_lookup);
criterion_main!(benches);

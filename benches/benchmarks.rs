// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Hot paths of the kernel:
//   1. Pattern mining — one rebuild pass over a full event log
//   2. Prediction — n-gram lookup over a populated pattern table
//   3. Similarity fallback — edit-distance scan of the event log

use std::collections::HashMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flowcast::core::types::{Event, PatternKey};
use flowcast::memory::{MemoryStorage, SqliteStorage, Storage};
use flowcast::patterns::miner::count_ngrams;
use flowcast::patterns::{PatternMiner, Predictor, SimilarityMatcher};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A log of `n` events cycling through a handful of routes, so n-grams repeat.
fn build_log(n: usize) -> Vec<Event> {
    let routes = [
        "GET:https://app.example.com/inbox",
        "GET:https://app.example.com/messages/42",
        "POST:https://app.example.com/messages/42/archive",
        "UI:click:#next",
        "GET:https://app.example.com/settings",
    ];
    (0..n)
        .map(|i| {
            // Ids repeat per route slot so the table stays small and realistic
            let slot = i % routes.len();
            Event::new(format!("e{}", (i / 3) % 40 * 10 + slot), routes[slot], i as i64 * 1_000)
        })
        .collect()
}

fn pattern_table(log: &[Event]) -> HashMap<PatternKey, u64> {
    count_ngrams(log, 5)
}

// ─── Benchmark: Pattern mining ──────────────────────────────────────────────

fn bench_rebuild(c: &mut Criterion) {
    let log = build_log(1_000);
    let mut group = c.benchmark_group("rebuild");

    group.bench_function("count_ngrams_1000", |b| {
        b.iter(|| count_ngrams(black_box(&log), 5))
    });

    group.bench_function("rebuild_memory_1000", |b| {
        b.iter(|| {
            let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(1_000));
            PatternMiner::new(storage, 5)
                .rebuild(black_box(&log))
                .expect("rebuild")
        })
    });

    group.bench_function("rebuild_sqlite_1000", |b| {
        b.iter(|| {
            let storage: Arc<dyn Storage> =
                Arc::new(SqliteStorage::in_memory("bench", 1_000).expect("open store"));
            PatternMiner::new(storage, 5)
                .rebuild(black_box(&log))
                .expect("rebuild")
        })
    });

    group.finish();
}

// ─── Benchmark: Prediction ──────────────────────────────────────────────────

fn bench_predict(c: &mut Criterion) {
    let log = build_log(1_000);
    let table = pattern_table(&log);
    let window: Vec<Event> = log[log.len() - 20..].to_vec();
    let now = log.last().map_or(0, |e| e.timestamp);
    let predictor = Predictor::new(5, 0.3);

    let mut group = c.benchmark_group("predict");

    group.bench_function("pattern_table_window_20", |b| {
        b.iter(|| predictor.from_pattern_table(black_box(&window), black_box(&table), now))
    });

    let matcher = SimilarityMatcher::new(0.8);
    let last = Event::new("probe", "GET:https://app.example.com/messages/43", now);
    group.bench_function("similarity_scan_1000", |b| {
        b.iter(|| matcher.continuation(black_box(&last), black_box(&log)))
    });

    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_predict);
criterion_main!(benches);

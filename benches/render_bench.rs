//! Benchmarks for rendering and store writes
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use energy_tracker::dashboard::numeric::to_fixed;
use energy_tracker::dashboard::render::{chart_series, render_tiles};
use energy_tracker::dashboard::SnapshotReport;
use energy_tracker::store::{EventKind, MemoryStore, MemoryStoreConfig, ObservableStore, StorePath, WalSyncMode};
use serde_json::{json, Map, Value};
use tempfile::tempdir;

fn loads_snapshot() -> Value {
    json!({
        "load1": {"voltage": 229.87, "current": 0.4312, "power": 99.1, "energy": 1520.4},
        "load2": {"voltage": "230.1", "current": 1.2, "power": 276.0, "energy": 88},
        "load3": {"voltage": 231.0, "current": "n/a"},
        "load4": {}
    })
}

fn log_snapshot(days: usize) -> Value {
    let mut log = Map::new();
    for day in 0..days {
        let label = format!("2024-{:02}-{:02}", day / 28 + 1, day % 28 + 1);
        log.insert(
            label,
            json!({
                "load1": {"energy": day as f64 * 1.5},
                "load2": {"energy": day},
                "load3": {"energy": "12.5"},
                "load4": {"energy": null}
            }),
        );
    }
    Value::Object(log)
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let loads = loads_snapshot();
    group.bench_function("tiles", |b| b.iter(|| render_tiles(black_box(&loads))));

    for days in [7, 31, 365] {
        let log = log_snapshot(days);
        group.throughput(Throughput::Elements(days as u64));
        group.bench_function(format!("chart_{}", days), |b| {
            b.iter(|| chart_series(black_box(&log)))
        });
    }

    group.bench_function("to_fixed", |b| {
        b.iter(|| to_fixed(black_box(1234.56789), black_box(2)))
    });

    group.bench_function("pdf_report", |b| {
        let report = SnapshotReport::from_loads(&loads);
        b.iter(|| black_box(&report).to_pdf())
    });

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("store");

    group.bench_function("set_with_watchers", |b| {
        let store = MemoryStore::in_memory();
        let path = StorePath::parse("loads/load1/voltage").unwrap();

        // Keep a realistic set of dashboard subscriptions attached
        let _subs: Vec<_> = runtime.block_on(async {
            let mut subs = Vec::new();
            for p in ["relays", "loads", "logs/daily", "logs/weekly", "logs/monthly"] {
                subs.push(
                    store
                        .subscribe(&StorePath::parse(p).unwrap(), EventKind::Value)
                        .await
                        .unwrap(),
                );
            }
            subs
        });

        let mut voltage = 0.0;
        b.iter(|| {
            voltage += 0.1;
            runtime.block_on(store.set(&path, json!(voltage))).unwrap()
        });
    });

    group.bench_function("set_with_wal", |b| {
        let dir = tempdir().unwrap();
        let store = MemoryStore::open(MemoryStoreConfig {
            wal_path: Some(dir.path().join("bench.wal")),
            wal_sync: WalSyncMode::None,
            ..MemoryStoreConfig::default()
        })
        .unwrap();
        let path = StorePath::parse("loads/load2/power").unwrap();

        let mut power = 0.0;
        b.iter(|| {
            power += 1.0;
            runtime.block_on(store.set(&path, json!(power))).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_render, bench_store);
criterion_main!(benches);

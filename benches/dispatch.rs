//! Dispatcher throughput benchmark suite.
//!
//! Measures how fast inbound items move through the ordered dispatcher:
//! - Batch sizes: 1 000, 10 000, 100 000 items
//! - Handler cost: counter increment, JSON parse of a success frame
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::Value;
use tokio::runtime::Runtime;
use webdriver_bidi::transport::Dispatcher;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BATCH_SIZES: &[usize] = &[1_000, 10_000, 100_000];

const SUCCESS_FRAME: &str = r#"{"type":"success","id":42,"result":{"value":"benchmark"}}"#;

// ============================================================================
// Benchmark: Counter Handler
// ============================================================================

fn bench_dispatch_counter(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");

    let mut group = c.benchmark_group("dispatch_counter");

    for &size in BATCH_SIZES {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("items", size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let handled = Arc::new(AtomicUsize::new(0));
                let counter = Arc::clone(&handled);
                let dispatcher = Dispatcher::new("bench", move |item: usize| {
                    counter.fetch_add(black_box(item) & 1, Ordering::Relaxed);
                });

                dispatcher.start();
                for item in 0..size {
                    dispatcher.try_dispatch(item);
                }
                dispatcher.stop_dispatching().await;

                black_box(handled.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: JSON Handler
// ============================================================================

fn bench_dispatch_json(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");

    let mut group = c.benchmark_group("dispatch_json");

    for &size in &BATCH_SIZES[..2] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("frames", size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let dispatcher = Dispatcher::new("bench-json", |text: String| {
                    let value: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
                    black_box(value);
                });

                dispatcher.start();
                for _ in 0..size {
                    dispatcher.try_dispatch(SUCCESS_FRAME.to_string());
                }
                dispatcher.stop_dispatching().await;
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_dispatch_counter, bench_dispatch_json);
criterion_main!(benches);

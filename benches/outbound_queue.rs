//! Outbound queue benchmark suite.
//!
//! Measures the send path without a socket:
//! - Enqueue plus drain at several batch sizes
//! - Contended enqueue from several threads
//! - JSON encoding of a typical message
//!
//! Run with: cargo bench --bench outbound_queue
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::thread;

use backend_link::Message;
use backend_link::protocol::encode;
use backend_link::transport::OutboundQueue;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BATCH_SIZES: &[usize] = &[1, 16, 256];
const SENDER_THREADS: usize = 4;
const PER_THREAD: usize = 1_000;

fn sample_message() -> Message {
    match json!({
        "type": "state",
        "tick": 4_812,
        "player": {"x": 12.5, "y": -3.0, "hp": 87},
        "inputs": ["left", "jump"],
    }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

// ============================================================================
// Benchmark: Enqueue and Drain
// ============================================================================

fn bench_enqueue_drain(c: &mut Criterion) {
    let text = encode(&sample_message()).unwrap();

    let mut group = c.benchmark_group("enqueue_drain");

    for &size in BATCH_SIZES {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let queue = OutboundQueue::new();
            b.iter(|| {
                for _ in 0..size {
                    black_box(queue.enqueue(text.clone()));
                }
                black_box(queue.begin_flush());
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Contended Enqueue
// ============================================================================

fn bench_contended_enqueue(c: &mut Criterion) {
    let text = encode(&sample_message()).unwrap();

    let mut group = c.benchmark_group("contended_enqueue");
    group.throughput(Throughput::Elements((SENDER_THREADS * PER_THREAD) as u64));

    group.bench_function("threads", |b| {
        b.iter(|| {
            let queue = OutboundQueue::new();
            thread::scope(|scope| {
                for _ in 0..SENDER_THREADS {
                    scope.spawn(|| {
                        for _ in 0..PER_THREAD {
                            if queue.enqueue(text.clone()) {
                                black_box(queue.begin_flush());
                            }
                        }
                    });
                }
            });
            black_box(queue.discard());
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Encoding
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let message = sample_message();

    c.bench_function("encode_message", |b| {
        b.iter(|| black_box(encode(black_box(&message)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_enqueue_drain,
    bench_contended_enqueue,
    bench_encode
);
criterion_main!(benches);

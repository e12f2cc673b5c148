//! Benchmarks for the single-slot mailbox.

use std::hint::black_box;

use criterion::Criterion;
use keygate::{input::keys::KEY_A, mailbox::Mailbox, KeyTransition};

pub fn bench_mailbox(c: &mut Criterion) {
    let mut group = c.benchmark_group("bridge/mailbox");
    let (mut tx, mut rx) = Mailbox::new().split();

    group.bench_function("publish", |b| {
        b.iter(|| tx.publish(black_box(KeyTransition::pressed(KEY_A))))
    });

    // The common case on the audio thread: nothing new.
    group.bench_function("drain_empty", |b| b.iter(|| black_box(rx.drain())));

    group.bench_function("publish_then_drain", |b| {
        b.iter(|| {
            tx.publish(black_box(KeyTransition::released(KEY_A)));
            black_box(rx.drain())
        })
    });

    group.finish();
}

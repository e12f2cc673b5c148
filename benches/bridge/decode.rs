//! Benchmarks for evdev record decoding.

use std::hint::black_box;

use criterion::Criterion;
use keygate::input::{
    event::{decode, RawEvent, EV_SYN},
    keys::KEY_S,
};

pub fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("bridge/decode");

    let press = RawEvent::key(KEY_S, 1).to_bytes();
    let sync = RawEvent {
        ev_type: EV_SYN,
        code: 0,
        value: 0,
    }
    .to_bytes();

    group.bench_function("key_press", |b| b.iter(|| decode(black_box(&press))));
    group.bench_function("sync_discard", |b| b.iter(|| decode(black_box(&sync))));

    group.finish();
}

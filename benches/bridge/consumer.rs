//! Benchmarks for one audio block: drain the mailbox, dispatch, render.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keygate::{
    dsp::Wavetable,
    input::keys::{KEY_A, KEY_B, KEY_C, KEY_D, KEY_E, KEY_F},
    mailbox::Mailbox,
    rt::{GateBank, KeyConsumer, KeyMap},
    KeyTransition,
};

use crate::BLOCK_SIZES;

const KEYS: [u16; 6] = [KEY_A, KEY_B, KEY_C, KEY_D, KEY_E, KEY_F];

pub fn bench_consumer(c: &mut Criterion) {
    let mut group = c.benchmark_group("bridge/consumer");
    let map: KeyMap<usize> = KEYS.iter().copied().zip(0..).collect();

    // Idle block: empty mailbox, no dispatch.
    let (_tx, rx) = Mailbox::new().split();
    let mut consumer = KeyConsumer::new(rx, map.clone(), None);
    let mut gates = GateBank::new(KEYS.len());
    group.bench_function("process_idle", |b| {
        b.iter(|| black_box(consumer.process(&mut gates)))
    });

    // Busy block: a fresh edge every block.
    let (mut tx, rx) = Mailbox::new().split();
    let mut consumer = KeyConsumer::new(rx, map, None);
    let mut gates = GateBank::new(KEYS.len());
    group.bench_function("process_edge", |b| {
        b.iter(|| {
            tx.publish(KeyTransition::pressed(KEY_D));
            black_box(consumer.process(&mut gates))
        })
    });

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let mut oscillators: Vec<Wavetable> = (0..KEYS.len())
            .map(|i| {
                let mut osc = Wavetable::sine(48_000.0);
                osc.set_frequency(220.0 * (i + 1) as f32);
                osc
            })
            .collect();

        // Six open partials, the additive demo's worst case.
        group.bench_with_input(BenchmarkId::new("additive_block", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = oscillators.iter_mut().map(|osc| osc.next_sample()).sum();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}

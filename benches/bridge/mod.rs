//! Benchmarks for the bridge primitives.

mod consumer;
mod decode;
mod mailbox;

pub use consumer::bench_consumer;
pub use decode::bench_decode;
pub use mailbox::bench_mailbox;

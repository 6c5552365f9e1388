//! Lock-free bounded MPSC ring buffer.
//!
//! This crate is a pure synchronization primitive: it has no knowledge of
//! log events, sinks, or severity levels. It provides a fixed-capacity ring
//! of `T: Copy` slots that any number of producer threads may reserve and
//! commit into concurrently, and that a single consumer drains from.

mod backoff;
mod config;
mod ring;

pub use backoff::Backoff;
pub use config::Config;
pub use ring::{GetGuard, PutGuard, Ring};

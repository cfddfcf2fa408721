//! Accumulation primitives
//!
//! Provides a bounded key/value accumulator that rejects writes or drains
//! itself through a flush callback once full.

mod accumulator;

pub use accumulator::{AccumulatorConfig, AccumulatorStats, BoundedAccumulator};

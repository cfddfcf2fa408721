//! Core traits for flush destinations
//!
//! These traits define the interface a drain target must implement to
//! receive the contents of a full accumulator.

mod flush_sink;

pub use flush_sink::FlushSink;

//! Elohim Accumulator - bounded key/value batching
//!
//! A thread-safe map that fills up to a fixed capacity and then either
//! rejects further writes or hands its contents to a caller-supplied flush
//! callback before starting over.
//!
//! # Locking
//!
//! Every operation, including the flush callback, runs under one exclusive
//! lock. A callback must not call back into the accumulator it was invoked
//! from, and a slow callback blocks every other caller until it returns.
//!
//! # Example
//!
//! ```rust,ignore
//! use elohim_accumulator::BoundedAccumulator;
//!
//! let acc = BoundedAccumulator::new(500);
//!
//! for (id, doc) in incoming {
//!     acc.insert_with_flush(id, doc, |batch| storage.bulk_write(batch))?;
//! }
//!
//! // Drain the tail
//! acc.flush(|batch| storage.bulk_write(batch))?;
//! ```

// Core traits for flush destinations
pub mod traits;

// Accumulation primitives
pub mod cache;

// Error types
pub mod error;

// Re-export core traits
pub use traits::FlushSink;

// Re-export cache types
pub use cache::{AccumulatorConfig, AccumulatorStats, BoundedAccumulator};

// Re-export error types
pub use error::{AccumulatorError, ConfigError, Result};

//! Bounded accumulator with flush-on-full
//!
//! Collects key/value pairs up to a fixed capacity. Once full, writes are
//! either rejected ([`BoundedAccumulator::insert`]) or the current contents
//! are handed to a caller-supplied flush callback and cleared before the new
//! pair is stored ([`BoundedAccumulator::insert_with_flush`]).
//!
//! # Locking
//!
//! A single mutex guards every operation for its full duration, *including
//! the flush callback*. Snapshot, callback and clear happen as one atomic
//! step, so no concurrent insert can land between them and every entry is
//! flushed exactly once. The price is that a slow callback stalls all other
//! callers, and a callback that calls back into the same accumulator
//! deadlocks. Do not move the callback outside the lock.

use crate::error::{AccumulatorError, ConfigError, Result};
use crate::traits::FlushSink;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, TryLockError};

/// Configuration for the accumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Maximum number of distinct keys held before the accumulator is full
    pub capacity: usize,
    /// Fill level (0-100) at which [`BoundedAccumulator::should_flush`] fires
    pub high_watermark: u8,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            high_watermark: 80,
        }
    }
}

impl AccumulatorConfig {
    /// Default configuration with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Configuration for interactive use (small buffer, early flush hint)
    pub fn for_interactive() -> Self {
        Self {
            capacity: 100,
            high_watermark: 50,
        }
    }

    /// Configuration for bulk loads (large buffer, late flush hint)
    pub fn for_bulk() -> Self {
        Self {
            capacity: 5000,
            high_watermark: 90,
        }
    }

    /// Check the configuration for degenerate values.
    ///
    /// Construction never calls this; a zero capacity is accepted by
    /// [`BoundedAccumulator::with_config`] and treated as "always full".
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.high_watermark > 100 {
            return Err(ConfigError::Watermark(self.high_watermark));
        }
        Ok(())
    }
}

/// Point-in-time counters for an accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccumulatorStats {
    /// Entries currently held
    pub len: usize,
    /// Configured capacity
    pub capacity: usize,
    /// Successful flushes since construction
    pub flushes: u64,
    /// Flush callbacks that returned an error
    pub failed_flushes: u64,
    /// Plain inserts rejected because the accumulator was full
    pub rejected: u64,
}

struct State<K, V> {
    entries: HashMap<K, V>,
    flushes: u64,
    failed_flushes: u64,
    rejected: u64,
}

/// Thread-safe key/value accumulator with a fixed capacity.
///
/// Keys are unique (last write wins) and carry no ordering.
///
/// # Example
///
/// ```rust,ignore
/// use elohim_accumulator::BoundedAccumulator;
///
/// let acc = BoundedAccumulator::new(2);
/// assert!(acc.insert("a", 1));
/// assert!(acc.insert("b", 2));
/// assert!(!acc.insert("c", 3)); // full
///
/// acc.insert_with_flush("c", 3, |batch| {
///     assert_eq!(batch.len(), 2);
///     Ok::<_, std::io::Error>(())
/// })?;
/// assert_eq!(acc.len(), 1);
/// ```
pub struct BoundedAccumulator<K, V> {
    config: AccumulatorConfig,
    state: Mutex<State<K, V>>,
}

impl<K: Eq + Hash, V> BoundedAccumulator<K, V> {
    /// Create an empty accumulator holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self::with_config(AccumulatorConfig::with_capacity(capacity))
    }

    /// Create an empty accumulator from a configuration
    pub fn with_config(config: AccumulatorConfig) -> Self {
        if config.capacity == 0 {
            tracing::debug!("Accumulator created with capacity 0, every insert observes a full buffer");
        }

        Self {
            config,
            state: Mutex::new(State {
                entries: HashMap::new(),
                flushes: 0,
                failed_flushes: 0,
                rejected: 0,
            }),
        }
    }

    /// Insert a pair unless the accumulator is full.
    ///
    /// Returns `false` without touching the contents when full. Fullness is
    /// checked before the key, so overwriting an existing key is rejected too.
    pub fn insert(&self, key: K, value: V) -> bool {
        let mut state = self.lock();

        if self.is_full_locked(&state) {
            state.rejected += 1;
            tracing::trace!(capacity = self.config.capacity, "Accumulator full, insert rejected");
            return false;
        }

        state.entries.insert(key, value);
        true
    }

    /// Move all entries out, leaving the accumulator empty
    pub fn take(&self) -> HashMap<K, V> {
        std::mem::take(&mut self.lock().entries)
    }

    /// Remove all entries; capacity is preserved
    pub fn reset(&self) {
        self.lock().entries.clear();
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if no entries are held
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Check if the next plain insert would be rejected
    pub fn is_full(&self) -> bool {
        let state = self.lock();
        self.is_full_locked(&state)
    }

    /// Get current fill level (0-100)
    pub fn fill_level(&self) -> u8 {
        if self.config.capacity == 0 {
            return 100;
        }
        let len = self.lock().entries.len();
        (len.saturating_mul(100) / self.config.capacity).min(100) as u8
    }

    /// Check if the fill level is at or above the high watermark
    pub fn should_flush(&self) -> bool {
        self.fill_level() >= self.config.high_watermark
    }

    /// Get current counters
    pub fn stats(&self) -> AccumulatorStats {
        let state = self.lock();
        AccumulatorStats {
            len: state.entries.len(),
            capacity: self.config.capacity,
            flushes: state.flushes,
            failed_flushes: state.failed_flushes,
            rejected: state.rejected,
        }
    }

    /// Get the accumulator configuration
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    fn is_full_locked(&self, state: &State<K, V>) -> bool {
        state.entries.len() >= self.config.capacity
    }

    fn lock(&self) -> MutexGuard<'_, State<K, V>> {
        // Only a flush callback can panic under the lock, and it runs before
        // any mutation, so the contents behind a poisoned lock are intact.
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovering accumulator lock poisoned by a panicking flush callback");
            self.state.clear_poison();
            poisoned.into_inner()
        })
    }
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedAccumulator<K, V> {
    /// Insert a pair, flushing first if the accumulator is full.
    ///
    /// When full, `on_full` receives a copy of the current entries while the
    /// lock is held. On success the entries are cleared and the new pair is
    /// stored. On failure the callback's error is returned wrapped in
    /// [`AccumulatorError::Flush`], the entries are left as they were and the
    /// new pair is **not** stored.
    ///
    /// `on_full` must not call into this accumulator: the lock is not
    /// reentrant and doing so deadlocks.
    pub fn insert_with_flush<E, F>(&self, key: K, value: V, on_full: F) -> Result<bool, E>
    where
        F: FnOnce(HashMap<K, V>) -> std::result::Result<(), E>,
    {
        let mut state = self.lock();

        if self.is_full_locked(&state) {
            self.flush_locked(&mut state, on_full)?;
        }

        state.entries.insert(key, value);
        Ok(true)
    }

    /// [`insert_with_flush`](Self::insert_with_flush) draining into a [`FlushSink`]
    pub fn insert_with_sink<S>(&self, key: K, value: V, sink: &mut S) -> Result<bool, S::Error>
    where
        S: FlushSink<K, V>,
    {
        self.insert_with_flush(key, value, |snapshot| sink.flush(snapshot))
    }

    /// Flush the current entries regardless of fill level.
    ///
    /// Returns the number of entries flushed. An empty accumulator returns
    /// `Ok(0)` without invoking the callback. Locking and failure semantics
    /// match [`insert_with_flush`](Self::insert_with_flush).
    pub fn flush<E, F>(&self, on_flush: F) -> Result<usize, E>
    where
        F: FnOnce(HashMap<K, V>) -> std::result::Result<(), E>,
    {
        let mut state = self.lock();
        if state.entries.is_empty() {
            return Ok(0);
        }
        self.flush_locked(&mut state, on_flush)
    }

    /// [`flush`](Self::flush) into a [`FlushSink`]
    pub fn flush_into<S>(&self, sink: &mut S) -> Result<usize, S::Error>
    where
        S: FlushSink<K, V>,
    {
        self.flush(|snapshot| sink.flush(snapshot))
    }

    /// Get an independent copy of the current entries
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.lock().entries.clone()
    }

    fn flush_locked<E, F>(&self, state: &mut State<K, V>, on_flush: F) -> Result<usize, E>
    where
        F: FnOnce(HashMap<K, V>) -> std::result::Result<(), E>,
    {
        let count = state.entries.len();
        tracing::debug!(count, capacity = self.config.capacity, "Flushing accumulator");

        if let Err(source) = on_flush(state.entries.clone()) {
            state.failed_flushes += 1;
            tracing::warn!(
                pending = count,
                capacity = self.config.capacity,
                "Flush callback failed, entries kept"
            );
            return Err(AccumulatorError::Flush {
                pending: count,
                source,
            });
        }

        state.entries.clear();
        state.flushes += 1;
        tracing::debug!(count, flushes = state.flushes, "Accumulator flushed");
        Ok(count)
    }
}

impl<K: Eq + Hash, V> Default for BoundedAccumulator<K, V> {
    fn default() -> Self {
        Self::with_config(AccumulatorConfig::default())
    }
}

impl<K, V> fmt::Debug for BoundedAccumulator<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("BoundedAccumulator");
        out.field("capacity", &self.config.capacity);
        // try_lock: Debug may be reached from inside a flush callback
        match self.state.try_lock() {
            Ok(state) => out.field("len", &state.entries.len()),
            Err(TryLockError::Poisoned(poisoned)) => {
                out.field("len", &poisoned.into_inner().entries.len())
            }
            Err(TryLockError::WouldBlock) => out.field("len", &"<locked>"),
        };
        out.finish_non_exhaustive()
    }
}

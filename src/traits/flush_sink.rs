//! FlushSink trait for draining accumulated entries

use std::collections::HashMap;

/// Destination for the entries of a flushed accumulator.
///
/// The sink is called while the accumulator's lock is held, so it must not
/// call back into the same accumulator and should return promptly.
///
/// Any `FnMut(HashMap<K, V>) -> Result<(), E>` closure is a sink.
///
/// # Example
///
/// ```rust,ignore
/// use elohim_accumulator::FlushSink;
///
/// struct BatchWriter { batches: Vec<HashMap<String, u64>> }
///
/// impl FlushSink<String, u64> for BatchWriter {
///     type Error = std::io::Error;
///
///     fn flush(&mut self, snapshot: HashMap<String, u64>) -> Result<(), Self::Error> {
///         self.batches.push(snapshot);
///         Ok(())
///     }
/// }
/// ```
pub trait FlushSink<K, V> {
    /// The error type returned when a flush is refused
    type Error;

    /// Consume a snapshot of the accumulator's entries
    fn flush(&mut self, snapshot: HashMap<K, V>) -> Result<(), Self::Error>;
}

impl<K, V, E, F> FlushSink<K, V> for F
where
    F: FnMut(HashMap<K, V>) -> Result<(), E>,
{
    type Error = E;

    fn flush(&mut self, snapshot: HashMap<K, V>) -> Result<(), E> {
        self(snapshot)
    }
}

//! Recorder interface.
use super::Record;

/// Writes records to an output destination.
pub trait Recorder {
    /// Writes a record immediately.
    fn write(&mut self, record: Record);

    /// Stores a record for later aggregation.
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    ///
    /// `step` is the optimization step at which the flush happens.
    fn flush(&mut self, step: i64);
}

//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum RecurveError {
    /// More episodes were requested for a batch than the buffer holds.
    #[error("requested {requested} episodes for a batch, but the buffer holds {available}")]
    InsufficientEpisodes {
        /// Number of episodes requested.
        requested: usize,
        /// Number of episodes in the buffer.
        available: usize,
    },

    /// A sampled episode is shorter than the requested trace length.
    #[error("episode of length {episode_len} cannot provide a trace of length {trace_len}")]
    EpisodeTooShort {
        /// Requested trace length.
        trace_len: usize,
        /// Length of the episode that was drawn.
        episode_len: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

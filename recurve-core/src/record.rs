//! Types for recording training metrics.
//!
//! A [`Record`] is a flexible container of key-value pairs produced during
//! training and evaluation. Records flow from the environment, sampler and
//! agent into a [`Recorder`], which either writes them out immediately or
//! stores them for aggregation at flush time.
//!
//! ```rust
//! use recurve_core::record::{Record, RecordValue};
//!
//! // following values are obtained with some process in reality
//! let step = 1;
//! let reward = -1f32;
//!
//! let mut record = Record::empty();
//! record.insert("step", RecordValue::Scalar(step as f32));
//! record.insert("reward", RecordValue::Scalar(reward));
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;

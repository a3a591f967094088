//! Episode replay buffer with fixed-length trace sampling.
//!
//! Experience is stored at episode granularity: the buffer is a bounded FIFO
//! of completed [`Episode`]s, and training batches are built by drawing
//! distinct episodes and slicing a contiguous window of transitions, a
//! *trace*, out of each. Traces of a fixed length are what a recurrent
//! Q-network consumes for truncated backpropagation through time.
mod base;
mod batch;
mod config;
mod episode;
mod step_proc;

pub use base::EpisodeReplayBuffer;
pub use batch::TraceBatch;
pub use config::EpisodeReplayBufferConfig;
pub use episode::{Episode, Transition};
pub use step_proc::{EpisodeStepProcessor, EpisodeStepProcessorConfig};

//! Replay buffer interfaces.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// This trait defines the storing side of a buffer. It is typically driven by
/// the process that interacts with the environment.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new item into the buffer.
    fn push(&mut self, item: Self::Item) -> Result<()>;

    /// Returns the current number of items in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
///
/// This trait is independent of [`ExperienceBufferBase`] and covers only the
/// batch generation process. Sampling is non-destructive: generating a batch
/// leaves the buffer contents unchanged.
pub trait ReplayBufferBase {
    /// Configuration parameters of the buffer.
    type Config: Clone;

    /// The type of batches generated for training.
    type Batch;

    /// Builds a replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of experiences for training.
    ///
    /// # Errors
    ///
    /// Fails when the buffer does not hold enough data for a batch of the
    /// requested size. The error must be surfaced, not silently truncated,
    /// since a short batch would corrupt shape assumptions downstream.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}

//! The episode replay buffer.
use super::{Episode, EpisodeReplayBufferConfig, TraceBatch};
use crate::{
    error::RecurveError, ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, RngCore, SeedableRng};
use std::collections::VecDeque;

/// A bounded FIFO collection of episodes with random trace sampling.
///
/// Episodes are retained in insertion order up to a fixed capacity; pushing
/// past capacity evicts the oldest episode. Sampling draws `batch_size`
/// *distinct* episodes (without replacement) and slices a uniformly random
/// contiguous window of `trace_len` transitions out of each, so every trace
/// in a batch comes from a different rollout.
///
/// # Type Parameters
///
/// * `O` - The type of observations.
/// * `A` - The type of actions.
pub struct EpisodeReplayBuffer<O, A> {
    episodes: VecDeque<Episode<O, A>>,
    capacity: usize,
    trace_len: usize,
    rng: StdRng,
}

impl<O, A> EpisodeReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    /// Draws a batch of `batch_size` traces of `trace_len` steps each.
    ///
    /// The buffer is left unmodified.
    ///
    /// # Errors
    ///
    /// * [`RecurveError::InsufficientEpisodes`] if fewer than `batch_size`
    ///   episodes are stored.
    /// * [`RecurveError::EpisodeTooShort`] if a drawn episode has fewer than
    ///   `trace_len` transitions.
    pub fn sample_traces(
        &mut self,
        batch_size: usize,
        trace_len: usize,
    ) -> Result<TraceBatch<O, A>> {
        if batch_size > self.episodes.len() {
            return Err(RecurveError::InsufficientEpisodes {
                requested: batch_size,
                available: self.episodes.len(),
            }
            .into());
        }

        let ixs = index::sample(&mut self.rng, self.episodes.len(), batch_size);
        let mut transitions = Vec::with_capacity(batch_size * trace_len);

        for ix in ixs.iter() {
            let episode = &self.episodes[ix];
            if episode.len() < trace_len {
                return Err(RecurveError::EpisodeTooShort {
                    trace_len,
                    episode_len: episode.len(),
                }
                .into());
            }
            let start = (self.rng.next_u32() as usize) % (episode.len() - trace_len + 1);
            transitions.extend_from_slice(&episode.transitions()[start..start + trace_len]);
        }

        Ok(TraceBatch::new(transitions, batch_size, trace_len))
    }

    /// Total number of transitions over all stored episodes.
    pub fn num_transitions(&self) -> usize {
        self.episodes.iter().map(|e| e.len()).sum()
    }

    /// Lengths of the stored episodes, oldest first.
    pub fn episode_lens(&self) -> Vec<usize> {
        self.episodes.iter().map(|e| e.len()).collect()
    }
}

impl<O, A> ExperienceBufferBase for EpisodeReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Item = Episode<O, A>;

    /// Appends a finalized episode, evicting the oldest one when the buffer
    /// is over capacity.
    fn push(&mut self, episode: Self::Item) -> Result<()> {
        self.episodes.push_back(episode);
        if self.episodes.len() > self.capacity {
            self.episodes.pop_front();
        }
        Ok(())
    }

    /// Returns the number of stored episodes.
    fn len(&self) -> usize {
        self.episodes.len()
    }
}

impl<O, A> ReplayBufferBase for EpisodeReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Config = EpisodeReplayBufferConfig;
    type Batch = TraceBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        Self {
            episodes: VecDeque::with_capacity(config.capacity + 1),
            capacity: config.capacity,
            trace_len: config.trace_len,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Samples `size` traces of the configured trace length.
    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let trace_len = self.trace_len;
        self.sample_traces(size, trace_len)
    }
}

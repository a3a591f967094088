//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Set the agent to training mode.
    fn train(&mut self);

    /// Set the agent to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which batches will be taken for
    /// updating model parameters. Returns `Ok(None)` when the step is
    /// skipped, for example while the buffer is still filling up during the
    /// warmup period. Sampling failures are fatal for the current training
    /// step and are propagated as errors.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// This method commonly creates a number of files in the directory. For
    /// example, the DRQN agent saves its main and target Q-networks.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}

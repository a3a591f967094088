//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performs an environment step.
    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation of an episode.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performs an environment step and resets the environment if the episode ends.
    ///
    /// In that case the initial observation of the next episode is placed in
    /// [`Step::init_obs`].
    fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way, for example as a random seed when
    /// evaluating a trained agent. This method is called by
    /// [`DefaultEvaluator`](crate::DefaultEvaluator).
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;

    /// Renders the environment.
    ///
    /// Side effect only. The default implementation does nothing, for
    /// environments without a visual frontend.
    fn render(&mut self) {}
}

//! Policy.
use super::Env;
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either deterministic or stochastic.
pub trait Policy<E: Env> {
    /// Samples an action given an observation.
    fn sample(&mut self, obs: &E::Obs) -> E::Act;

    /// Called when a new episode begins.
    ///
    /// Policies carrying per-episode state, such as a recurrent state, clear
    /// it here. The default implementation does nothing.
    fn reset(&mut self) {}
}

/// A configurable object.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Builds the object with the configuration in the yaml file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Self::build(config)
    }
}

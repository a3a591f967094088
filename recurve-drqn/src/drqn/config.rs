//! Configuration of DRQN agent.
use super::explorer::{DrqnExplorer, EpsilonGreedy};
use crate::model::RecurrentQFunction;
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};

/// Configuration of [`Drqn`](super::Drqn).
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(bound(
    serialize = "Q::Config: Serialize",
    deserialize = "Q::Config: DeserializeOwned"
))]
pub struct DrqnConfig<Q>
where
    Q: RecurrentQFunction,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
{
    /// Configuration of the Q-function approximator, shared by the main and
    /// the target instance.
    pub model_config: Q::Config,

    /// Interval of the soft target update in optimization steps.
    pub soft_update_interval: usize,

    /// Minimum number of episodes in the replay buffer before optimization
    /// steps start.
    pub min_episodes_warmup: usize,

    /// Number of traces per training batch.
    pub batch_size: usize,

    /// Discount factor of the bootstrapped targets.
    pub discount_factor: f64,

    /// Soft update coefficient of the target network.
    pub tau: f64,

    /// Training mode at construction.
    pub train: bool,

    /// Exploration strategy.
    pub explorer: DrqnExplorer,

    phantom: PhantomData<Q>,
}

impl<Q> Clone for DrqnConfig<Q>
where
    Q: RecurrentQFunction,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        Self {
            model_config: self.model_config.clone(),
            soft_update_interval: self.soft_update_interval,
            min_episodes_warmup: self.min_episodes_warmup,
            batch_size: self.batch_size,
            discount_factor: self.discount_factor,
            tau: self.tau,
            train: self.train,
            explorer: self.explorer.clone(),
            phantom: PhantomData,
        }
    }
}

impl<Q> Default for DrqnConfig<Q>
where
    Q: RecurrentQFunction,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone + Default,
{
    /// Constructs a DRQN config with default parameters.
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            soft_update_interval: 1,
            min_episodes_warmup: 1,
            batch_size: 4,
            discount_factor: 0.99,
            tau: 0.001,
            train: false,
            explorer: DrqnExplorer::EpsilonGreedy(EpsilonGreedy::new()),
            phantom: PhantomData,
        }
    }
}

impl<Q> DrqnConfig<Q>
where
    Q: RecurrentQFunction,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
{
    /// Constructs a DRQN config around the given model configuration.
    pub fn new(model_config: Q::Config) -> Self {
        Self {
            model_config,
            soft_update_interval: 1,
            min_episodes_warmup: 1,
            batch_size: 4,
            discount_factor: 0.99,
            tau: 0.001,
            train: false,
            explorer: DrqnExplorer::EpsilonGreedy(EpsilonGreedy::new()),
            phantom: PhantomData,
        }
    }

    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: Q::Config) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the interval of the soft target update in optimization steps.
    pub fn soft_update_interval(mut self, v: usize) -> Self {
        self.soft_update_interval = v;
        self
    }

    /// Sets the minimum number of buffered episodes before optimization.
    pub fn min_episodes_warmup(mut self, v: usize) -> Self {
        self.min_episodes_warmup = v;
        self
    }

    /// Sets the number of traces per training batch.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: DrqnExplorer) -> Self {
        self.explorer = v;
        self
    }

    /// Loads [`DrqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DRQN agent from {}", path_.to_str().unwrap());
        Ok(b)
    }

    /// Saves [`DrqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DRQN agent into {}", path_.to_str().unwrap());
        Ok(())
    }
}

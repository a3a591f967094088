//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of episodes after which training stops.
    pub max_episodes: usize,

    /// Interval of optimization steps in environment steps.
    pub opt_interval: usize,

    /// Warmup period in environment steps. No optimization happens before the
    /// step counter exceeds this value, which also gives the replay buffer
    /// time to fill up.
    pub warmup_period: usize,

    /// Discount factor used for reporting episode returns.
    pub discount_factor: f32,

    /// Interval of evaluation in optimization steps.
    pub eval_interval: usize,

    /// Interval of flushing records in optimization steps.
    pub flush_record_interval: usize,

    /// Interval of recording computational cost in optimization steps.
    pub record_compute_cost_interval: usize,

    /// Interval of recording agent information in optimization steps.
    pub record_agent_info_interval: usize,

    /// Interval of saving model parameters in optimization steps.
    pub save_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_episodes: 0,
            opt_interval: 1,
            warmup_period: 0,
            discount_factor: 0.99,
            eval_interval: usize::MAX,
            flush_record_interval: usize::MAX,
            record_compute_cost_interval: usize::MAX,
            record_agent_info_interval: usize::MAX,
            save_interval: usize::MAX,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of episodes to train for.
    pub fn max_episodes(mut self, v: usize) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the interval of optimization in environment steps.
    pub fn opt_interval(mut self, opt_interval: usize) -> Self {
        self.opt_interval = opt_interval;
        self
    }

    /// Sets warmup period in environment steps.
    pub fn warmup_period(mut self, warmup_period: usize) -> Self {
        self.warmup_period = warmup_period;
        self
    }

    /// Sets the discount factor used for reporting episode returns.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the interval of evaluation in optimization steps.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of flushing records in optimization steps.
    pub fn flush_record_interval(mut self, flush_record_interval: usize) -> Self {
        self.flush_record_interval = flush_record_interval;
        self
    }

    /// Sets the interval of recording computational cost in optimization steps.
    pub fn record_compute_cost_interval(mut self, record_compute_cost_interval: usize) -> Self {
        self.record_compute_cost_interval = record_compute_cost_interval;
        self
    }

    /// Sets the interval of recording agent information in optimization steps.
    pub fn record_agent_info_interval(mut self, record_agent_info_interval: usize) -> Self {
        self.record_agent_info_interval = record_agent_info_interval;
        self
    }

    /// Sets the interval of saving in optimization steps.
    pub fn save_interval(mut self, save_interval: usize) -> Self {
        self.save_interval = save_interval;
        self
    }

    /// Sets the directory the trained model being saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn yaml_roundtrip() -> Result<()> {
        let config = TrainerConfig::default()
            .max_episodes(1000)
            .opt_interval(5)
            .warmup_period(3000)
            .discount_factor(0.99)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");

        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}

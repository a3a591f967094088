//! Configuration of [`EpisodeReplayBuffer`](super::EpisodeReplayBuffer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`EpisodeReplayBuffer`](super::EpisodeReplayBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpisodeReplayBufferConfig {
    /// Maximum number of episodes kept in the buffer.
    pub capacity: usize,

    /// Trace length used when sampling through
    /// [`ReplayBufferBase::batch`](crate::ReplayBufferBase::batch).
    pub trace_len: usize,

    /// Random seed of the sampler.
    pub seed: u64,
}

impl Default for EpisodeReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            trace_len: 8,
            seed: 42,
        }
    }
}

impl EpisodeReplayBufferConfig {
    /// Sets the capacity of the buffer in episodes.
    pub fn capacity(mut self, v: usize) -> Self {
        self.capacity = v;
        self
    }

    /// Sets the trace length.
    pub fn trace_len(mut self, v: usize) -> Self {
        self.trace_len = v;
        self
    }

    /// Sets the random seed of the sampler.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`EpisodeReplayBufferConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`EpisodeReplayBufferConfig`].
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
        let config = EpisodeReplayBufferConfig::default()
            .capacity(500)
            .trace_len(16)
            .seed(7);

        let dir = TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("buffer.yaml");
        config.save(&path)?;
        assert_eq!(EpisodeReplayBufferConfig::load(&path)?, config);
        Ok(())
    }
}

//! Deterministic environment stubs used in tests.
use crate::{record::Record, Act, Env, Obs, Step};
use anyhow::Result;
use std::convert::From;

/// Observation of [`DummyEnv`]: a flat feature vector.
#[derive(Clone, Debug)]
pub struct DummyObs(pub Vec<f32>);

impl Obs for DummyObs {}

impl AsRef<[f32]> for DummyObs {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Discrete action of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyAct(pub usize);

impl Act for DummyAct {}

impl From<usize> for DummyAct {
    fn from(a: usize) -> Self {
        Self(a)
    }
}

impl From<DummyAct> for usize {
    fn from(a: DummyAct) -> Self {
        a.0
    }
}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Steps until the episode terminates.
    pub episode_len: usize,

    /// Length of the observation vector.
    pub obs_dim: usize,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 10,
            obs_dim: 4,
        }
    }
}

/// A deterministic environment with fixed-length episodes.
///
/// The observation is the current step index broadcast over `obs_dim`
/// entries, the reward is always `1.0`, and the episode terminates after
/// `episode_len` steps. Deterministic by construction, which makes buffer
/// contents and returns predictable in tests.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
}

impl DummyEnv {
    fn obs(&self) -> DummyObs {
        DummyObs(vec![self.t as f32; self.config.obs_dim])
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
        })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        self.t += 1;
        let is_done = self.t >= self.config.episode_len;
        let step = Step::new(self.obs(), a.clone(), 1.0, is_done, (), None);
        (step, Record::empty())
    }

    fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (mut step, record) = self.step(a);
        if step.is_done {
            self.t = 0;
            step.init_obs = Some(self.obs());
        }
        (step, record)
    }
}

use anyhow::Result;
use recurve_core::{
    dummy::{DummyAct, DummyEnv, DummyEnvConfig, DummyObs},
    record::LogRecorder,
    replay_buffer::{
        EpisodeReplayBuffer, EpisodeReplayBufferConfig, EpisodeStepProcessor,
        EpisodeStepProcessorConfig,
    },
    Agent, Configurable, DefaultEvaluator, Policy, Trainer, TrainerConfig,
};
use tempdir::TempDir;
use recurve_drqn::{
    drqn::{Drqn, DrqnConfig, DrqnExplorer, EpsilonGreedy},
    model::{FrameBatch, QValues, RecurrentQFunction, RnnState},
};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

static N_UPDATES: AtomicUsize = AtomicUsize::new(0);
static N_TRACKS: AtomicUsize = AtomicUsize::new(0);

const GAMMA: f32 = 0.99;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct FixedQConfig {
    h_size: usize,
    n_actions: usize,
    /// Counts update/track calls in the global counters. Only one test may
    /// enable this, since tests share the counters and run in parallel.
    count_calls: bool,
}

impl Default for FixedQConfig {
    fn default() -> Self {
        Self {
            h_size: 2,
            n_actions: 2,
            count_calls: false,
        }
    }
}

/// A Q-function whose value of action `a` is always `a`, asserting the
/// training contract on every update call.
#[derive(Debug, PartialEq)]
struct FixedQ {
    config: FixedQConfig,
}

impl RecurrentQFunction for FixedQ {
    type Config = FixedQConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    fn n_actions(&self) -> usize {
        self.config.n_actions
    }

    fn h_size(&self) -> usize {
        self.config.h_size
    }

    fn forward(&self, frames: &FrameBatch, state: &RnnState) -> (QValues, RnnState) {
        assert_eq!(state.batch_size(), frames.batch_size());
        assert_eq!(state.h_size(), self.config.h_size);

        let mut data = Vec::with_capacity(frames.n_rows() * self.config.n_actions);
        for _ in 0..frames.n_rows() {
            data.extend((0..self.config.n_actions).map(|a| a as f32));
        }
        (QValues::new(data, self.config.n_actions), state.clone())
    }

    fn update(
        &mut self,
        frames: &FrameBatch,
        targets: &[f32],
        actions: &[usize],
        mask: &[f32],
        state: &RnnState,
    ) -> Result<f32> {
        let n_rows = frames.n_rows();
        let trace_len = frames.seq_len();
        assert_eq!(targets.len(), n_rows);
        assert_eq!(actions.len(), n_rows);
        assert_eq!(mask.len(), n_rows);
        assert!(state.hidden().iter().all(|v| *v == 0.0));

        // The mask zeroes exactly the first half of every trace.
        for trace in mask.chunks(trace_len) {
            assert!(trace[..trace_len / 2].iter().all(|v| *v == 0.0));
            assert!(trace[trace_len / 2..].iter().all(|v| *v == 1.0));
        }

        // With constant Q-values, every target is either the bootstrapped
        // value of a unit reward or, on terminal rows, the reward alone.
        let bootstrapped = 1.0 + GAMMA * (self.config.n_actions - 1) as f32;
        for t in targets {
            assert!(
                (t - bootstrapped).abs() < 1e-5 || (t - 1.0).abs() < 1e-5,
                "unexpected target {}",
                t
            );
        }

        if self.config.count_calls {
            N_UPDATES.fetch_add(1, Ordering::SeqCst);
        }
        Ok(0.0)
    }

    fn track(&mut self, _src: &Self, _tau: f64) {
        if self.config.count_calls {
            N_TRACKS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn save(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

type Buffer = EpisodeReplayBuffer<DummyObs, DummyAct>;
type DrqnAgent = Drqn<DummyEnv, FixedQ, Buffer>;

#[test]
fn drqn_trains_on_dummy_env() -> Result<()> {
    env_logger::try_init().ok();

    let config = DrqnConfig::<FixedQ>::default()
        .model_config(FixedQConfig {
            h_size: 2,
            n_actions: 2,
            count_calls: true,
        })
        .batch_size(2)
        .min_episodes_warmup(2)
        .soft_update_interval(2)
        .tau(0.001)
        .explorer(DrqnExplorer::EpsilonGreedy(
            EpsilonGreedy::new()
                .eps_final(0.1)
                .annealing_steps(100)
                .warmup_steps(20),
        ));
    let mut agent = DrqnAgent::build(config)?;

    let trainer_config = TrainerConfig::default()
        .max_episodes(8)
        .opt_interval(5)
        .warmup_period(20)
        .discount_factor(GAMMA)
        .record_agent_info_interval(1);
    let mut trainer = Trainer::<DummyEnv, EpisodeStepProcessor<DummyEnv>, Buffer>::build(
        trainer_config,
        DummyEnvConfig {
            episode_len: 10,
            obs_dim: 4,
        },
        EpisodeStepProcessorConfig::default(),
        EpisodeReplayBufferConfig::default().capacity(32).trace_len(4),
    );

    let mut recorder = LogRecorder::new();
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(
        &DummyEnvConfig {
            episode_len: 10,
            obs_dim: 4,
        },
        0,
        2,
    )?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    // 8 episodes of 10 steps; optimization every 5 env steps after the
    // 20-step warmup gives 12 optimization steps, each one update.
    assert_eq!(N_UPDATES.load(Ordering::SeqCst), 12);
    // Soft target updates at every 2nd optimization step, plus the hard
    // copy into the fresh target network at construction.
    assert_eq!(N_TRACKS.load(Ordering::SeqCst), 6 + 1);
    Ok(())
}

#[test]
fn eval_mode_is_mostly_greedy() -> Result<()> {
    let mut agent = DrqnAgent::build(DrqnConfig::<FixedQ>::default())?;
    assert!(!agent.is_train());

    let obs = DummyObs(vec![0.0; 4]);
    let n_greedy = (0..200)
        .filter(|_| {
            let act: DummyAct = agent.sample(&obs);
            act.0 == 1
        })
        .count();

    // Action 1 has the highest fixed Q-value; eval mode keeps a 1% random
    // tie-breaker, so allow a small margin.
    assert!(n_greedy >= 180, "only {} of 200 actions were greedy", n_greedy);
    Ok(())
}

#[test]
fn config_yaml_roundtrip() -> Result<()> {
    let config = DrqnConfig::<FixedQ>::default()
        .batch_size(8)
        .discount_factor(0.95)
        .tau(0.01)
        .explorer(EpsilonGreedy::with_annealing_steps(5000));

    let dir = TempDir::new("drqn_config")?;
    let path = dir.path().join("drqn.yaml");
    config.save(&path)?;
    let config_ = DrqnConfig::<FixedQ>::load(&path)?;
    assert_eq!(config, config_);
    Ok(())
}

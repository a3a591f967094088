use anyhow::Result;
use recurve_core::{
    dummy::{DummyAct, DummyEnv, DummyEnvConfig, DummyObs},
    record::{BufferedRecorder, Record},
    replay_buffer::{
        EpisodeReplayBuffer, EpisodeReplayBufferConfig, EpisodeStepProcessor,
        EpisodeStepProcessorConfig,
    },
    Agent, DefaultEvaluator, Policy, ReplayBufferBase, Trainer, TrainerConfig,
};
use std::path::Path;

type Buffer = EpisodeReplayBuffer<DummyObs, DummyAct>;

/// An agent that takes a fixed action and counts its optimization steps.
struct CountingAgent {
    n_opts: usize,
    n_resets: usize,
    batch_size: usize,
    train: bool,
}

impl CountingAgent {
    fn new(batch_size: usize) -> Self {
        Self {
            n_opts: 0,
            n_resets: 0,
            batch_size,
            train: false,
        }
    }
}

impl Policy<DummyEnv> for CountingAgent {
    fn sample(&mut self, _obs: &DummyObs) -> DummyAct {
        DummyAct(0)
    }

    fn reset(&mut self) {
        self.n_resets += 1;
    }
}

impl Agent<DummyEnv, Buffer> for CountingAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut Buffer) -> Result<Option<Record>> {
        use recurve_core::ExperienceBufferBase;
        if buffer.len() < self.batch_size {
            return Ok(None);
        }
        let batch = buffer.batch(self.batch_size)?;
        assert_eq!(batch.len(), self.batch_size * batch.trace_len());
        self.n_opts += 1;
        Ok(Some(Record::from_scalar("loss", 0.0)))
    }

    fn save_params(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

fn trainer(config: TrainerConfig) -> Trainer<DummyEnv, EpisodeStepProcessor<DummyEnv>, Buffer> {
    Trainer::build(
        config,
        DummyEnvConfig {
            episode_len: 10,
            obs_dim: 4,
        },
        EpisodeStepProcessorConfig::default(),
        EpisodeReplayBufferConfig::default().capacity(100).trace_len(8),
    )
}

#[test]
fn optimization_starts_after_warmup() -> Result<()> {
    env_logger::try_init().ok();

    let config = TrainerConfig::default()
        .max_episodes(5)
        .opt_interval(5)
        .warmup_period(25)
        .discount_factor(0.99);
    let mut agent = CountingAgent::new(2);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator =
        DefaultEvaluator::<DummyEnv>::new(&DummyEnvConfig::default(), 0, 2)?;

    trainer(config).train(&mut agent, &mut recorder, &mut evaluator)?;

    // 5 episodes of 10 steps each; optimization every 5 env steps once the
    // counter exceeds 25, i.e. at steps 30, 35, 40, 45 and 50.
    assert_eq!(agent.n_opts, 5);
    assert!(agent.is_train());
    // The policy is reset before the first step of each episode; the reset
    // after the final episode arms a sixth episode that never starts.
    assert_eq!(agent.n_resets, 6);

    // Each finished episode stored one record with its discounted return.
    assert_eq!(recorder.len(), 5);
    let expected: f32 = (0..10).map(|k| 0.99f32.powi(k)).sum();
    for record in recorder.iter() {
        let r = record.get_scalar("episode_return")?;
        assert!((r - expected).abs() < 1e-4);
        assert_eq!(record.get_scalar("episode_len")?, 10.0);
    }

    Ok(())
}

#[test]
fn no_optimization_during_warmup() -> Result<()> {
    let config = TrainerConfig::default()
        .max_episodes(3)
        .opt_interval(5)
        .warmup_period(100);
    let mut agent = CountingAgent::new(1);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator =
        DefaultEvaluator::<DummyEnv>::new(&DummyEnvConfig::default(), 0, 1)?;

    trainer(config).train(&mut agent, &mut recorder, &mut evaluator)?;

    // 30 env steps in total, all inside the warmup period.
    assert_eq!(agent.n_opts, 0);
    Ok(())
}

#[test]
fn agent_skips_optimization_on_underfilled_buffer() -> Result<()> {
    // The batch size exceeds the number of episodes the run can produce, so
    // the agent keeps skipping and no error surfaces.
    let config = TrainerConfig::default()
        .max_episodes(2)
        .opt_interval(1)
        .warmup_period(0);
    let mut agent = CountingAgent::new(10);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator =
        DefaultEvaluator::<DummyEnv>::new(&DummyEnvConfig::default(), 0, 1)?;

    trainer(config).train(&mut agent, &mut recorder, &mut evaluator)?;

    assert_eq!(agent.n_opts, 0);
    Ok(())
}

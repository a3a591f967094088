//! Trains a DRQN agent on a toy pixel environment.
//!
//! The environment is a one-dimensional corridor rendered as an 8x8 RGB
//! frame; the agent walks left or right and is rewarded for reaching the
//! right end. The Q-function backend is a deliberately small linear model
//! with a decaying-average recurrent state, enough to exercise the whole
//! training contract without a tensor library.
use anyhow::Result;
use recurve_core::{
    record::{Record, LogRecorder},
    replay_buffer::{
        EpisodeReplayBuffer, EpisodeReplayBufferConfig, EpisodeStepProcessor,
        EpisodeStepProcessorConfig,
    },
    Act, Configurable, DefaultEvaluator, Env, Evaluator, Obs, Step, Trainer, TrainerConfig,
};
use recurve_drqn::{
    drqn::{Drqn, DrqnConfig, DrqnExplorer, EpsilonGreedy},
    frame::{PixelFrame, PixelFrameFilter},
    model::{FrameBatch, QValues, RecurrentQFunction, RnnState},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const FRAME_WIDTH: usize = 8;
const N_CELLS: usize = 8;
const MAX_STEPS: usize = 32;
const GAMMA: f32 = 0.95;

#[derive(Clone, Debug)]
struct CorridorObs(Vec<f32>);

impl Obs for CorridorObs {}

impl AsRef<[f32]> for CorridorObs {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Clone, Debug)]
struct CorridorAct(usize);

impl Act for CorridorAct {}

impl From<usize> for CorridorAct {
    fn from(a: usize) -> Self {
        Self(a)
    }
}

impl From<CorridorAct> for usize {
    fn from(a: CorridorAct) -> Self {
        a.0
    }
}

#[derive(Clone, Debug)]
struct CorridorConfig {
    n_cells: usize,
    max_steps: usize,
}

/// A corridor of cells observed as an RGB frame with one lit column.
struct Corridor {
    config: CorridorConfig,
    filter: PixelFrameFilter,
    pos: usize,
    t: usize,
}

impl Corridor {
    fn render_frame(&self) -> PixelFrame {
        let mut data = vec![0u8; FRAME_WIDTH * FRAME_WIDTH * 3];
        for y in 0..FRAME_WIDTH {
            let px = (y * FRAME_WIDTH + self.pos) * 3;
            data[px] = 255;
            data[px + 1] = 255;
            data[px + 2] = 255;
        }
        PixelFrame::new(data, FRAME_WIDTH, FRAME_WIDTH)
    }

    fn observe(&self) -> Result<CorridorObs> {
        let frame = self.render_frame();
        Ok(CorridorObs(self.filter.filter(&frame)?))
    }
}

impl Env for Corridor {
    type Config = CorridorConfig;
    type Obs = CorridorObs;
    type Act = CorridorAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            filter: PixelFrameFilter::new(FRAME_WIDTH),
            pos: 0,
            t: 0,
        })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.pos = 0;
        self.t = 0;
        self.observe()
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.pos = ix % (self.config.n_cells / 2);
        self.t = 0;
        self.observe()
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        self.t += 1;
        match a.0 {
            0 => self.pos = self.pos.saturating_sub(1),
            _ => self.pos = (self.pos + 1).min(self.config.n_cells - 1),
        }

        let at_goal = self.pos == self.config.n_cells - 1;
        let is_done = at_goal || self.t >= self.config.max_steps;
        let reward = if at_goal { 1.0 } else { 0.0 };
        let obs = self.observe().expect("frame matches the filter size");

        (Step::new(obs, a.clone(), reward, is_done, (), None), Record::empty())
    }

    fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (mut step, record) = self.step(a);
        if step.is_done {
            self.pos = 0;
            self.t = 0;
            step.init_obs = Some(self.observe().expect("frame matches the filter size"));
        }
        (step, record)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct LinearQConfig {
    frame_dim: usize,
    h_size: usize,
    n_actions: usize,
    learning_rate: f32,
    seed: u64,
}

/// A linear Q-function with a decaying-average recurrent state.
///
/// The hidden state tracks a running mean of the frame intensities; Q-values
/// are a linear map of the current frame plus a per-action weight on the
/// state. The masked squared TD error is minimized by plain SGD, with the
/// loss normalized over all rows including the masked ones.
#[derive(Serialize, Deserialize)]
struct LinearQ {
    config: LinearQConfig,
    w: Vec<f32>,
    u: Vec<f32>,
}

impl LinearQ {
    fn q_row(&self, x: &[f32], h_mean: f32) -> Vec<f32> {
        let fd = self.config.frame_dim;
        (0..self.config.n_actions)
            .map(|a| {
                let wx: f32 = self.w[a * fd..(a + 1) * fd]
                    .iter()
                    .zip(x.iter())
                    .map(|(w, x)| w * x)
                    .sum();
                wx + self.u[a] * h_mean
            })
            .collect()
    }

    fn h_mean_of(state: &RnnState, row: usize) -> f32 {
        let h = state.h_size();
        let slice = &state.hidden()[row * h..(row + 1) * h];
        slice.iter().sum::<f32>() / h as f32
    }

    fn advance(h_mean: f32, x: &[f32]) -> f32 {
        let x_mean = x.iter().sum::<f32>() / x.len() as f32;
        0.5 * h_mean + 0.5 * x_mean
    }
}

impl RecurrentQFunction for LinearQ {
    type Config = LinearQConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        fastrand::seed(config.seed);
        let n_weights = config.n_actions * config.frame_dim;
        let w = (0..n_weights).map(|_| (fastrand::f32() - 0.5) * 0.1).collect();
        let u = (0..config.n_actions)
            .map(|_| (fastrand::f32() - 0.5) * 0.1)
            .collect();
        Ok(Self {
            config: config.clone(),
            w,
            u,
        })
    }

    fn n_actions(&self) -> usize {
        self.config.n_actions
    }

    fn h_size(&self) -> usize {
        self.config.h_size
    }

    fn forward(&self, frames: &FrameBatch, state: &RnnState) -> (QValues, RnnState) {
        let (b, l) = (frames.batch_size(), frames.seq_len());
        let h = self.config.h_size;
        let mut q = Vec::with_capacity(b * l * self.config.n_actions);
        let mut hidden = vec![0.0; b * h];

        for i in 0..b {
            let mut h_mean = Self::h_mean_of(state, i);
            for k in 0..l {
                let x = frames.row(i * l + k);
                h_mean = Self::advance(h_mean, x);
                q.extend(self.q_row(x, h_mean));
            }
            for j in 0..h {
                hidden[i * h + j] = h_mean;
            }
        }

        let next = RnnState::new(hidden.clone(), hidden, b, h);
        (QValues::new(q, self.config.n_actions), next)
    }

    fn update(
        &mut self,
        frames: &FrameBatch,
        targets: &[f32],
        actions: &[usize],
        mask: &[f32],
        state: &RnnState,
    ) -> Result<f32> {
        let (b, l) = (frames.batch_size(), frames.seq_len());
        let fd = self.config.frame_dim;
        let lr = self.config.learning_rate;
        let n_rows = (b * l) as f32;
        let mut loss = 0.0;

        for i in 0..b {
            let mut h_mean = Self::h_mean_of(state, i);
            for k in 0..l {
                let row = i * l + k;
                let x = frames.row(row);
                h_mean = Self::advance(h_mean, x);

                let a = actions[row];
                let q = self.q_row(x, h_mean)[a];
                let err = targets[row] - q;
                loss += mask[row] * err * err;

                // d(loss)/d(q) with the loss normalized over all rows.
                let g = -2.0 * mask[row] * err / n_rows;
                for (w, x) in self.w[a * fd..(a + 1) * fd].iter_mut().zip(x.iter()) {
                    *w -= lr * g * x;
                }
                self.u[a] -= lr * g * h_mean;
            }
        }

        Ok(loss / n_rows)
    }

    fn track(&mut self, src: &Self, tau: f64) {
        let tau = tau as f32;
        for (dst, src) in self.w.iter_mut().zip(src.w.iter()) {
            *dst = tau * src + (1.0 - tau) * *dst;
        }
        for (dst, src) in self.u.iter_mut().zip(src.u.iter()) {
            *dst = tau * src + (1.0 - tau) * *dst;
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        use std::io::Write;
        file.write_all(serde_yaml::to_string(self)?.as_bytes())?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path)?;
        let loaded: LinearQ = serde_yaml::from_reader(std::io::BufReader::new(file))?;
        self.w = loaded.w;
        self.u = loaded.u;
        Ok(())
    }
}

type Buffer = EpisodeReplayBuffer<CorridorObs, CorridorAct>;

fn main() -> Result<()> {
    env_logger::init();

    let env_config = CorridorConfig {
        n_cells: N_CELLS,
        max_steps: MAX_STEPS,
    };

    let model_config = LinearQConfig {
        frame_dim: FRAME_WIDTH * FRAME_WIDTH * 3,
        h_size: 4,
        n_actions: 2,
        learning_rate: 0.05,
        seed: 7,
    };

    let agent_config = DrqnConfig::<LinearQ>::new(model_config)
        .batch_size(4)
        .min_episodes_warmup(4)
        .discount_factor(GAMMA as f64)
        .tau(0.01)
        .explorer(DrqnExplorer::EpsilonGreedy(
            EpsilonGreedy::new()
                .eps_final(0.1)
                .annealing_steps(2000)
                .warmup_steps(200),
        ));
    let mut agent = Drqn::<Corridor, LinearQ, Buffer>::build(agent_config)?;

    let trainer_config = TrainerConfig::default()
        .max_episodes(300)
        .opt_interval(5)
        .warmup_period(200)
        .discount_factor(GAMMA)
        .record_agent_info_interval(20)
        .flush_record_interval(20);
    let mut trainer = Trainer::<Corridor, EpisodeStepProcessor<Corridor>, Buffer>::build(
        trainer_config,
        env_config.clone(),
        EpisodeStepProcessorConfig::default(),
        EpisodeReplayBufferConfig::default()
            .capacity(256)
            .trace_len(4),
    );

    let mut recorder = LogRecorder::new();
    let mut evaluator = DefaultEvaluator::<Corridor>::new(&env_config, 0, 4)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    use recurve_core::Agent;
    agent.eval();
    let mean_return = evaluator.evaluate(&mut agent)?;
    println!("mean evaluation return: {:.2}", mean_return);

    Ok(())
}

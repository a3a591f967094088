//! DRQN agent implementation.
use super::{config::DrqnConfig, explorer::DrqnExplorer};
use crate::model::{FrameBatch, RecurrentQFunction, RnnState};
use anyhow::Result;
use recurve_core::{
    record::{Record, RecordValue},
    replay_buffer::TraceBatch,
    Agent, Configurable, Env, ExperienceBufferBase, Policy, ReplayBufferBase,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::From, fs, marker::PhantomData, path::Path};

/// Mask excluding the first half of every trace from the loss.
///
/// Traces are evaluated from a zeroed recurrent state instead of the true
/// historical one, so the TD errors of the first `trace_len / 2` positions
/// are unreliable; they carry mask weight 0 and the remaining positions
/// carry 1. The layout is flattened trace-major, matching [`TraceBatch`].
fn burn_in_mask(batch_size: usize, trace_len: usize) -> Vec<f32> {
    let burn_in = trace_len / 2;
    let mut mask = Vec::with_capacity(batch_size * trace_len);
    for _ in 0..batch_size {
        for k in 0..trace_len {
            mask.push(if k < burn_in { 0.0 } else { 1.0 });
        }
    }
    mask
}

/// DRQN agent.
///
/// A deep Q-learning agent whose value function carries a recurrent state,
/// so that behavior can depend on more history than the current frame. The
/// agent holds a main and a target instance of the Q-function:
/// bootstrapped targets select the action with the main network and evaluate
/// it with the target network (double-Q), and the target parameters track
/// the main ones through periodic soft updates.
///
/// During rollouts the recurrent state is carried across the steps of an
/// episode and advanced on *every* step, also when the explorer overrides
/// the greedy action; it is zeroed when an episode begins. Optimization
/// steps instead restart from a zeroed state on every batch and rely on the
/// burn-in mask to discard the positions evaluated before the state has
/// re-synchronized.
pub struct Drqn<E, Q, R>
where
    E: Env,
    Q: RecurrentQFunction,
    R: ReplayBufferBase,
{
    pub(in crate::drqn) qnet: Q,
    pub(in crate::drqn) qnet_tgt: Q,
    pub(in crate::drqn) rnn_state: RnnState,
    pub(in crate::drqn) explorer: DrqnExplorer,
    pub(in crate::drqn) soft_update_interval: usize,
    pub(in crate::drqn) soft_update_counter: usize,
    pub(in crate::drqn) min_episodes_warmup: usize,
    pub(in crate::drqn) batch_size: usize,
    pub(in crate::drqn) discount_factor: f64,
    pub(in crate::drqn) tau: f64,
    pub(in crate::drqn) train: bool,
    pub(in crate::drqn) n_opts: usize,
    pub(in crate::drqn) phantom: PhantomData<(E, R)>,
}

impl<E, Q, R> Drqn<E, Q, R>
where
    E: Env,
    Q: RecurrentQFunction,
    R: ReplayBufferBase<Batch = TraceBatch<E::Obs, E::Act>> + ExperienceBufferBase,
    E::Obs: AsRef<[f32]>,
    E::Act: From<usize> + Into<usize>,
{
    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let batch = buffer.batch(self.batch_size)?;
        let batch_size = batch.batch_size();
        let trace_len = batch.trace_len();
        let (obs, act, next_obs, reward, is_done) = batch.unpack();

        let frames = FrameBatch::from_rows(&obs, batch_size, trace_len);
        let next_frames = FrameBatch::from_rows(&next_obs, batch_size, trace_len);

        // The recurrent state is rebuilt from zero on every optimization
        // step; the burn-in mask compensates for the cold start.
        let state = RnnState::zeros(batch_size, self.qnet.h_size());

        // Double-Q: the main network selects the bootstrap action, the
        // target network evaluates it.
        let (q_main, _) = self.qnet.forward(&next_frames, &state);
        let (q_tgt, _) = self.qnet_tgt.forward(&next_frames, &state);

        let gamma = self.discount_factor as f32;
        let targets: Vec<f32> = (0..batch_size * trace_len)
            .map(|row| {
                let a = q_main.argmax(row);
                let not_done = if is_done[row] { 0.0 } else { 1.0 };
                reward[row] + gamma * q_tgt.get(row, a) * not_done
            })
            .collect();

        let actions: Vec<usize> = act.into_iter().map(|a| a.into()).collect();
        let mask = burn_in_mask(batch_size, trace_len);
        let loss = self
            .qnet
            .update(&frames, &targets, &actions, &mask, &state)?;

        self.soft_update_counter += 1;
        if self.soft_update_counter == self.soft_update_interval {
            self.soft_update_counter = 0;
            self.qnet_tgt.track(&self.qnet, self.tau);
        }

        self.n_opts += 1;

        let mut record = Record::from_slice(&[("loss", RecordValue::Scalar(loss))]);
        if let DrqnExplorer::EpsilonGreedy(egreedy) = &self.explorer {
            record.insert("eps", RecordValue::Scalar(egreedy.eps() as f32));
        }
        Ok(record)
    }
}

impl<E, Q, R> Policy<E> for Drqn<E, Q, R>
where
    E: Env,
    Q: RecurrentQFunction,
    R: ReplayBufferBase,
    E::Obs: AsRef<[f32]>,
    E::Act: From<usize> + Into<usize>,
{
    fn sample(&mut self, obs: &E::Obs) -> E::Act {
        let frames = FrameBatch::from_rows(std::slice::from_ref(obs), 1, 1);
        let (q, next_state) = self.qnet.forward(&frames, &self.rnn_state);

        // The recurrent state advances on every step, also when the explorer
        // overrides the greedy action below.
        self.rnn_state = next_state;

        let a = if self.train {
            match &mut self.explorer {
                DrqnExplorer::Softmax(softmax) => softmax.action(q.row(0)),
                DrqnExplorer::EpsilonGreedy(egreedy) => egreedy.action(q.row(0)),
            }
        } else if fastrand::f32() < 0.01 {
            fastrand::usize(..self.qnet.n_actions())
        } else {
            q.argmax(0)
        };

        E::Act::from(a)
    }

    fn reset(&mut self) {
        self.rnn_state = RnnState::zeros(1, self.qnet.h_size());
    }
}

impl<E, Q, R> Configurable for Drqn<E, Q, R>
where
    E: Env,
    Q: RecurrentQFunction,
    R: ReplayBufferBase,
    E::Obs: AsRef<[f32]>,
    E::Act: From<usize> + Into<usize>,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
{
    type Config = DrqnConfig<Q>;

    /// Constructs a DRQN agent.
    ///
    /// The main and the target network are built from the same model
    /// configuration; the target starts as an exact copy of the main
    /// network.
    fn build(config: Self::Config) -> Result<Self> {
        let qnet = Q::build(&config.model_config)?;
        let mut qnet_tgt = Q::build(&config.model_config)?;
        qnet_tgt.track(&qnet, 1.0);
        let rnn_state = RnnState::zeros(1, qnet.h_size());

        Ok(Drqn {
            qnet,
            qnet_tgt,
            rnn_state,
            explorer: config.explorer,
            soft_update_interval: config.soft_update_interval,
            soft_update_counter: 0,
            min_episodes_warmup: config.min_episodes_warmup,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            tau: config.tau,
            train: config.train,
            n_opts: 0,
            phantom: PhantomData,
        })
    }
}

impl<E, Q, R> Agent<E, R> for Drqn<E, Q, R>
where
    E: Env,
    Q: RecurrentQFunction,
    R: ReplayBufferBase<Batch = TraceBatch<E::Obs, E::Act>> + ExperienceBufferBase,
    E::Obs: AsRef<[f32]>,
    E::Act: From<usize> + Into<usize>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() >= self.min_episodes_warmup {
            Ok(Some(self.opt_(buffer)?))
        } else {
            Ok(None)
        }
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(&path.join("qnet"))?;
        self.qnet_tgt.save(&path.join("qnet_tgt"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(&path.join("qnet"))?;
        self.qnet_tgt.load(&path.join("qnet_tgt"))?;
        Ok(())
    }
}

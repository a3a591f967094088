//! Environment interaction and experience collection.
use crate::{
    record::{Record, RecordValue::Scalar},
    util::discounted_return,
    Env, ExperienceBufferBase, Policy, StepProcessor,
};
use anyhow::Result;
use std::time::SystemTime;

/// Drives the interaction between a policy and an environment and pushes the
/// collected experience into a buffer.
///
/// The sampler owns the environment and the step processor, keeps the
/// previous observation between steps, and tracks the rewards of the episode
/// in flight so that the discounted return can be reported when the episode
/// finishes.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,
    /// Discount factor used to report episode returns.
    discount_factor: f32,
    ep_rewards: Vec<f32>,
    n_frames: usize,
    time: SystemTime,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a sampler for the given environment and step processor.
    ///
    /// `discount_factor` is only used for reporting the discounted return of
    /// finished episodes; the discount used in bootstrapped targets belongs
    /// to the agent.
    pub fn new(env: E, step_processor: P, discount_factor: f32) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
            discount_factor,
            ep_rewards: Vec::new(),
            n_frames: 0,
            time: SystemTime::now(),
        }
    }

    /// Performs one environment step and pushes finished experience into the
    /// buffer.
    ///
    /// The steps are: reset the environment when a new episode begins, render,
    /// sample an action from the policy, apply it, and hand the resulting
    /// step to the step processor. When the processor emits an item — here,
    /// a finished episode — it is pushed into `buffer`.
    ///
    /// The second return value is `true` if an episode finished at this step.
    /// In that case the record carries the discounted episode return under
    /// `"episode_return"` and the episode length under `"episode_len"`.
    pub fn sample_and_push<A, R>(&mut self, policy: &mut A, buffer: &mut R) -> Result<(Record, bool)>
    where
        A: Policy<E>,
        R: ExperienceBufferBase<Item = P::Output>,
    {
        // Starts a new episode.
        if self.prev_obs.is_none() {
            self.prev_obs = Some(self.env.reset()?);
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
            policy.reset();
            self.ep_rewards.clear();
        }

        self.env.render();

        // Samples an action and applies it to the environment.
        let act = policy.sample(self.prev_obs.as_ref().unwrap());
        let (step, mut record) = self.env.step_with_reset(&act);
        let is_done = step.is_done;
        self.n_frames += 1;
        self.ep_rewards.push(step.reward);

        // Updates the previous observation.
        self.prev_obs = match is_done {
            true => Some(step.init_obs.clone().expect("Failed to unwrap init_obs")),
            false => Some(step.obs.clone()),
        };

        // Produces and pushes a finished item, if any.
        if let Some(item) = self.step_processor.process(step) {
            buffer.push(item)?;
        }

        if is_done {
            record.insert(
                "episode_return",
                Scalar(discounted_return(&self.ep_rewards, self.discount_factor)),
            );
            record.insert("episode_len", Scalar(self.ep_rewards.len() as f32));
            self.ep_rewards.clear();
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
            policy.reset();
        }

        Ok((record, is_done))
    }

    /// Environment steps per second since the last counter reset.
    pub fn fps(&self) -> f32 {
        match self.time.elapsed() {
            Ok(elapsed) => 1000. * self.n_frames as f32 / elapsed.as_millis().max(1) as f32,
            Err(_) => 0.,
        }
    }

    /// Resets the frame counter used by [`Sampler::fps`].
    pub fn reset_fps_counter(&mut self) {
        self.n_frames = 0;
        self.time = SystemTime::now();
    }
}

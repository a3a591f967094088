//! Train [`Agent`].
mod config;
mod sampler;
use std::time::{Duration, SystemTime};

use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::info;
pub use sampler::Sampler;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop and related objects.
///
/// # Training loop
///
/// 1. Build an instance of [`Env`], [`StepProcessor`] and the replay buffer,
///    wrap the environment and the processor in a [`Sampler`].
///    * Reset a counter of the environment steps: `env_steps = 0`
///    * Reset a counter of the optimization steps: `opt_steps = 0`
///    * Reset a counter of the completed episodes: `episodes = 0`
/// 2. Do an environment step with the sampler. Finished episodes are pushed
///    into the replay buffer.
/// 3. `env_steps += 1`; if an episode finished, `episodes += 1`.
/// 4. If `env_steps > warmup_period` and `env_steps % opt_interval == 0`,
///    do an optimization step for the agent with batches sampled from the
///    replay buffer.
///    * The agent may skip the optimization step, for example while the
///      buffer holds too few episodes.
///    * On an actual optimization step, `opt_steps += 1`, and periodically:
///      record computation cost, evaluate the agent (saving the best model
///      under `model_dir/best`), save the model, flush the recorder.
/// 5. Back to 2. until `episodes == max_episodes`.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[StepProcessor]
///     C -->|Episode|D[ReplayBufferBase]
///     D -->|TraceBatch|A
/// ```
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the step processor.
    step_proc_config: P::Config,

    /// Configuration of the replay buffer.
    replay_buffer_config: R::Config,

    /// Where to save the trained model.
    model_dir: Option<String>,

    /// Interval of optimization in environment steps.
    opt_interval: usize,

    /// Warmup period in environment steps.
    warmup_period: usize,

    /// Discount factor used for reporting episode returns.
    discount_factor: f32,

    /// The number of episodes after which training stops.
    max_episodes: usize,

    /// Interval of evaluation in optimization steps.
    eval_interval: usize,

    /// Interval of flushing records in optimization steps.
    flush_record_interval: usize,

    /// Interval of recording computational cost in optimization steps.
    record_compute_cost_interval: usize,

    /// Interval of recording agent information in optimization steps.
    record_agent_info_interval: usize,

    /// Interval of saving the model in optimization steps.
    save_interval: usize,

    /// Optimization steps since the computation cost was last recorded.
    opt_steps_for_ops: usize,

    /// Timer for optimization steps per second.
    timer_for_ops: Duration,
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        step_proc_config: P::Config,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config,
            step_proc_config,
            replay_buffer_config,
            model_dir: config.model_dir,
            opt_interval: config.opt_interval,
            warmup_period: config.warmup_period,
            discount_factor: config.discount_factor,
            max_episodes: config.max_episodes,
            eval_interval: config.eval_interval,
            flush_record_interval: config.flush_record_interval,
            record_compute_cost_interval: config.record_compute_cost_interval,
            record_agent_info_interval: config.record_agent_info_interval,
            save_interval: config.save_interval,
            opt_steps_for_ops: 0,
            timer_for_ops: Duration::new(0, 0),
        }
    }

    fn save_model<A: Agent<E, R>>(agent: &A, model_dir: String) {
        match agent.save_params(model_dir.as_ref()) {
            Ok(()) => info!("Saved the model in {:?}.", &model_dir),
            Err(_) => info!("Failed to save model in {:?}.", &model_dir),
        }
    }

    fn save_best_model<A: Agent<E, R>>(agent: &A, model_dir: String) {
        let model_dir = model_dir + "/best";
        Self::save_model(agent, model_dir);
    }

    fn save_model_with_steps<A: Agent<E, R>>(agent: &A, model_dir: String, steps: usize) {
        let model_dir = model_dir + format!("/{}", steps).as_str();
        Self::save_model(agent, model_dir);
    }

    /// Returns optimization steps per second, then resets the internal counter.
    fn opt_steps_per_sec(&mut self) -> f32 {
        let osps = 1000. * self.opt_steps_for_ops as f32
            / (self.timer_for_ops.as_millis().max(1) as f32);
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        osps
    }

    /// Performs a training step.
    ///
    /// An environment step is always performed. An optimization step happens
    /// only once `env_steps` exceeds the warmup period and then every
    /// `opt_interval` environment steps; before that the replay buffer is
    /// only being filled. The return values are the record of the step,
    /// whether an optimization step was done, and whether an episode finished.
    pub fn train_step<A: Agent<E, R>>(
        &mut self,
        agent: &mut A,
        buffer: &mut R,
        sampler: &mut Sampler<E, P>,
        env_steps: &mut usize,
        opt_steps: &mut usize,
    ) -> Result<(Record, bool, bool)> {
        // Samples transitions and pushes finished episodes into the buffer.
        let (mut record, is_episode_done) = sampler.sample_and_push(agent, buffer)?;
        *env_steps += 1;

        if *env_steps <= self.warmup_period {
            // Warmup period; no optimization.
            return Ok((record, false, is_episode_done));
        }

        if *env_steps % self.opt_interval != 0 {
            // Skips optimization between intervals.
            return Ok((record, false, is_episode_done));
        }

        let timer = SystemTime::now();
        match agent.opt(buffer)? {
            None => Ok((record, false, is_episode_done)),
            Some(record_agent) => {
                *opt_steps += 1;
                self.timer_for_ops += timer.elapsed()?;
                self.opt_steps_for_ops += 1;
                if *opt_steps % self.record_agent_info_interval == 0 {
                    record = record.merge(record_agent);
                }
                Ok((record, true, is_episode_done))
            }
        }
    }

    /// Trains the agent until `max_episodes` episodes have completed.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent<E, R>,
        D: Evaluator<E, A>,
    {
        let env = E::build(&self.env_config, 0)?;
        let step_processor = P::build(&self.step_proc_config);
        let mut buffer = R::build(&self.replay_buffer_config);
        let mut sampler = Sampler::new(env, step_processor, self.discount_factor);
        let mut max_eval_reward = f32::MIN;
        let mut env_steps: usize = 0;
        let mut opt_steps: usize = 0;
        let mut episodes: usize = 0;
        sampler.reset_fps_counter();
        agent.train();

        loop {
            let (mut record, is_opt, is_episode_done) =
                self.train_step(agent, &mut buffer, &mut sampler, &mut env_steps, &mut opt_steps)?;

            if is_episode_done {
                episodes += 1;
            }

            // Postprocessing after each optimization step.
            if is_opt {
                if opt_steps % self.record_compute_cost_interval == 0 {
                    record.insert("fps", Scalar(sampler.fps()));
                    record.insert("opt_steps_per_sec", Scalar(self.opt_steps_per_sec()));
                    sampler.reset_fps_counter();
                }

                if opt_steps % self.eval_interval == 0 {
                    info!("Starts evaluation of the trained model");
                    agent.eval();
                    let eval_reward = evaluator.evaluate(agent)?;
                    agent.train();
                    record.insert("eval_reward", Scalar(eval_reward));

                    // Saves the best model up to the current iteration.
                    if eval_reward > max_eval_reward {
                        max_eval_reward = eval_reward;
                        if let Some(model_dir) = self.model_dir.as_ref() {
                            Self::save_best_model(agent, model_dir.clone());
                        }
                    }
                }

                if opt_steps % self.save_interval == 0 {
                    if let Some(model_dir) = self.model_dir.as_ref() {
                        Self::save_model_with_steps(agent, model_dir.clone(), opt_steps);
                    }
                }
            }

            // Stores the record in the recorder.
            if !record.is_empty() {
                recorder.store(record);
            }

            // Flushes records.
            if is_opt && (opt_steps - 1) % self.flush_record_interval == 0 {
                recorder.flush(opt_steps as _);
            }

            if episodes == self.max_episodes {
                break;
            }
        }

        Ok(())
    }
}

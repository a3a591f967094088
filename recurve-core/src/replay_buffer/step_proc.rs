//! Accumulation of steps into episodes.
use super::{Episode, Transition};
use crate::{Env, Step, StepProcessor};
use std::{default::Default, marker::PhantomData};

/// Configuration of [`EpisodeStepProcessor`].
#[derive(Clone, Debug)]
pub struct EpisodeStepProcessorConfig {}

impl Default for EpisodeStepProcessorConfig {
    fn default() -> Self {
        Self {}
    }
}

/// Accumulates environment steps into whole [`Episode`]s.
///
/// The previous observation is kept between calls so that each step can be
/// turned into a transition `(o_t, a_t, r_t, o_t+1, done_t)`. The growing
/// transition sequence stays inside the processor until the terminal step
/// arrives, at which point the finished episode is emitted and ownership
/// passes to the replay buffer.
pub struct EpisodeStepProcessor<E: Env> {
    prev_obs: Option<E::Obs>,
    transitions: Vec<Transition<E::Obs, E::Act>>,
    phantom: PhantomData<E>,
}

impl<E: Env> StepProcessor<E> for EpisodeStepProcessor<E> {
    type Config = EpisodeStepProcessorConfig;
    type Output = Episode<E::Obs, E::Act>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            transitions: Vec::new(),
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs);
        self.transitions.clear();
    }

    /// Appends the step to the episode under construction.
    ///
    /// Returns the finished episode on the terminal step, `None` otherwise.
    ///
    /// # Panics
    ///
    /// Panics if called before [`reset`](StepProcessor::reset).
    fn process(&mut self, step: Step<E>) -> Option<Self::Output> {
        let prev_obs = match self.prev_obs.take() {
            Some(obs) => obs,
            None => panic!("prev_obs is not set. Forgot to call reset()?"),
        };

        let is_done = step.is_done;
        self.transitions.push(Transition {
            obs: prev_obs,
            act: step.act,
            reward: step.reward,
            next_obs: step.obs.clone(),
            is_done,
        });

        if is_done {
            Some(Episode::from_transitions(std::mem::replace(
                &mut self.transitions,
                Vec::new(),
            )))
        } else {
            self.prev_obs = Some(step.obs);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyAct, DummyEnv, DummyObs};

    fn step(t: usize, is_done: bool) -> Step<DummyEnv> {
        Step::new(
            DummyObs(vec![t as f32]),
            DummyAct(0),
            1.0,
            is_done,
            (),
            None,
        )
    }

    #[test]
    fn emits_episode_only_on_terminal_step() {
        let mut proc = EpisodeStepProcessor::<DummyEnv>::build(&Default::default());
        proc.reset(DummyObs(vec![0.0]));

        assert!(proc.process(step(1, false)).is_none());
        assert!(proc.process(step(2, false)).is_none());
        let episode = proc.process(step(3, true)).expect("terminal step");

        assert_eq!(episode.len(), 3);
        let transitions = episode.transitions();
        for (k, tr) in transitions.iter().enumerate() {
            assert_eq!(tr.obs.0, vec![k as f32]);
            assert_eq!(tr.next_obs.0, vec![(k + 1) as f32]);
            assert_eq!(tr.is_done, k == 2);
        }
    }

    #[test]
    fn reset_discards_partial_episode() {
        let mut proc = EpisodeStepProcessor::<DummyEnv>::build(&Default::default());
        proc.reset(DummyObs(vec![0.0]));
        proc.process(step(1, false));

        proc.reset(DummyObs(vec![10.0]));
        let episode = proc.process(step(11, true)).unwrap();
        assert_eq!(episode.len(), 1);
        assert_eq!(episode.transitions()[0].obs.0, vec![10.0]);
    }
}

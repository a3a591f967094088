//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{Env, Policy};
use anyhow::Result;

/// Runs a fixed number of episodes and reports the average return.
///
/// The environment is built once from its configuration; each evaluation
/// episode resets it with the episode index, which environments may use as a
/// seed.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E, P> Evaluator<E, P> for DefaultEvaluator<E>
where
    E: Env,
    P: Policy<E>,
{
    fn evaluate(&mut self, policy: &mut P) -> Result<f32> {
        let mut r_total = 0f32;

        for ix in 0..self.n_episodes {
            policy.reset();
            let mut prev_obs = self.env.reset_with_index(ix)?;

            loop {
                let act = policy.sample(&prev_obs);
                let (step, _) = self.env.step(&act);
                r_total += step.reward;
                if step.is_done {
                    break;
                }
                prev_obs = step.obs;
            }
        }

        Ok(r_total / self.n_episodes as f32)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration of the environment.
    /// * `seed` - Random seed of the environment.
    /// * `n_episodes` - The number of episodes run per evaluation.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyAct, DummyEnv, DummyEnvConfig, DummyObs};

    struct FixedPolicy {
        n_resets: usize,
    }

    impl Policy<DummyEnv> for FixedPolicy {
        fn sample(&mut self, _obs: &DummyObs) -> DummyAct {
            DummyAct(0)
        }

        fn reset(&mut self) {
            self.n_resets += 1;
        }
    }

    #[test]
    fn reports_mean_return_over_episodes() -> Result<()> {
        let config = DummyEnvConfig {
            episode_len: 10,
            obs_dim: 2,
        };
        let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&config, 0, 3)?;
        let mut policy = FixedPolicy { n_resets: 0 };

        // Every step pays 1.0 and episodes run 10 steps.
        let mean_return = evaluator.evaluate(&mut policy)?;
        assert_eq!(mean_return, 10.0);
        // The policy is reset before each evaluation episode.
        assert_eq!(policy.n_resets, 3);
        Ok(())
    }
}

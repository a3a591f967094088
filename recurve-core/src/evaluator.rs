//! Evaluation of policies.
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

use crate::{Env, Policy};
use anyhow::Result;

/// Evaluates a policy.
pub trait Evaluator<E: Env, P: Policy<E>> {
    /// Runs evaluation episodes and returns a performance measure, typically
    /// the average return over the episodes.
    fn evaluate(&mut self, policy: &mut P) -> Result<f32>;
}

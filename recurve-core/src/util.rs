//! Utilities.

/// Discounted cumulative reward of a reward sequence.
///
/// Computes `sum_k gamma^k * r_k` by accumulating right to left:
/// `total = total * gamma + r_k`. Used for reporting episode returns; it does
/// not feed back into training.
pub fn discounted_return(rewards: &[f32], gamma: f32) -> f32 {
    rewards.iter().rev().fold(0.0, |total, r| total * gamma + r)
}

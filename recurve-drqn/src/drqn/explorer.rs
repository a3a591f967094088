//! Exploration strategies of DRQN.
use serde::{Deserialize, Serialize};

fn argmax(q: &[f32]) -> usize {
    let mut best = 0;
    for (a, v) in q.iter().enumerate() {
        if *v > q[best] {
            best = a;
        }
    }
    best
}

/// Explorers for DRQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum DrqnExplorer {
    /// Softmax action selection.
    Softmax(Softmax),

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

/// Softmax explorer for DRQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Softmax {}

#[allow(clippy::new_without_default)]
impl Softmax {
    /// Constructs softmax explorer.
    pub fn new() -> Self {
        Self {}
    }

    /// Takes an action by sampling from the softmax of the Q-values.
    pub fn action(&mut self, q: &[f32]) -> usize {
        let max = q.iter().fold(f32::NEG_INFINITY, |a, b| a.max(*b));
        let weights: Vec<f32> = q.iter().map(|v| (v - max).exp()).collect();
        let total: f32 = weights.iter().sum();

        let mut u = fastrand::f32() * total;
        for (a, w) in weights.iter().enumerate() {
            if u <= *w {
                return a;
            }
            u -= w;
        }
        weights.len() - 1
    }
}

/// Epsilon-greedy explorer for DRQN.
///
/// The exploration rate is derived from the number of calls, one per
/// environment step: ε is pinned to 1 for the first `warmup_steps` calls
/// (every action is random while the replay buffer fills up), then decays
/// linearly from `eps_start` by `(eps_start - eps_final) / annealing_steps`
/// per step, and stays at `eps_final` once reached.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Number of calls so far.
    pub n_steps: usize,
    /// Exploration rate at the first post-warmup step.
    pub eps_start: f64,
    /// Final exploration rate.
    pub eps_final: f64,
    /// Number of post-warmup steps over which ε anneals to `eps_final`.
    pub annealing_steps: usize,
    /// Number of steps during which every action is random.
    pub warmup_steps: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self {
            n_steps: 0,
            eps_start: 1.0,
            eps_final: 0.1,
            annealing_steps: 10_000,
            warmup_steps: 0,
        }
    }

    /// Constructs an epsilon-greedy explorer with the given annealing length.
    pub fn with_annealing_steps(annealing_steps: usize) -> DrqnExplorer {
        DrqnExplorer::EpsilonGreedy(Self {
            n_steps: 0,
            eps_start: 1.0,
            eps_final: 0.1,
            annealing_steps,
            warmup_steps: 0,
        })
    }

    /// The current exploration rate.
    pub fn eps(&self) -> f64 {
        if self.n_steps < self.warmup_steps {
            return 1.0;
        }
        let d = (self.eps_start - self.eps_final) / self.annealing_steps as f64;
        (self.eps_start - d * (self.n_steps - self.warmup_steps) as f64).max(self.eps_final)
    }

    /// Takes an action given the Q-values of one observation.
    pub fn action(&mut self, q: &[f32]) -> usize {
        let is_random = fastrand::f64() < self.eps();
        self.n_steps += 1;

        if is_random {
            fastrand::usize(..q.len())
        } else {
            argmax(q)
        }
    }

    /// Set the epsilon value at the start of annealing.
    pub fn eps_start(self, v: f64) -> Self {
        let mut s = self;
        s.eps_start = v;
        s
    }

    /// Set the epsilon value at the end of annealing.
    pub fn eps_final(self, v: f64) -> Self {
        let mut s = self;
        s.eps_final = v;
        s
    }

    /// Set the annealing length in steps.
    pub fn annealing_steps(self, v: usize) -> Self {
        let mut s = self;
        s.annealing_steps = v;
        s
    }

    /// Set the warmup length in steps.
    pub fn warmup_steps(self, v: usize) -> Self {
        let mut s = self;
        s.warmup_steps = v;
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eps_is_pinned_during_warmup() {
        let mut egreedy = EpsilonGreedy::new().eps_start(0.5).warmup_steps(100);
        for _ in 0..100 {
            assert_eq!(egreedy.eps(), 1.0);
            egreedy.action(&[0.0, 1.0]);
        }
        // First post-warmup step starts from eps_start.
        assert_eq!(egreedy.eps(), 0.5);
    }

    #[test]
    fn eps_reaches_final_value_after_annealing() {
        let mut egreedy = EpsilonGreedy::new()
            .eps_start(1.0)
            .eps_final(0.1)
            .annealing_steps(10_000)
            .warmup_steps(50);

        for _ in 0..50 + 10_000 {
            egreedy.action(&[0.0]);
        }
        assert!((egreedy.eps() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn eps_never_decays_below_final_value() {
        let mut egreedy = EpsilonGreedy::new()
            .eps_final(0.1)
            .annealing_steps(100);
        for _ in 0..1000 {
            egreedy.action(&[0.0, 0.0]);
            assert!(egreedy.eps() >= 0.1);
        }
        assert_eq!(egreedy.eps(), 0.1);
    }

    #[test]
    fn eps_decays_linearly() {
        let mut egreedy = EpsilonGreedy::new()
            .eps_start(1.0)
            .eps_final(0.0)
            .annealing_steps(10);
        let mut prev = egreedy.eps();
        for _ in 0..10 {
            egreedy.action(&[0.0]);
            let eps = egreedy.eps();
            assert!((prev - eps - 0.1).abs() < 1e-9);
            prev = eps;
        }
    }

    #[test]
    fn zero_eps_explorer_is_greedy() {
        let mut egreedy = EpsilonGreedy::new()
            .eps_start(0.0)
            .eps_final(0.0)
            .annealing_steps(1);
        for _ in 0..20 {
            assert_eq!(egreedy.action(&[0.3, 0.1, 0.7, 0.2]), 2);
        }
    }

    #[test]
    fn softmax_prefers_dominant_action() {
        let mut softmax = Softmax::new();
        let n_picked = (0..200)
            .filter(|_| softmax.action(&[-10.0, 10.0, -10.0]) == 1)
            .count();
        assert!(n_picked > 190);
    }
}

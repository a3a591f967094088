//! Transitions and episodes.

/// A single environment transition `(o_t, a_t, r_t, o_t+1, done_t)`.
///
/// Immutable once created.
#[derive(Clone, Debug)]
pub struct Transition<O, A> {
    /// Observation before taking the action.
    pub obs: O,

    /// Action taken.
    pub act: A,

    /// Reward received.
    pub reward: f32,

    /// Observation after taking the action.
    pub next_obs: O,

    /// Flag denoting if the episode terminated at this transition.
    pub is_done: bool,
}

/// An ordered sequence of transitions from one environment rollout, from
/// reset to the terminal step.
///
/// Episodes are created incrementally by
/// [`EpisodeStepProcessor`](super::EpisodeStepProcessor) and ownership moves
/// into the replay buffer once the terminal transition has been appended.
#[derive(Clone, Debug)]
pub struct Episode<O, A> {
    transitions: Vec<Transition<O, A>>,
}

impl<O, A> Episode<O, A> {
    /// Wraps a completed sequence of transitions.
    pub fn from_transitions(transitions: Vec<Transition<O, A>>) -> Self {
        Self { transitions }
    }

    /// Number of steps in the episode.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` for an episode with no transitions.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// The transitions of the episode, in step order.
    pub fn transitions(&self) -> &[Transition<O, A>] {
        &self.transitions
    }

    /// The per-step rewards of the episode, in step order.
    pub fn rewards(&self) -> Vec<f32> {
        self.transitions.iter().map(|t| t.reward).collect()
    }
}

//! Batches of traces.
use super::Transition;

/// A batch of `batch_size` traces, each a contiguous run of `trace_len`
/// transitions sliced from one episode.
///
/// The transitions are flattened trace-major: all `trace_len` steps of the
/// first trace, then all steps of the second, and so on. Batches are
/// ephemeral; one exists only for the duration of a single optimization step.
#[derive(Debug)]
pub struct TraceBatch<O, A> {
    transitions: Vec<Transition<O, A>>,
    batch_size: usize,
    trace_len: usize,
}

impl<O, A> TraceBatch<O, A> {
    pub(super) fn new(
        transitions: Vec<Transition<O, A>>,
        batch_size: usize,
        trace_len: usize,
    ) -> Self {
        debug_assert_eq!(transitions.len(), batch_size * trace_len);
        Self {
            transitions,
            batch_size,
            trace_len,
        }
    }

    /// Number of traces in the batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of steps per trace.
    pub fn trace_len(&self) -> usize {
        self.trace_len
    }

    /// Total number of transitions, `batch_size * trace_len`.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` for a batch with no transitions.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// The flattened transitions, trace-major.
    pub fn transitions(&self) -> &[Transition<O, A>] {
        &self.transitions
    }

    /// Unpacks the batch into parallel vectors
    /// `(o_t, a_t, o_t+1, r_t, done_t)`, preserving the trace-major order.
    pub fn unpack(self) -> (Vec<O>, Vec<A>, Vec<O>, Vec<f32>, Vec<bool>) {
        let n = self.transitions.len();
        let mut obs = Vec::with_capacity(n);
        let mut act = Vec::with_capacity(n);
        let mut next_obs = Vec::with_capacity(n);
        let mut reward = Vec::with_capacity(n);
        let mut is_done = Vec::with_capacity(n);

        for t in self.transitions {
            obs.push(t.obs);
            act.push(t.act);
            next_obs.push(t.next_obs);
            reward.push(t.reward);
            is_done.push(t.is_done);
        }

        (obs, act, next_obs, reward, is_done)
    }
}

//! The recurrent Q-function contract and its value types.
use anyhow::Result;
use std::path::Path;

/// Recurrent state of a Q-network: a (cell, hidden) vector pair per batch row.
///
/// Both vectors are stored flat with `batch_size * h_size` entries, row
/// major. The state is opaque to the training code apart from construction
/// of the zero state: it is created zeroed at the start of every rollout
/// episode and of every optimization step, threaded through
/// [`RecurrentQFunction::forward`] and never carried across batches.
#[derive(Clone, Debug, PartialEq)]
pub struct RnnState {
    cell: Vec<f32>,
    hidden: Vec<f32>,
    batch_size: usize,
    h_size: usize,
}

impl RnnState {
    /// The zero state for `batch_size` rows of width `h_size`.
    pub fn zeros(batch_size: usize, h_size: usize) -> Self {
        Self {
            cell: vec![0.; batch_size * h_size],
            hidden: vec![0.; batch_size * h_size],
            batch_size,
            h_size,
        }
    }

    /// Wraps existing state vectors.
    ///
    /// # Panics
    ///
    /// Panics if either vector has a length other than `batch_size * h_size`.
    pub fn new(cell: Vec<f32>, hidden: Vec<f32>, batch_size: usize, h_size: usize) -> Self {
        assert_eq!(cell.len(), batch_size * h_size);
        assert_eq!(hidden.len(), batch_size * h_size);
        Self {
            cell,
            hidden,
            batch_size,
            h_size,
        }
    }

    /// Number of rows.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Width of the state vectors.
    pub fn h_size(&self) -> usize {
        self.h_size
    }

    /// The flat cell-state vector.
    pub fn cell(&self) -> &[f32] {
        &self.cell
    }

    /// The flat hidden-state vector.
    pub fn hidden(&self) -> &[f32] {
        &self.hidden
    }
}

/// A batch of frame sequences, flattened trace-major.
///
/// Row `i` holds the frame of step `i % seq_len` of trace `i / seq_len`, as
/// a flat feature vector of `frame_dim` entries. The same layout serves the
/// single-step rollout case with `batch_size == 1` and `seq_len == 1`.
pub struct FrameBatch {
    data: Vec<f32>,
    batch_size: usize,
    seq_len: usize,
    frame_dim: usize,
}

impl FrameBatch {
    /// Builds a batch from `batch_size * seq_len` frame rows.
    ///
    /// # Panics
    ///
    /// Panics if the number of rows does not match `batch_size * seq_len` or
    /// the rows differ in length.
    pub fn from_rows<O: AsRef<[f32]>>(rows: &[O], batch_size: usize, seq_len: usize) -> Self {
        assert_eq!(rows.len(), batch_size * seq_len);
        let frame_dim = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * frame_dim);
        for row in rows {
            assert_eq!(row.as_ref().len(), frame_dim);
            data.extend_from_slice(row.as_ref());
        }
        Self {
            data,
            batch_size,
            seq_len,
            frame_dim,
        }
    }

    /// Number of traces in the batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of steps per trace.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Length of one frame row.
    pub fn frame_dim(&self) -> usize {
        self.frame_dim
    }

    /// Total number of rows, `batch_size * seq_len`.
    pub fn n_rows(&self) -> usize {
        self.batch_size * self.seq_len
    }

    /// The `i`-th frame row.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.frame_dim..(i + 1) * self.frame_dim]
    }

    /// The flat frame data, rows concatenated.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Per-action values for a batch of rows.
pub struct QValues {
    data: Vec<f32>,
    n_actions: usize,
}

impl QValues {
    /// Wraps a flat value vector of `n_rows * n_actions` entries.
    ///
    /// # Panics
    ///
    /// Panics if the vector length is not a multiple of `n_actions`.
    pub fn new(data: Vec<f32>, n_actions: usize) -> Self {
        assert_eq!(data.len() % n_actions, 0);
        Self { data, n_actions }
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.data.len() / self.n_actions
    }

    /// The values of the `i`-th row.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n_actions..(i + 1) * self.n_actions]
    }

    /// The value of action `a` in row `i`.
    pub fn get(&self, i: usize, a: usize) -> f32 {
        self.data[i * self.n_actions + a]
    }

    /// The index of the highest-valued action in row `i`. Ties break towards
    /// the lower index.
    pub fn argmax(&self, i: usize) -> usize {
        let row = self.row(i);
        let mut best = 0;
        for (a, v) in row.iter().enumerate() {
            if *v > row[best] {
                best = a;
            }
        }
        best
    }
}

/// Contract of the recurrent Q-function approximator.
///
/// The approximator maps a batch of frame sequences and a recurrent state to
/// per-action values, and performs gradient steps towards given target
/// values. Its internal computational graph — convolutions, recurrent cell,
/// dueling value/advantage split — is opaque here; any numeric backend able
/// to satisfy this interface can be plugged in.
///
/// Training keeps two independently parameterized instances of one
/// implementation, "main" and "target", and blends the target towards the
/// main network with [`track`](RecurrentQFunction::track).
pub trait RecurrentQFunction {
    /// Configuration of the approximator.
    type Config: Clone;

    /// Builds an approximator with freshly initialized parameters.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Width of the recurrent state vectors.
    fn h_size(&self) -> usize;

    /// Evaluates a batch of frame sequences.
    ///
    /// Returns per-action values for each of the `batch_size * seq_len` rows
    /// of `frames`, together with the recurrent state advanced to the end of
    /// each sequence. `state` must have `frames.batch_size()` rows.
    fn forward(&self, frames: &FrameBatch, state: &RnnState) -> (QValues, RnnState);

    /// Performs one gradient step on the masked squared TD error.
    ///
    /// For each row `i` the error is
    /// `mask[i] * (targets[i] - q(frames)[i, actions[i]])^2`. The loss is the
    /// mean of the masked errors over **all** rows, masked ones included:
    /// rows with `mask[i] == 0` contribute nothing to the sum but still count
    /// in the denominator. Returns the loss value.
    fn update(
        &mut self,
        frames: &FrameBatch,
        targets: &[f32],
        actions: &[usize],
        mask: &[f32],
        state: &RnnState,
    ) -> Result<f32>;

    /// Soft parameter copy from `src`: `self = tau * src + (1 - tau) * self`.
    ///
    /// `tau == 1.0` makes this a hard copy.
    fn track(&mut self, src: &Self, tau: f64);

    /// Saves the parameters under the given path.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads the parameters from the given path.
    fn load(&mut self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_batch_rows_are_trace_major() {
        let rows = vec![vec![0.0f32, 1.0], vec![2.0, 3.0], vec![4.0, 5.0], vec![6.0, 7.0]];
        let frames = FrameBatch::from_rows(&rows, 2, 2);

        assert_eq!(frames.n_rows(), 4);
        assert_eq!(frames.frame_dim(), 2);
        assert_eq!(frames.row(0), &[0.0, 1.0]);
        assert_eq!(frames.row(3), &[6.0, 7.0]);
        assert_eq!(frames.data(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn q_values_argmax_breaks_ties_low() {
        let q = QValues::new(vec![1.0, 3.0, 3.0, 0.5, 0.5, 0.5], 3);
        assert_eq!(q.n_rows(), 2);
        assert_eq!(q.argmax(0), 1);
        assert_eq!(q.argmax(1), 0);
        assert_eq!(q.get(0, 2), 3.0);
    }

    #[test]
    fn zero_state_has_requested_shape() {
        let state = RnnState::zeros(3, 4);
        assert_eq!(state.batch_size(), 3);
        assert_eq!(state.h_size(), 4);
        assert_eq!(state.cell().len(), 12);
        assert!(state.hidden().iter().all(|v| *v == 0.0));
    }
}

//! n-step TD lookahead over sampled transitions.
use super::{
    batch::{Batch, LookaheadBatch, OriginalBatch},
    relabel::{relabel_batch, RewardRelabeler},
    schema::{ACS, ACS_ORIG, DONES1, OBS0, OBS0_ORIG, OBS1, OBS1_ORIG, REWS},
    store::TransitionStore,
};
use crate::{
    error::{ReplayError, Result},
    util::discount,
};
use log::debug;
use ndarray::{ArrayD, Axis, IxDyn};

/// Expands sampled transitions into n-step discounted returns.
///
/// For a sampled logical index `idx`, the window covers the transitions
/// `idx..=window_end` with `window_end = min(idx + n, num_entries) - 1`.
/// If a transition in the window is terminal, the window is cut right after
/// the first one. The rewards of the remaining `td_len` transitions are summed
/// with discount `gamma`.
///
/// The `dones1` flag of the result is `1.0` when the cut happened strictly
/// before `window_end`, and `0.0` when the window ran its nominal length,
/// including the case of a terminal transition sitting exactly at `window_end`.
pub struct LookaheadExpander<'a> {
    store: &'a TransitionStore,
}

impl<'a> LookaheadExpander<'a> {
    /// Creates an expander reading from `store`.
    pub fn new(store: &'a TransitionStore) -> Self {
        Self { store }
    }

    fn check_args(&self, batch: &Batch, n: usize, gamma: f32) -> Result<()> {
        if n == 0 {
            return Err(ReplayError::InvalidConfig(
                "lookahead length must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&gamma) {
            return Err(ReplayError::InvalidConfig(format!(
                "discount factor must be in [0, 1], got {}",
                gamma
            )));
        }
        self.store.schema().require_transition_fields()?;

        let len = self.store.num_entries();
        match batch.idxs().iter().find(|&&idx| idx >= len) {
            Some(&idx) => Err(ReplayError::IndexOutOfRange { idx, len }),
            None => Ok(()),
        }
    }

    /// Allocates a batch-major array for `len` values of field `name`.
    fn zeros(&self, name: &str, len: usize) -> ArrayD<f32> {
        let shape = self.store.schema().shape(name).unwrap_or(&[]);
        ArrayD::zeros(IxDyn(&batch_shape(len, shape)))
    }

    /// Computes the lookahead targets of every transition in `batch`.
    ///
    /// With a `relabeler`, the rewards of each window are recomputed before
    /// they are discounted.
    pub fn expand(
        &self,
        batch: &Batch,
        n: usize,
        gamma: f32,
        relabeler: Option<&dyn RewardRelabeler>,
    ) -> Result<LookaheadBatch> {
        self.check_args(batch, n, gamma)?;

        let num_entries = self.store.num_entries();
        let tracks_originals = self.store.schema().tracks_originals();
        let size = batch.len();

        let mut obs0 = self.zeros(OBS0, size);
        let mut acs = self.zeros(ACS, size);
        let mut obs1 = self.zeros(OBS1, size);
        let mut obs1_td1 = self.zeros(OBS1, size);
        let mut rews = ArrayD::<f32>::zeros(IxDyn(&[size, 1]));
        let mut dones1 = ArrayD::<f32>::zeros(IxDyn(&[size, 1]));
        let mut td_lens = ArrayD::<usize>::zeros(IxDyn(&[size, 1]));
        let mut originals = if tracks_originals {
            Some(OriginalBatch {
                obs0: self.zeros(OBS0_ORIG, size),
                acs: self.zeros(ACS_ORIG, size),
                obs1: self.zeros(OBS1_ORIG, size),
            })
        } else {
            None
        };

        for (row, &idx) in batch.idxs().iter().enumerate() {
            let window_end = idx.saturating_add(n).min(num_entries) - 1;
            let window = (idx..=window_end).collect::<Vec<_>>();
            let mut run = self.store.batchify(&window)?;
            if let Some(relabeler) = relabeler {
                relabel_batch(&mut run, relabeler)?;
            }

            // Keeps the current episode only.
            let episode_end = run
                .field(DONES1)?
                .outer_iter()
                .position(|done| done.iter().any(|&d| d == 1.0))
                .map_or(window_end, |offset| idx + offset);
            let is_trimmed = episode_end != window_end;
            let td_len = episode_end - idx + 1;
            if is_trimmed {
                debug!(
                    "Lookahead from {} cut at episode end {} before {}",
                    idx, episode_end, window_end
                );
            }

            let run_rews = run.field(REWS)?.iter().take(td_len).copied().collect::<Vec<_>>();
            rews[[row, 0]] = discount(&run_rews, gamma)[0];
            dones1[[row, 0]] = if is_trimmed { 1.0 } else { 0.0 };
            td_lens[[row, 0]] = td_len;

            copy_row(&mut obs0, row, run.field(OBS0)?, 0);
            copy_row(&mut acs, row, run.field(ACS)?, 0);
            copy_row(&mut obs1, row, run.field(OBS1)?, td_len - 1);
            copy_row(&mut obs1_td1, row, run.field(OBS1)?, 0);

            if let Some(originals) = originals.as_mut() {
                copy_row(&mut originals.obs0, row, run.field(OBS0_ORIG)?, 0);
                copy_row(&mut originals.acs, row, run.field(ACS_ORIG)?, 0);
                copy_row(&mut originals.obs1, row, run.field(OBS1_ORIG)?, td_len - 1);
            }
        }

        Ok(LookaheadBatch {
            obs0,
            acs,
            obs1,
            obs1_td1,
            rews,
            dones1,
            td_len: td_lens,
            originals,
            idxs: batch.idxs().to_vec(),
        })
    }
}

/// Shape of a batch of `len` values of shape `shape`, promoted to rank 2 or more.
fn batch_shape(len: usize, shape: &[usize]) -> Vec<usize> {
    let mut batch_shape = vec![len];
    if shape.is_empty() {
        batch_shape.push(1);
    } else {
        batch_shape.extend_from_slice(shape);
    }
    batch_shape
}

#[inline]
fn copy_row(dst: &mut ArrayD<f32>, row: usize, src: &ArrayD<f32>, src_row: usize) {
    dst.index_axis_mut(Axis(0), row)
        .assign(&src.index_axis(Axis(0), src_row));
}

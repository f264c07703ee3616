//! Recomputing rewards with an external reward model.
use super::{
    batch::Batch,
    schema::{ACS, OBS0, OBS1, REWS},
};
use crate::{
    error::{ReplayError, Result},
    util::array_min2d,
};
use ndarray::ArrayD;

/// Computes rewards for a batch of `(obs0, acs, obs1)` triples.
///
/// The inputs are batch-major. The output must have shape `[b]` or `[b, 1]`,
/// where `b` is the batch size.
///
/// Any closure with the matching signature is a relabeler:
///
/// ```
/// use lookahead_replay::RewardRelabeler;
/// use ndarray::{ArrayD, Axis};
///
/// let relabeler = |obs0: &ArrayD<f32>, _acs: &ArrayD<f32>, _obs1: &ArrayD<f32>| {
///     obs0.sum_axis(Axis(1))
/// };
/// let obs = ArrayD::<f32>::ones(ndarray::IxDyn(&[4, 3]));
/// assert_eq!(relabeler.relabel(&obs, &obs, &obs).shape(), &[4]);
/// ```
pub trait RewardRelabeler {
    /// Returns the rewards of the given transitions.
    fn relabel(&self, obs0: &ArrayD<f32>, acs: &ArrayD<f32>, obs1: &ArrayD<f32>) -> ArrayD<f32>;
}

impl<F> RewardRelabeler for F
where
    F: Fn(&ArrayD<f32>, &ArrayD<f32>, &ArrayD<f32>) -> ArrayD<f32>,
{
    fn relabel(&self, obs0: &ArrayD<f32>, acs: &ArrayD<f32>, obs1: &ArrayD<f32>) -> ArrayD<f32> {
        self(obs0, acs, obs1)
    }
}

/// Overwrites the rewards of `batch` with the output of `relabeler`.
pub(crate) fn relabel_batch(batch: &mut Batch, relabeler: &dyn RewardRelabeler) -> Result<()> {
    let rews = relabeler.relabel(batch.field(OBS0)?, batch.field(ACS)?, batch.field(OBS1)?);
    let rews = array_min2d(rews);
    let expected = [batch.len(), 1];
    if rews.shape() != expected {
        return Err(ReplayError::ShapeMismatch {
            field: REWS.to_string(),
            expected: expected.to_vec(),
            actual: rews.shape().to_vec(),
        });
    }
    batch.replace(REWS, rews);
    Ok(())
}

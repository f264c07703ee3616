//! Uniform sampling of transitions.
use super::{
    batch::Batch,
    relabel::{relabel_batch, RewardRelabeler},
    store::TransitionStore,
};
use crate::error::{ReplayError, Result};
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Draws batches of transitions uniformly at random, with replacement.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// Creates a sampler whose random stream is determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Samples `batch_size` transitions from `store`.
    ///
    /// With a `relabeler`, the rewards of the batch are recomputed from its
    /// observations and actions.
    pub fn sample(
        &mut self,
        store: &TransitionStore,
        batch_size: usize,
        relabeler: Option<&dyn RewardRelabeler>,
    ) -> Result<Batch> {
        if batch_size == 0 {
            return Err(ReplayError::InvalidConfig(
                "batch size must be positive".to_string(),
            ));
        }
        let n = store.num_entries();
        if n == 0 {
            return Err(ReplayError::EmptyStore);
        }

        let idxs = (0..batch_size)
            .map(|_| self.rng.gen_range(0..n))
            .collect::<Vec<_>>();
        trace!("Sampled {} transitions out of {}", batch_size, n);

        let mut batch = store.batchify(&idxs)?;
        if let Some(relabeler) = relabeler {
            relabel_batch(&mut batch, relabeler)?;
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::replay_buffer::{
        schema::{ACS, DONES1, OBS0, OBS1, REWS},
        Schema, Transition,
    };
    use ndarray::{ArrayD, Axis};
    use test_log::test;

    fn store(n: usize) -> TransitionStore {
        let mut store = TransitionStore::new(8, Schema::transitions(&[2], &[1], false)).unwrap();
        for i in 0..n {
            let x = i as f32;
            let tr = Transition::new()
                .with_slice(OBS0, &[x, 2.0 * x])
                .with_slice(ACS, &[1.0])
                .with_slice(OBS1, &[x + 1.0, 2.0 * x + 2.0])
                .with_scalar(REWS, x)
                .with_scalar(DONES1, 0.0);
            store.append(&tr).unwrap();
        }
        store
    }

    #[test]
    fn test_sample_from_empty_store() {
        let mut sampler = Sampler::new(42);
        assert_eq!(
            sampler.sample(&store(0), 4, None).unwrap_err(),
            ReplayError::EmptyStore
        );
    }

    #[test]
    fn test_sample_zero_batch_size() {
        let mut sampler = Sampler::new(42);
        assert!(matches!(
            sampler.sample(&store(3), 0, None),
            Err(ReplayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sample_reads_consistent_rows() {
        let mut sampler = Sampler::new(0);
        let store = store(5);
        let batch = sampler.sample(&store, 32, None).unwrap();
        assert_eq!(batch.len(), 32);
        assert!(batch.idxs().iter().all(|&ix| ix < 5));

        let obs0 = batch.field(OBS0).unwrap();
        let rews = batch.field(REWS).unwrap();
        assert_eq!(obs0.shape(), &[32, 2]);
        assert_eq!(rews.shape(), &[32, 1]);
        for (row, &ix) in batch.idxs().iter().enumerate() {
            assert_eq!(rews[[row, 0]], ix as f32);
            assert_eq!(obs0[[row, 1]], 2.0 * ix as f32);
        }
    }

    #[test]
    fn test_sample_is_reproducible() {
        let store = store(6);
        let a = Sampler::new(7).sample(&store, 16, None).unwrap();
        let b = Sampler::new(7).sample(&store, 16, None).unwrap();
        assert_eq!(a.idxs(), b.idxs());
    }

    #[test]
    fn test_sample_with_relabeler() {
        let store = store(5);
        let relabeler = |obs0: &ArrayD<f32>, _: &ArrayD<f32>, obs1: &ArrayD<f32>| {
            (obs1 - obs0).sum_axis(Axis(1))
        };
        let batch = Sampler::new(1)
            .sample(&store, 8, Some(&relabeler))
            .unwrap();
        let rews = batch.field(REWS).unwrap();
        assert_eq!(rews.shape(), &[8, 1]);
        assert!(rews.iter().all(|&r| r == 3.0));
    }

    #[test]
    fn test_sample_with_badly_shaped_relabeler() {
        let store = store(5);
        let relabeler = |obs0: &ArrayD<f32>, _: &ArrayD<f32>, _: &ArrayD<f32>| obs0.clone();
        assert!(matches!(
            Sampler::new(1).sample(&store, 4, Some(&relabeler)),
            Err(ReplayError::ShapeMismatch { .. })
        ));
    }
}

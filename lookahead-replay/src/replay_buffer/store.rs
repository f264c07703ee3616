//! Ring buffers of all transition fields, kept in lockstep.
use super::{batch::Batch, ring::RingBuffer, schema::Schema, transition::Transition};
use crate::{
    error::{ReplayError, Result},
    util::array_min2d,
};
use log::{info, trace};
use std::collections::BTreeMap;

/// One [`RingBuffer`] per schema field, all sharing capacity and cursor.
///
/// Every append writes every field exactly once, so all rings always report the
/// same length and the same start slot.
#[derive(Debug, Clone)]
pub struct TransitionStore {
    capacity: usize,
    schema: Schema,
    rings: BTreeMap<String, RingBuffer>,
}

impl TransitionStore {
    /// Builds a store with one zero-initialized ring per field of `schema`.
    pub fn new(capacity: usize, schema: Schema) -> Result<Self> {
        schema.validate()?;
        let rings = schema
            .iter()
            .map(|(name, shape)| {
                let ring = RingBuffer::new(capacity, shape)?.with_name(name);
                Ok((name.to_string(), ring))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        info!(
            "Built a transition store with capacity {} and fields {:?}",
            capacity,
            schema.names().collect::<Vec<_>>()
        );

        Ok(Self {
            capacity,
            schema,
            rings,
        })
    }

    /// Appends a transition, evicting the oldest one if the store is full.
    ///
    /// The transition is checked against the schema before anything is written:
    /// on error, no ring is modified.
    pub fn append(&mut self, tr: &Transition) -> Result<()> {
        tr.check(&self.schema)?;

        let mut evicted = false;
        for (name, ring) in self.rings.iter_mut() {
            let value = tr
                .get(name)
                .ok_or_else(|| ReplayError::SchemaMismatch(format!("missing field {}", name)))?;
            evicted = ring.append(value.view())?;
        }
        if evicted {
            trace!("Evicted the oldest transition");
        }

        Ok(())
    }

    /// Number of retained transitions.
    pub fn num_entries(&self) -> usize {
        self.rings.values().next().map_or(0, |ring| ring.len())
    }

    /// Returns `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.num_entries() == 0
    }

    /// Maximum number of retained transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Field layout of the store.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Logical index of the most recently appended transition.
    pub fn latest_index(&self) -> Result<usize> {
        match self.num_entries() {
            0 => Err(ReplayError::EmptyStore),
            n => Ok(n - 1),
        }
    }

    /// Physical slot written by the most recent append.
    pub fn latest_slot(&self) -> Result<usize> {
        match self.rings.values().next() {
            Some(ring) if !ring.is_empty() => Ok(ring.last_slot()),
            _ => Err(ReplayError::EmptyStore),
        }
    }

    /// Returns the ring of a field.
    pub fn ring(&self, name: &str) -> Option<&RingBuffer> {
        self.rings.get(name)
    }

    /// Iterates over field names and rings in name order.
    pub fn rings(&self) -> impl Iterator<Item = (&str, &RingBuffer)> {
        self.rings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reads the transitions at logical indices `idxs` into a batch.
    pub fn batchify(&self, idxs: &[usize]) -> Result<Batch> {
        let fields = self
            .rings
            .iter()
            .map(|(name, ring)| Ok((name.clone(), array_min2d(ring.get_batch(idxs)?))))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Batch::new(fields, idxs.to_vec()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::replay_buffer::schema::{ACS, DONES1, OBS0, OBS1, REWS};
    use ndarray::ArrayD;
    use test_log::test;

    fn transition(i: usize) -> Transition {
        let x = i as f32;
        Transition::new()
            .with_slice(OBS0, &[x, x])
            .with_slice(ACS, &[-x])
            .with_slice(OBS1, &[x + 1.0, x + 1.0])
            .with_scalar(REWS, x)
            .with_scalar(DONES1, 0.0)
    }

    fn store(capacity: usize) -> TransitionStore {
        TransitionStore::new(capacity, Schema::transitions(&[2], &[1], false)).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(matches!(
            TransitionStore::new(0, Schema::transitions(&[2], &[1], false)),
            Err(ReplayError::InvalidConfig(_))
        ));
        assert!(matches!(
            TransitionStore::new(4, Schema::new()),
            Err(ReplayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rings_stay_synchronized() {
        let mut store = store(3);
        for i in 0..8 {
            store.append(&transition(i)).unwrap();
            let (lens, starts): (Vec<_>, Vec<_>) =
                store.rings().map(|(_, r)| (r.len(), r.start())).unzip();
            assert!(lens.iter().all(|&l| l == store.num_entries()));
            assert!(starts.iter().all(|&s| s == starts[0]));
            assert_eq!(store.num_entries(), (i + 1).min(3));
        }
    }

    #[test]
    fn test_rejected_append_leaves_store_untouched() {
        let mut store = store(3);
        store.append(&transition(0)).unwrap();

        let bad = transition(1).with_slice(OBS1, &[1.0]);
        assert!(matches!(
            store.append(&bad),
            Err(ReplayError::ShapeMismatch { .. })
        ));
        let bad = transition(1).with_scalar("extra", 1.0);
        assert!(matches!(
            store.append(&bad),
            Err(ReplayError::SchemaMismatch(_))
        ));

        assert_eq!(store.num_entries(), 1);
        assert!(store.rings().all(|(_, r)| r.len() == 1 && r.start() == 0));
    }

    #[test]
    fn test_latest_index_and_slot() {
        let mut store = store(3);
        assert_eq!(store.latest_index(), Err(ReplayError::EmptyStore));
        assert_eq!(store.latest_slot(), Err(ReplayError::EmptyStore));
        for i in 0..5 {
            store.append(&transition(i)).unwrap();
        }
        assert_eq!(store.latest_index(), Ok(2));
        assert_eq!(store.latest_slot(), Ok(4 % 3));
    }

    #[test]
    fn test_batchify_promotes_and_reads_logical_indices() {
        let mut store = store(3);
        for i in 0..4 {
            store.append(&transition(i)).unwrap();
        }
        let batch = store.batchify(&[0, 2]).unwrap();
        assert_eq!(batch.idxs(), &[0, 2]);
        assert_eq!(batch.field(REWS).unwrap().shape(), &[2, 1]);
        assert_eq!(batch.field(OBS0).unwrap().shape(), &[2, 2]);
        let rews: &ArrayD<f32> = batch.field(REWS).unwrap();
        assert_eq!(rews.iter().copied().collect::<Vec<_>>(), vec![1.0, 3.0]);

        assert_eq!(
            store.batchify(&[3]).unwrap_err(),
            ReplayError::IndexOutOfRange { idx: 3, len: 3 }
        );
    }

    #[test]
    fn test_batchify_scalar_field_is_promoted() {
        let schema = Schema::new().with_field("x", &[]);
        let mut store = TransitionStore::new(2, schema).unwrap();
        store
            .append(&Transition::new().with("x", ndarray::arr0(5.0).into_dyn()))
            .unwrap();
        let batch = store.batchify(&[0, 0, 0]).unwrap();
        assert_eq!(batch.field("x").unwrap().shape(), &[3, 1]);
    }
}

//! Replay buffer with n-step TD lookahead.
use super::{
    Batch, LookaheadBatch, LookaheadExpander, ReplayBufferConfig, RewardRelabeler, Sampler,
    Transition, TransitionStore,
};
use crate::{error::Result, ExperienceBufferBase, ReplayBufferBase};
use log::info;
use std::fmt;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// A uniform replay buffer producing one-step and n-step batches.
///
/// Transitions flow through the components as follows:
///
/// ```mermaid
/// graph LR
///     Rollout -->|append| TransitionStore
///     TransitionStore --> Sampler
///     Sampler -->|Batch| LookaheadExpander
///     TransitionStore --> LookaheadExpander
///     LookaheadExpander -->|LookaheadBatch| Training
/// ```
///
/// The buffer is meant for a single thread of control alternating between
/// appends and sampling. If shared, appends must exclude every other access,
/// since they move the cursor of all field rings as a group.
pub struct ReplayBuffer {
    store: TransitionStore,
    sampler: Sampler,
}

impl ReplayBuffer {
    /// Appends a transition, evicting the oldest one if the buffer is full.
    pub fn append(&mut self, tr: &Transition) -> Result<()> {
        self.store.append(tr)
    }

    /// Samples `batch_size` transitions uniformly, with replacement.
    pub fn sample(
        &mut self,
        batch_size: usize,
        relabeler: Option<&dyn RewardRelabeler>,
    ) -> Result<Batch> {
        self.sampler.sample(&self.store, batch_size, relabeler)
    }

    /// Expands every transition of `batch` into an `n`-step discounted return.
    pub fn lookahead(
        &self,
        batch: &Batch,
        n: usize,
        gamma: f32,
        relabeler: Option<&dyn RewardRelabeler>,
    ) -> Result<LookaheadBatch> {
        LookaheadExpander::new(&self.store).expand(batch, n, gamma, relabeler)
    }

    /// Samples `batch_size` transitions and expands each of them.
    pub fn lookahead_sample(
        &mut self,
        batch_size: usize,
        n: usize,
        gamma: f32,
        relabeler: Option<&dyn RewardRelabeler>,
    ) -> Result<LookaheadBatch> {
        let batch = self.sample(batch_size, relabeler)?;
        self.lookahead(&batch, n, gamma, relabeler)
    }

    /// Reads the transitions at logical indices `idxs`.
    pub fn batchify(&self, idxs: &[usize]) -> Result<Batch> {
        self.store.batchify(idxs)
    }

    /// Number of retained transitions.
    pub fn num_entries(&self) -> usize {
        self.store.num_entries()
    }

    /// Maximum number of retained transitions.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Logical index of the most recently appended transition.
    pub fn latest_index(&self) -> Result<usize> {
        self.store.latest_index()
    }

    /// Physical slot written by the most recent append.
    pub fn latest_slot(&self) -> Result<usize> {
        self.store.latest_slot()
    }

    /// Underlying store.
    pub fn store(&self) -> &TransitionStore {
        &self.store
    }
}

impl fmt::Display for ReplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReplayBuffer(capacity={})", self.capacity())
    }
}

impl ExperienceBufferBase for ReplayBuffer {
    type Item = Transition;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.append(&tr)
    }

    fn len(&self) -> usize {
        self.num_entries()
    }
}

impl ReplayBufferBase for ReplayBuffer {
    type Config = ReplayBufferConfig;
    type Batch = Batch;

    fn build(config: &Self::Config) -> Result<Self> {
        let store = TransitionStore::new(config.capacity, config.schema.clone())?;
        info!(
            "Built ReplayBuffer(capacity={}) with seed {}",
            config.capacity, config.seed
        );

        Ok(Self {
            store,
            sampler: Sampler::new(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample(size, None)
    }
}

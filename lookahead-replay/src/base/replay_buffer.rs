//! Replay buffer interface.
//!
//! The interface is split in two: [`ExperienceBufferBase`] is what a rollout
//! process needs to store transitions, and [`ReplayBufferBase`] is what a
//! training loop needs to draw batches.
use crate::error::Result;

/// Interface of buffers that store experiences of an environment.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes an item into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the number of stored items.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface of replay buffers that generate batches for training.
pub trait ReplayBufferBase: Sized {
    /// Configuration of the buffer.
    type Config: Clone;

    /// Batch generated for training.
    type Batch;

    /// Builds a replay buffer from its configuration.
    fn build(config: &Self::Config) -> Result<Self>;

    /// Samples a batch of `size` items.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}

#![warn(missing_docs)]
//! A replay buffer for off-policy reinforcement learning with n-step TD lookahead.
//!
//! Transitions are stored as named fields in fixed-capacity rings that move in
//! lockstep. Batches are sampled uniformly and can be expanded into truncated,
//! discounted n-step returns that never cross an episode boundary.
pub mod absorbing;
pub mod error;
pub mod replay_buffer;
pub mod util;

mod base;
pub use absorbing::AbsorbingWrapper;
pub use base::{ExperienceBufferBase, ReplayBufferBase};
pub use error::{ReplayError, Result};
pub use replay_buffer::{
    Batch, LookaheadBatch, LookaheadExpander, OriginalBatch, ReplayBuffer, ReplayBufferConfig,
    RewardRelabeler, RingBuffer, Sampler, Schema, Transition, TransitionStore,
};

//! Replay buffer with n-step TD lookahead.
mod base;
mod batch;
mod config;
mod lookahead;
mod relabel;
mod ring;
mod sampler;
pub mod schema;
mod store;
mod transition;
pub use base::ReplayBuffer;
pub use batch::{Batch, LookaheadBatch, OriginalBatch};
pub use config::ReplayBufferConfig;
pub use lookahead::LookaheadExpander;
pub use relabel::RewardRelabeler;
pub use ring::RingBuffer;
pub use sampler::Sampler;
pub use schema::Schema;
pub use store::TransitionStore;
pub use transition::Transition;

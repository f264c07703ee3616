//! Batches produced by the sampler and the lookahead expander.
use crate::error::{ReplayError, Result};
use ndarray::ArrayD;
use std::collections::BTreeMap;

/// A batch of transitions sampled from a store.
///
/// Every field is a batch-major array of rank 2 or more: a field whose values
/// have shape `s` is stored with shape `[len, s..]`, and logically scalar values
/// are promoted to shape `[len, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    fields: BTreeMap<String, ArrayD<f32>>,

    /// Logical indices the batch was read from.
    idxs: Vec<usize>,
}

impl Batch {
    pub(crate) fn new(fields: BTreeMap<String, ArrayD<f32>>, idxs: Vec<usize>) -> Self {
        Self { fields, idxs }
    }

    /// Returns the number of sampled transitions.
    pub fn len(&self) -> usize {
        self.idxs.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.idxs.is_empty()
    }

    /// Logical indices of the sampled transitions.
    pub fn idxs(&self) -> &[usize] {
        &self.idxs
    }

    /// Returns a field, if present.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.fields.get(name)
    }

    /// Returns a field, failing with [`ReplayError::SchemaMismatch`] if absent.
    pub fn field(&self, name: &str) -> Result<&ArrayD<f32>> {
        self.fields
            .get(name)
            .ok_or_else(|| ReplayError::SchemaMismatch(format!("batch has no field {}", name)))
    }

    /// Field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub(crate) fn replace(&mut self, name: &str, value: ArrayD<f32>) {
        self.fields.insert(name.to_string(), value);
    }

    /// Decomposes the batch into its fields and sampled indices.
    pub fn unpack(self) -> (BTreeMap<String, ArrayD<f32>>, Vec<usize>) {
        (self.fields, self.idxs)
    }
}

/// Unwrapped values of absorbing-state transitions, carried through a lookahead.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalBatch {
    /// First unwrapped observation of each window.
    pub obs0: ArrayD<f32>,

    /// First unwrapped action of each window.
    pub acs: ArrayD<f32>,

    /// Unwrapped observation at the effective end of each window.
    pub obs1: ArrayD<f32>,
}

/// A batch of n-step TD lookahead targets.
///
/// Row `i` aggregates the window of transitions starting at logical index
/// `idxs[i]`. Each window is cut at the first terminal transition, after `n`
/// transitions, or at the newest stored transition, whichever comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct LookaheadBatch {
    /// First observation of each window.
    pub obs0: ArrayD<f32>,

    /// First action of each window.
    pub acs: ArrayD<f32>,

    /// Observation at the effective end of each window.
    pub obs1: ArrayD<f32>,

    /// Next observation of the first transition of each window,
    /// whatever the window length.
    pub obs1_td1: ArrayD<f32>,

    /// Discounted sum of the rewards in each window, shape `[len, 1]`.
    pub rews: ArrayD<f32>,

    /// `1.0` if the window was cut by a terminal transition strictly before its
    /// nominal end, `0.0` otherwise. Shape `[len, 1]`.
    pub dones1: ArrayD<f32>,

    /// Effective number of transitions in each window, shape `[len, 1]`.
    pub td_len: ArrayD<usize>,

    /// Present when the store keeps the unwrapped originals.
    pub originals: Option<OriginalBatch>,

    /// Logical indices the windows start from.
    pub idxs: Vec<usize>,
}

impl LookaheadBatch {
    /// Returns the number of windows.
    pub fn len(&self) -> usize {
        self.idxs.len()
    }

    /// Returns `true` if the batch has no window.
    pub fn is_empty(&self) -> bool {
        self.idxs.is_empty()
    }
}

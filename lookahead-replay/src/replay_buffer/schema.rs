//! Field layout of the transitions stored in a replay buffer.
use crate::error::{ReplayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observation before the action.
pub const OBS0: &str = "obs0";
/// Action.
pub const ACS: &str = "acs";
/// Observation after the action.
pub const OBS1: &str = "obs1";
/// Reward.
pub const REWS: &str = "rews";
/// Terminal flag, `1.0` when the episode ended with this transition.
pub const DONES1: &str = "dones1";
/// [`OBS0`] before absorbing-state wrapping.
pub const OBS0_ORIG: &str = "obs0_orig";
/// [`ACS`] before absorbing-state wrapping.
pub const ACS_ORIG: &str = "acs_orig";
/// [`OBS1`] before absorbing-state wrapping.
pub const OBS1_ORIG: &str = "obs1_orig";
/// Reserved key under which sampled indices are attached to a batch.
pub const IDXS: &str = "idxs";

const ORIGINALS: [&str; 3] = [OBS0_ORIG, ACS_ORIG, OBS1_ORIG];

/// Mapping from field name to the shape of one value of that field.
///
/// Fields are kept in name order so that iteration, and thus batch assembly,
/// is deterministic.
///
/// ```
/// use lookahead_replay::Schema;
///
/// let schema = Schema::transitions(&[3], &[1], false);
/// assert_eq!(schema.shape("obs0"), Some(&[3][..]));
/// assert!(!schema.tracks_originals());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Schema(BTreeMap<String, Vec<usize>>);

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any previous field with the same name.
    pub fn with_field(mut self, name: impl Into<String>, shape: &[usize]) -> Self {
        self.0.insert(name.into(), shape.to_vec());
        self
    }

    /// The standard layout of an off-policy transition.
    ///
    /// With `wrap_absorb`, observations and actions are flattened and carry one
    /// trailing indicator entry, which is `1` for absorbing states, and the
    /// unwrapped values are kept in the `*_orig` fields.
    pub fn transitions(ob_shape: &[usize], ac_shape: &[usize], wrap_absorb: bool) -> Self {
        let schema = Self::new().with_field(REWS, &[1]).with_field(DONES1, &[1]);

        if wrap_absorb {
            schema
                .with_field(OBS0, &with_indicator(ob_shape))
                .with_field(ACS, &with_indicator(ac_shape))
                .with_field(OBS1, &with_indicator(ob_shape))
                .with_field(OBS0_ORIG, ob_shape)
                .with_field(ACS_ORIG, ac_shape)
                .with_field(OBS1_ORIG, ob_shape)
        } else {
            schema
                .with_field(OBS0, ob_shape)
                .with_field(ACS, ac_shape)
                .with_field(OBS1, ob_shape)
        }
    }

    /// Returns the shape of a field.
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.0.get(name).map(|s| s.as_slice())
    }

    /// Returns `true` if the schema has the field.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over field names and shapes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the schema has no field.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the unwrapped originals of absorbing-state transitions are stored.
    pub fn tracks_originals(&self) -> bool {
        ORIGINALS.iter().all(|name| self.contains(name))
    }

    /// Checks that the schema can back a transition store.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ReplayError::InvalidConfig(
                "schema has no field".to_string(),
            ));
        }
        if self.contains(IDXS) {
            return Err(ReplayError::InvalidConfig(format!(
                "{} is a reserved key",
                IDXS
            )));
        }
        for (name, shape) in self.iter() {
            if shape.iter().any(|&d| d == 0) {
                return Err(ReplayError::InvalidConfig(format!(
                    "field {} has a zero-sized dimension: {:?}",
                    name, shape
                )));
            }
        }
        let n_originals = ORIGINALS.iter().filter(|name| self.contains(name)).count();
        if n_originals != 0 && n_originals != ORIGINALS.len() {
            return Err(ReplayError::InvalidConfig(format!(
                "fields {:?} must be all present or all absent",
                ORIGINALS
            )));
        }
        Ok(())
    }

    /// Checks that the fields the lookahead expander reads are present.
    pub(crate) fn require_transition_fields(&self) -> Result<()> {
        for name in [OBS0, ACS, OBS1, REWS, DONES1] {
            if !self.contains(name) {
                return Err(ReplayError::SchemaMismatch(format!(
                    "field {} is required",
                    name
                )));
            }
        }
        for name in [REWS, DONES1] {
            let shape = self.shape(name).unwrap_or(&[]);
            if shape.iter().product::<usize>() != 1 {
                return Err(ReplayError::SchemaMismatch(format!(
                    "field {} must hold one value per transition, got shape {:?}",
                    name, shape
                )));
            }
        }
        Ok(())
    }
}

/// Flattened shape plus one trailing indicator entry.
pub(crate) fn with_indicator(shape: &[usize]) -> Vec<usize> {
    vec![shape.iter().product::<usize>() + 1]
}

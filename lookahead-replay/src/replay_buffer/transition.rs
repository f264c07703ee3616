//! A single transition to be appended to a store.
use super::schema::Schema;
use crate::error::{ReplayError, Result};
use ndarray::{Array1, ArrayD};
use std::collections::BTreeMap;

/// Values of one environment step, keyed by field name.
///
/// ```
/// use lookahead_replay::Transition;
///
/// let tr = Transition::new()
///     .with_slice("obs0", &[0.1, 0.2])
///     .with_slice("acs", &[1.0])
///     .with_slice("obs1", &[0.2, 0.3])
///     .with_scalar("rews", 1.0)
///     .with_scalar("dones1", 0.0);
/// assert_eq!(tr.get("obs0").unwrap().shape(), &[2]);
/// assert_eq!(tr.get("rews").unwrap().shape(), &[1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition(BTreeMap<String, ArrayD<f32>>);

impl Transition {
    /// Creates a transition without any field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field to an array of any shape.
    pub fn with(mut self, name: impl Into<String>, value: ArrayD<f32>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field to a vector of shape `[v.len()]`.
    pub fn with_slice(self, name: impl Into<String>, v: &[f32]) -> Self {
        self.with(name, Array1::from(v.to_vec()).into_dyn())
    }

    /// Sets a field to a scalar stored with shape `[1]`.
    pub fn with_scalar(self, name: impl Into<String>, v: f32) -> Self {
        self.with_slice(name, &[v])
    }

    /// Sets a field, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: ArrayD<f32>) -> Option<ArrayD<f32>> {
        self.0.insert(name.into(), value)
    }

    /// Returns the value of a field.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.0.get(name)
    }

    /// Field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the transition has no field.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that the field set and every shape agree with `schema`.
    pub fn check(&self, schema: &Schema) -> Result<()> {
        let missing = schema
            .names()
            .filter(|name| !self.0.contains_key(*name))
            .collect::<Vec<_>>();
        let unknown = self
            .names()
            .filter(|name| !schema.contains(name))
            .collect::<Vec<_>>();
        if !missing.is_empty() || !unknown.is_empty() {
            return Err(ReplayError::SchemaMismatch(format!(
                "missing fields {:?}, unknown fields {:?}",
                missing, unknown
            )));
        }

        for (name, shape) in schema.iter() {
            let value = &self.0[name];
            if value.shape() != shape {
                return Err(ReplayError::ShapeMismatch {
                    field: name.to_string(),
                    expected: shape.to_vec(),
                    actual: value.shape().to_vec(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::replay_buffer::schema::{ACS, DONES1, OBS0, OBS1, REWS};

    fn transition() -> Transition {
        Transition::new()
            .with_slice(OBS0, &[0.0, 1.0])
            .with_slice(ACS, &[0.5])
            .with_slice(OBS1, &[1.0, 2.0])
            .with_scalar(REWS, 1.0)
            .with_scalar(DONES1, 0.0)
    }

    #[test]
    fn test_check_accepts_matching_transition() {
        let schema = Schema::transitions(&[2], &[1], false);
        assert!(transition().check(&schema).is_ok());
    }

    #[test]
    fn test_check_reports_field_set_differences() {
        let schema = Schema::transitions(&[2], &[1], false);

        let mut tr = transition();
        tr.0.remove(REWS);
        assert!(matches!(tr.check(&schema), Err(ReplayError::SchemaMismatch(_))));

        let tr = transition().with_scalar("extra", 0.0);
        assert!(matches!(tr.check(&schema), Err(ReplayError::SchemaMismatch(_))));
    }

    #[test]
    fn test_check_reports_shape_mismatch() {
        let schema = Schema::transitions(&[2], &[1], false);
        let tr = transition().with_slice(OBS1, &[1.0, 2.0, 3.0]);
        assert_eq!(
            tr.check(&schema).unwrap_err(),
            ReplayError::ShapeMismatch {
                field: OBS1.to_string(),
                expected: vec![2],
                actual: vec![3],
            }
        );
    }
}

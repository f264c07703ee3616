//! Fixed-capacity circular array of one transition field.
use crate::error::{ReplayError, Result};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

/// A circular array of `capacity` elements, each an `f32` array of a fixed shape.
///
/// Elements are addressed by logical index: `0` is the oldest retained element.
/// Logical index `i` lives in physical slot `(start + i) % capacity`.
/// When the buffer is full, appending evicts the element at logical index `0`.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// Name of the field, used in error messages.
    name: String,

    /// Shape of a single element.
    shape: Vec<usize>,

    capacity: usize,

    /// Physical slot of the oldest element.
    start: usize,

    /// Number of retained elements.
    length: usize,

    /// Backing storage of shape `[capacity, shape..]`.
    data: ArrayD<f32>,
}

impl RingBuffer {
    /// Allocates a zero-initialized ring buffer.
    ///
    /// Fails with [`ReplayError::InvalidConfig`] if `capacity` is zero or `shape`
    /// has a zero-sized dimension.
    pub fn new(capacity: usize, shape: &[usize]) -> Result<Self> {
        if capacity == 0 {
            return Err(ReplayError::InvalidConfig(
                "capacity must be positive".to_string(),
            ));
        }
        if shape.iter().any(|&d| d == 0) {
            return Err(ReplayError::InvalidConfig(format!(
                "shape {:?} has a zero-sized dimension",
                shape
            )));
        }

        let mut storage_shape = Vec::with_capacity(shape.len() + 1);
        storage_shape.push(capacity);
        storage_shape.extend_from_slice(shape);

        Ok(Self {
            name: String::new(),
            shape: shape.to_vec(),
            capacity,
            start: 0,
            length: 0,
            data: ArrayD::zeros(IxDyn(&storage_shape)),
        })
    }

    /// Sets the field name reported in errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the current number of elements.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the maximum number of elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the physical slot of the oldest element.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the shape of a single element.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Physical slot of the most recently written element.
    ///
    /// Meaningless, but well defined, before the first append.
    pub fn last_slot(&self) -> usize {
        (self.start + self.capacity + self.length - 1) % self.capacity
    }

    #[inline]
    fn slot(&self, idx: usize) -> usize {
        (self.start + idx) % self.capacity
    }

    #[inline]
    fn check_index(&self, idx: usize) -> Result<()> {
        if idx < self.length {
            Ok(())
        } else {
            Err(ReplayError::IndexOutOfRange {
                idx,
                len: self.length,
            })
        }
    }

    /// Checks that `v` has the shape of an element.
    pub fn check_shape(&self, v: &ArrayViewD<f32>) -> Result<()> {
        if v.shape() == self.shape.as_slice() {
            Ok(())
        } else {
            Err(ReplayError::ShapeMismatch {
                field: self.name.clone(),
                expected: self.shape.clone(),
                actual: v.shape().to_vec(),
            })
        }
    }

    /// Returns the element at logical index `idx`.
    pub fn get(&self, idx: usize) -> Result<ArrayViewD<'_, f32>> {
        self.check_index(idx)?;
        Ok(self.data.index_axis(Axis(0), self.slot(idx)))
    }

    /// Returns the elements at logical indices `idxs`, stacked along a new first axis.
    ///
    /// The indices need not be sorted nor distinct. Each one must be smaller than
    /// [`RingBuffer::len`].
    pub fn get_batch(&self, idxs: &[usize]) -> Result<ArrayD<f32>> {
        let slots = idxs
            .iter()
            .map(|&idx| self.check_index(idx).map(|_| self.slot(idx)))
            .collect::<Result<Vec<_>>>()?;

        if slots.is_empty() {
            let mut shape = vec![0];
            shape.extend_from_slice(&self.shape);
            return Ok(ArrayD::zeros(IxDyn(&shape)));
        }

        Ok(self.data.select(Axis(0), &slots))
    }

    /// Appends `v`, evicting the oldest element if the buffer is full.
    ///
    /// Returns `true` if an element was evicted.
    pub fn append(&mut self, v: ArrayViewD<f32>) -> Result<bool> {
        self.check_shape(&v)?;

        let evicted = if self.length < self.capacity {
            self.length += 1;
            false
        } else {
            self.start = (self.start + 1) % self.capacity;
            true
        };
        let slot = self.slot(self.length - 1);
        self.data.index_axis_mut(Axis(0), slot).assign(&v);

        Ok(evicted)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{arr0, arr1};

    fn scalar(v: ArrayViewD<f32>) -> f32 {
        v.iter().copied().next().unwrap()
    }

    fn scalar_ring(capacity: usize) -> RingBuffer {
        RingBuffer::new(capacity, &[]).unwrap().with_name("rews")
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(matches!(
            RingBuffer::new(0, &[2]),
            Err(ReplayError::InvalidConfig(_))
        ));
        assert!(matches!(
            RingBuffer::new(4, &[2, 0]),
            Err(ReplayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_length_grows_up_to_capacity() {
        let mut ring = scalar_ring(3);
        for i in 0..7 {
            let prev = ring.len();
            let evicted = ring.append(arr0(i as f32).into_dyn().view()).unwrap();
            assert_eq!(ring.len(), (prev + 1).min(3));
            assert_eq!(evicted, i >= 3);
        }
    }

    #[test]
    fn test_wraparound_keeps_last_elements_in_order() {
        let mut ring = scalar_ring(4);
        for i in 0..10 {
            ring.append(arr0(i as f32).into_dyn().view()).unwrap();
        }
        let values = (0..4)
            .map(|i| scalar(ring.get(i).unwrap()))
            .collect::<Vec<_>>();
        assert_eq!(values, vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(ring.start(), 10 % 4);
        assert_eq!(ring.last_slot(), 9 % 4);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut ring = scalar_ring(4);
        assert_eq!(
            ring.get(0).unwrap_err(),
            ReplayError::IndexOutOfRange { idx: 0, len: 0 }
        );
        ring.append(arr0(1.0).into_dyn().view()).unwrap();
        assert!(ring.get(0).is_ok());
        assert_eq!(
            ring.get_batch(&[0, 1]).unwrap_err(),
            ReplayError::IndexOutOfRange { idx: 1, len: 1 }
        );
    }

    #[test]
    fn test_get_batch_vector_elements() {
        let mut ring = RingBuffer::new(3, &[2]).unwrap();
        for i in 0..5 {
            let i = i as f32;
            ring.append(arr1(&[i, -i]).into_dyn().view()).unwrap();
        }
        let batch = ring.get_batch(&[2, 0, 2]).unwrap();
        assert_eq!(batch.shape(), &[3, 2]);
        assert_eq!(
            batch.into_raw_vec(),
            vec![4.0, -4.0, 2.0, -2.0, 4.0, -4.0]
        );
        assert_eq!(ring.get_batch(&[]).unwrap().shape(), &[0, 2]);
    }

    #[test]
    fn test_shape_mismatch_leaves_ring_untouched() {
        let mut ring = RingBuffer::new(3, &[2]).unwrap().with_name("obs0");
        let err = ring.append(arr1(&[1.0, 2.0, 3.0]).into_dyn().view());
        assert_eq!(
            err.unwrap_err(),
            ReplayError::ShapeMismatch {
                field: "obs0".to_string(),
                expected: vec![2],
                actual: vec![3],
            }
        );
        assert!(ring.is_empty());
        assert_eq!(ring.start(), 0);
    }
}

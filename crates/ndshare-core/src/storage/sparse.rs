//! Sparse storage: explicit coordinate/value pairs over an implicit zero fill.
//!
//! A sparse array is made of three logical dense arrays:
//!
//! - `indices`: rank 2, `[capacity, rank]`, one coordinate per stored value
//! - `values`: rank 1, `[capacity]`, parallel to `indices`
//! - `dense_shape`: rank 1, `[rank]`, the logical extents
//!
//! Only the first `stored()` rows of `indices`/`values` are meaningful. The
//! capacity is fixed at creation. A coordinate-to-slot hash index keeps
//! `get`/`set` independent of the number of stored values.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::storage::{SparseArray, Storage};
//!
//! let mut sp = SparseArray::<f32>::new([2, 4], 3).unwrap();
//! sp.set(&[0, 3], 20.0).unwrap();
//! assert_eq!(sp.get(&[0, 3]).unwrap(), 20.0);
//! assert_eq!(sp.get(&[1, 0]).unwrap(), 0.0); // never written
//! assert_eq!(sp.stored(), 1);
//! ```

use super::{DenseArray, Storage, StorageKind};
use crate::dtype::{Element, ElementLayout, TextOptions};
use crate::error::{NdError, NdResult};
use crate::shape::{Coord, Shape};
use std::collections::HashMap;
use std::fmt;

/// Sparse N-dimensional array with a fixed value capacity
pub struct SparseArray<'m, T> {
    shape: Shape,
    indices: DenseArray<'m, i64>,
    values: DenseArray<'m, T>,
    dense_shape: DenseArray<'static, i64>,
    stored: usize,
    lookup: HashMap<Coord, usize>,
    read_only: bool,
}

fn reject_ragged(shape: &Shape) -> NdResult<()> {
    match shape.first_ragged() {
        Some(dim) => Err(NdError::invalid(format!(
            "sparse storage cannot hold ragged dimension {} of shape {}",
            dim, shape
        ))),
        None => Ok(()),
    }
}

impl<T: Element> SparseArray<'static, T> {
    /// Empty sparse array able to store up to `capacity` values
    pub fn new(shape: impl Into<Shape>, capacity: usize) -> NdResult<Self> {
        let shape = shape.into();
        reject_ragged(&shape)?;
        let rank = shape.rank();
        let indices = DenseArray::zeros([capacity, rank])?;
        let values = DenseArray::zeros([capacity])?;
        tracing::debug!(shape = %shape, capacity, dtype = %T::DTYPE, "sparse array created");
        Self::from_parts(indices, values, shape, 0, false)
    }
}

impl SparseArray<'static, String> {
    /// Textual sparse array using the layout selected by `options`
    pub fn text(shape: impl Into<Shape>, capacity: usize, options: TextOptions) -> NdResult<Self> {
        Self::new(shape, capacity)?.with_layout(options.layout())
    }
}

impl<'m, T: Element> SparseArray<'m, T> {
    /// Assemble a sparse array from existing index and value buffers.
    ///
    /// The first `stored` rows are taken as the stored entries; they must be
    /// in bounds and pairwise distinct. The array is read-only if requested
    /// or if either buffer is read-only.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if the buffer shapes do not agree with `shape`
    /// - `CapacityExceeded` if `stored` exceeds the buffer capacity
    /// - `IndexOutOfRange` / `InvalidArgument` for out-of-bounds or duplicate coordinates
    pub fn from_parts(
        indices: DenseArray<'m, i64>,
        values: DenseArray<'m, T>,
        shape: impl Into<Shape>,
        stored: usize,
        read_only: bool,
    ) -> NdResult<Self> {
        let shape = shape.into();
        reject_ragged(&shape)?;
        let extents = shape.extents()?;
        let rank = extents.len();

        if values.rank() != 1 {
            return Err(NdError::shape_mismatch("sparse values rank", 1, values.rank()));
        }
        let capacity = values.as_slice().len();
        if indices.shape() != &Shape::fixed(&[capacity, rank]) {
            return Err(NdError::shape_mismatch(
                "sparse indices",
                capacity * rank,
                indices.as_slice().len(),
            ));
        }
        if stored > capacity {
            return Err(NdError::capacity(capacity, stored));
        }

        let mut lookup = HashMap::with_capacity(stored);
        let raw = indices.as_slice();
        for slot in 0..stored {
            let mut coord = Coord::with_capacity(rank);
            for (dim, &extent) in extents.iter().enumerate() {
                let p = raw[slot * rank + dim];
                let p = usize::try_from(p)
                    .ok()
                    .filter(|&p| p < extent)
                    .ok_or_else(|| NdError::out_of_range_signed(dim, p, extent))?;
                coord.push(p);
            }
            if lookup.insert(coord, slot).is_some() {
                return Err(NdError::invalid(format!(
                    "duplicate sparse coordinate in slot {}",
                    slot
                )));
            }
        }

        let read_only = read_only || indices.is_read_only() || values.is_read_only();
        let dense_shape = DenseArray::from_vec([rank], shape.to_signed())?;
        Ok(Self {
            shape,
            indices,
            values,
            dense_shape,
            stored,
            lookup,
            read_only,
        })
    }

    /// Switch the byte layout of the value buffer
    pub fn with_layout(mut self, layout: ElementLayout) -> NdResult<Self> {
        self.values = self.values.with_layout(layout)?;
        Ok(self)
    }

    /// Mark the array read-only
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Maximum number of stored values
    pub fn capacity(&self) -> usize {
        self.values.as_slice().len()
    }

    /// Number of stored values
    pub fn stored(&self) -> usize {
        self.stored
    }

    /// Rank-2 `[capacity, rank]` coordinate buffer
    pub fn indices(&self) -> &DenseArray<'m, i64> {
        &self.indices
    }

    /// Rank-1 `[capacity]` value buffer
    pub fn values(&self) -> &DenseArray<'m, T> {
        &self.values
    }

    /// Rank-1 `[rank]` logical extents
    pub fn dense_shape(&self) -> &DenseArray<'static, i64> {
        &self.dense_shape
    }

    /// Stored entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (Coord, &T)> + '_ {
        let rank = self.rank();
        let raw = self.indices.as_slice();
        let values = self.values.as_slice();
        (0..self.stored).map(move |slot| {
            let coord = raw[slot * rank..(slot + 1) * rank]
                .iter()
                .map(|&p| p as usize)
                .collect();
            (coord, &values[slot])
        })
    }

    /// Materialise as a dense array
    pub fn to_dense(&self) -> NdResult<DenseArray<'static, T>> {
        let mut dense = DenseArray::zeros(self.shape.clone())?.with_layout(self.layout())?;
        for (coord, value) in self.entries() {
            dense.set(&coord, value.clone())?;
        }
        Ok(dense)
    }

    /// Owned copy that no longer borrows the original buffers
    pub fn to_owned(&self) -> NdResult<SparseArray<'static, T>> {
        SparseArray::from_parts(
            self.indices.to_owned(),
            self.values.to_owned(),
            self.shape.clone(),
            self.stored,
            false,
        )
    }
}

impl<T: Element> Storage for SparseArray<'_, T> {
    type Elem = T;

    fn kind(&self) -> StorageKind {
        StorageKind::Sparse
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn is_stored(&self, coord: &[usize]) -> bool {
        self.lookup.contains_key(coord)
    }

    fn layout(&self) -> ElementLayout {
        self.values.layout()
    }

    fn get(&self, coord: &[usize]) -> NdResult<T> {
        self.shape.check_coordinate(coord)?;
        match self.lookup.get(coord) {
            Some(&slot) => self.values.get(&[slot]),
            None => Ok(T::zero()),
        }
    }

    fn set(&mut self, coord: &[usize], value: T) -> NdResult<()> {
        if self.read_only {
            return Err(NdError::ReadOnly);
        }
        self.shape.check_coordinate(coord)?;
        if let Some(&slot) = self.lookup.get(coord) {
            return self.values.set(&[slot], value);
        }

        let capacity = self.capacity();
        if self.stored == capacity {
            tracing::debug!(capacity, "sparse capacity exhausted");
            return Err(NdError::capacity(capacity, self.stored + 1));
        }

        let slot = self.stored;
        self.values.set(&[slot], value)?;
        for (dim, &p) in coord.iter().enumerate() {
            self.indices.set(&[slot, dim], p as i64)?;
        }
        self.lookup.insert(coord.iter().copied().collect(), slot);
        self.stored += 1;
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseArray")
            .field("shape", &self.shape)
            .field("stored", &self.stored)
            .field("read_only", &self.read_only)
            .field("indices", &self.indices)
            .field("values", &self.values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseArray<'static, f32> {
        let mut sp = SparseArray::new([2, 4], 3).unwrap();
        sp.set(&[0, 0], 10.0).unwrap();
        sp.set(&[0, 3], 20.0).unwrap();
        sp.set(&[1, 1], 30.0).unwrap();
        sp
    }

    #[test]
    fn test_zero_fill_and_row_major_read() {
        let sp = sample();
        let all: Vec<f32> = (0..2)
            .flat_map(|i| (0..4).map(move |j| (i, j)))
            .map(|(i, j)| sp.get(&[i, j]).unwrap())
            .collect();
        assert_eq!(all, vec![10.0, 0.0, 0.0, 20.0, 0.0, 30.0, 0.0, 0.0]);
    }

    #[test]
    fn test_capacity_exhausted() {
        let mut sp = sample();
        assert!(matches!(
            sp.set(&[1, 2], 1.0),
            Err(NdError::CapacityExceeded { capacity: 3, .. })
        ));
        assert!(sp.get(&[2, 1]).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_overwrite_keeps_capacity() {
        let mut sp = sample();
        sp.set(&[0, 3], 25.0).unwrap();
        assert_eq!(sp.get(&[0, 3]).unwrap(), 25.0);
        assert_eq!(sp.stored(), 3);
    }

    #[test]
    fn test_logical_arrays() {
        let sp = sample();
        assert_eq!(sp.indices().shape(), &Shape::fixed(&[3, 2]));
        assert_eq!(sp.indices().as_slice(), &[0, 0, 0, 3, 1, 1]);
        assert_eq!(sp.values().as_slice(), &[10.0, 20.0, 30.0]);
        assert_eq!(sp.dense_shape().as_slice(), &[2, 4]);
    }

    #[test]
    fn test_to_dense() {
        let dense = sample().to_dense().unwrap();
        assert_eq!(
            dense.as_slice(),
            &[10.0, 0.0, 0.0, 20.0, 0.0, 30.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_from_parts_rejects_duplicates() {
        let indices = DenseArray::from_vec([2, 1], vec![1i64, 1]).unwrap();
        let values = DenseArray::from_vec([2], vec![1i32, 2]).unwrap();
        assert!(matches!(
            SparseArray::from_parts(indices, values, [3], 2, false),
            Err(NdError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_from_parts_rejects_out_of_bounds() {
        let indices = DenseArray::from_vec([1, 1], vec![-2i64]).unwrap();
        let values = DenseArray::from_vec([1], vec![1i32]).unwrap();
        let err = SparseArray::from_parts(indices, values, [3], 1, false).unwrap_err();
        assert!(matches!(err, NdError::IndexOutOfRange { index: -2, .. }));
    }

    #[test]
    fn test_read_only() {
        let mut sp = sample().into_read_only();
        assert!(matches!(sp.set(&[0, 0], 1.0), Err(NdError::ReadOnly)));
        assert_eq!(sp.get(&[0, 0]).unwrap(), 10.0);
    }

    #[test]
    fn test_text_values() {
        let mut sp = SparseArray::text([3], 2, TextOptions::default()).unwrap();
        sp.set(&[2], "x".to_string()).unwrap();
        assert_eq!(sp.get(&[0]).unwrap(), "");
        assert_eq!(sp.get(&[2]).unwrap(), "x");
    }
}

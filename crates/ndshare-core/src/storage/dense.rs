//! Dense storage: one contiguous row-major buffer.
//!
//! The buffer is either owned (`Vec<T>`) or borrowed from memory owned by
//! someone else. Borrowed arrays carry the lifetime `'m` of that memory, so
//! an array can never outlive the buffer it reads from.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::storage::{DenseArray, Storage};
//!
//! let mut arr = DenseArray::from_vec([2, 2], vec![1i32, 2, 3, 4]).unwrap();
//! assert_eq!(arr.get(&[1, 0]).unwrap(), 3);
//!
//! arr.set(&[1, 0], 30).unwrap();
//! assert_eq!(arr[&[1, 0][..]], 30);
//!
//! // Borrow someone else's buffer without copying
//! let mut external = vec![0.0f64; 6];
//! {
//!     let mut bound = DenseArray::from_borrowed_mut(&mut external, [2, 3], false).unwrap();
//!     bound.set(&[1, 2], 7.5).unwrap();
//! }
//! assert_eq!(external[5], 7.5);
//! ```

use super::{Storage, StorageKind};
use crate::dtype::{DataType, Element, ElementLayout, TextOptions};
use crate::error::{NdError, NdResult};
use crate::shape::{flat_offset, Coord, Shape};
use scirs2_core::ndarray_ext::{Array, IxDyn};
use std::fmt;
use std::ops::Range;

enum Buffer<'m, T> {
    Owned(Vec<T>),
    Borrowed(&'m [T]),
    BorrowedMut(&'m mut [T]),
}

impl<T> Buffer<'_, T> {
    fn as_slice(&self) -> &[T] {
        match self {
            Buffer::Owned(v) => v,
            Buffer::Borrowed(s) => s,
            Buffer::BorrowedMut(s) => s,
        }
    }

    fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        match self {
            Buffer::Owned(v) => Some(v),
            Buffer::Borrowed(_) => None,
            Buffer::BorrowedMut(s) => Some(s),
        }
    }
}

/// Dense N-dimensional array over a contiguous row-major buffer.
///
/// Invariant: the buffer holds exactly `shape.size()` elements.
pub struct DenseArray<'m, T> {
    shape: Shape,
    strides: Coord,
    buffer: Buffer<'m, T>,
    layout: ElementLayout,
    read_only: bool,
}

fn fixed_extents(shape: &Shape, backend: &str) -> NdResult<(usize, Coord)> {
    if let Some(dim) = shape.first_ragged() {
        return Err(NdError::invalid(format!(
            "{} storage cannot hold ragged dimension {} of shape {}",
            backend, dim, shape
        )));
    }
    Ok((shape.size()?, shape.strides()?))
}

impl<T: Element> DenseArray<'static, T> {
    /// Array of the given shape filled with the element zero value
    pub fn zeros(shape: impl Into<Shape>) -> NdResult<Self> {
        Self::from_elem(shape, T::zero())
    }

    /// Array of the given shape filled with `value`
    pub fn from_elem(shape: impl Into<Shape>, value: T) -> NdResult<Self> {
        let shape = shape.into();
        let (size, _) = fixed_extents(&shape, "dense")?;
        Self::from_vec(shape, vec![value; size])
    }

    /// Array taking ownership of `data`, laid out in row-major order.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the shape has a ragged dimension
    /// - `ShapeMismatch` if `data.len()` differs from the shape's element count
    pub fn from_vec(shape: impl Into<Shape>, data: Vec<T>) -> NdResult<Self> {
        let shape = shape.into();
        let (size, strides) = fixed_extents(&shape, "dense")?;
        if data.len() != size {
            return Err(NdError::shape_mismatch("from_vec", size, data.len()));
        }
        tracing::debug!(shape = %shape, dtype = %T::DTYPE, "dense array created");
        Ok(Self {
            shape,
            strides,
            buffer: Buffer::Owned(data),
            layout: ElementLayout::Natural,
            read_only: false,
        })
    }

    /// Copy an `scirs2_core` ndarray into a new dense array
    pub fn from_ndarray(array: &Array<T, IxDyn>) -> NdResult<Self> {
        Self::from_vec(Shape::fixed(array.shape()), array.iter().cloned().collect())
    }
}

impl DenseArray<'static, String> {
    /// Textual array of empty strings using the layout selected by `options`
    pub fn text(shape: impl Into<Shape>, options: TextOptions) -> NdResult<Self> {
        Self::zeros(shape)?.with_layout(options.layout())
    }
}

impl<'m, T: Element> DenseArray<'m, T> {
    /// Read-only array over a borrowed buffer; no data is copied
    pub fn from_borrowed(data: &'m [T], shape: impl Into<Shape>) -> NdResult<Self> {
        let shape = shape.into();
        let (size, strides) = fixed_extents(&shape, "dense")?;
        if data.len() != size {
            return Err(NdError::shape_mismatch("from_borrowed", size, data.len()));
        }
        Ok(Self {
            shape,
            strides,
            buffer: Buffer::Borrowed(data),
            layout: ElementLayout::Natural,
            read_only: true,
        })
    }

    /// Array over a mutably borrowed buffer; writes go straight to `data`
    pub fn from_borrowed_mut(
        data: &'m mut [T],
        shape: impl Into<Shape>,
        read_only: bool,
    ) -> NdResult<Self> {
        let shape = shape.into();
        let (size, strides) = fixed_extents(&shape, "dense")?;
        if data.len() != size {
            return Err(NdError::shape_mismatch("from_borrowed_mut", size, data.len()));
        }
        Ok(Self {
            shape,
            strides,
            buffer: Buffer::BorrowedMut(data),
            layout: ElementLayout::Natural,
            read_only,
        })
    }

    /// Switch the element byte layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a padded layout is requested for a
    /// non-textual element type, or an existing element does not fit it.
    pub fn with_layout(mut self, layout: ElementLayout) -> NdResult<Self> {
        if matches!(layout, ElementLayout::PaddedText { .. }) && T::DTYPE != DataType::Text {
            return Err(NdError::invalid(format!(
                "padded text layout does not apply to {} elements",
                T::DTYPE
            )));
        }
        for value in self.as_slice() {
            value.check_layout(layout)?;
        }
        self.layout = layout;
        Ok(self)
    }

    /// Mark the array read-only
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Elements in row-major order
    pub fn as_slice(&self) -> &[T] {
        self.buffer.as_slice()
    }

    /// Mutable elements in row-major order
    pub fn as_mut_slice(&mut self) -> NdResult<&mut [T]> {
        if self.read_only {
            return Err(NdError::ReadOnly);
        }
        self.buffer.as_mut_slice().ok_or(NdError::ReadOnly)
    }

    /// Reference to the element at `coord`
    pub fn get_ref(&self, coord: &[usize]) -> NdResult<&T> {
        let offset = self.offset(coord)?;
        Ok(&self.as_slice()[offset])
    }

    /// Whether the buffer is owned rather than borrowed
    pub fn is_owned(&self) -> bool {
        matches!(self.buffer, Buffer::Owned(_))
    }

    /// Row-major strides in elements
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Encoded byte size of the buffer under the current layout
    pub fn byte_size(&self) -> usize {
        match (T::DTYPE.byte_width(), self.layout) {
            (Some(width), _) => width * self.as_slice().len(),
            (None, ElementLayout::PaddedText { width, .. }) => width * self.as_slice().len(),
            (None, ElementLayout::Natural) => self
                .as_slice()
                .iter()
                .map(|v| v.encoded_len(self.layout))
                .sum(),
        }
    }

    /// Consume the array, returning its elements in row-major order
    pub fn into_vec(self) -> Vec<T> {
        match self.buffer {
            Buffer::Owned(v) => v,
            Buffer::Borrowed(s) => s.to_vec(),
            Buffer::BorrowedMut(s) => s.to_vec(),
        }
    }

    /// Owned, writable copy that no longer borrows the original buffer
    pub fn to_owned(&self) -> DenseArray<'static, T> {
        DenseArray {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            buffer: Buffer::Owned(self.as_slice().to_vec()),
            layout: self.layout,
            read_only: false,
        }
    }

    /// Copy into an `scirs2_core` ndarray
    pub fn to_ndarray(&self) -> NdResult<Array<T, IxDyn>> {
        let extents = self.shape.extents()?;
        Array::from_shape_vec(IxDyn(&extents), self.as_slice().to_vec())
            .map_err(|e| NdError::invalid(e.to_string()))
    }

    fn offset(&self, coord: &[usize]) -> NdResult<usize> {
        self.shape.check_coordinate(coord)?;
        Ok(flat_offset(coord, &self.strides))
    }
}

impl<T: Element> Storage for DenseArray<'_, T> {
    type Elem = T;

    fn kind(&self) -> StorageKind {
        StorageKind::Dense
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn total_elements(&self) -> NdResult<usize> {
        Ok(self.as_slice().len())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn layout(&self) -> ElementLayout {
        self.layout
    }

    fn get(&self, coord: &[usize]) -> NdResult<T> {
        self.get_ref(coord).cloned()
    }

    fn set(&mut self, coord: &[usize], value: T) -> NdResult<()> {
        if self.read_only {
            return Err(NdError::ReadOnly);
        }
        let offset = self.offset(coord)?;
        value.check_layout(self.layout)?;
        let data = self.buffer.as_mut_slice().ok_or(NdError::ReadOnly)?;
        data[offset] = value;
        Ok(())
    }

    fn contiguous(&self, range: Range<usize>) -> Option<&[T]> {
        self.as_slice().get(range)
    }

    fn contiguous_mut(&mut self, range: Range<usize>) -> Option<&mut [T]> {
        if self.read_only {
            return None;
        }
        self.buffer.as_mut_slice()?.get_mut(range)
    }
}

impl<T: Element> std::ops::Index<&[usize]> for DenseArray<'_, T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &Self::Output {
        match self.get_ref(index) {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DenseArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseArray")
            .field("shape", &self.shape)
            .field("read_only", &self.read_only)
            .field("owned", &matches!(self.buffer, Buffer::Owned(_)))
            .field("data", &self.buffer.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_roundtrip() {
        let mut arr = DenseArray::<f32>::zeros([2, 3]).unwrap();
        assert_eq!(arr.total_elements().unwrap(), 6);
        assert_eq!(arr.get(&[1, 2]).unwrap(), 0.0);
        arr.set(&[1, 2], 4.5).unwrap();
        assert_eq!(arr.get(&[1, 2]).unwrap(), 4.5);
        assert_eq!(arr.as_slice()[5], 4.5);
    }

    #[test]
    fn test_out_of_range() {
        let mut arr = DenseArray::<i64>::zeros([2, 2]).unwrap();
        assert!(arr.get(&[2, 0]).unwrap_err().is_out_of_range());
        assert!(arr.set(&[0, 2], 1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_wrong_coordinate_length() {
        let arr = DenseArray::<u8>::zeros([2, 2]).unwrap();
        assert!(matches!(
            arr.get(&[1]),
            Err(NdError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        assert!(matches!(
            DenseArray::from_vec([2, 2], vec![1.0f64; 3]),
            Err(NdError::ShapeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_ragged_shape_rejected() {
        let shape = Shape::new(&[2, -1]).unwrap();
        assert!(matches!(
            DenseArray::<f32>::zeros(shape),
            Err(NdError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_scalar() {
        let mut arr = DenseArray::<i32>::zeros(Shape::scalar()).unwrap();
        arr.set(&[], 9).unwrap();
        assert_eq!(arr.get(&[]).unwrap(), 9);
        assert_eq!(arr.total_elements().unwrap(), 1);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let mut arr = DenseArray::<bool>::zeros([2]).unwrap().into_read_only();
        assert!(matches!(arr.set(&[0], true), Err(NdError::ReadOnly)));
        assert!(matches!(arr.as_mut_slice(), Err(NdError::ReadOnly)));
        assert!(arr.contiguous_mut(0..1).is_none());
    }

    #[test]
    fn test_borrowed_is_read_only() {
        let data = [1u8, 2, 3];
        let mut arr = DenseArray::from_borrowed(&data, [3]).unwrap();
        assert!(arr.is_read_only());
        assert!(!arr.is_owned());
        assert_eq!(arr.get(&[2]).unwrap(), 3);
        assert!(matches!(arr.set(&[0], 9), Err(NdError::ReadOnly)));
    }

    #[test]
    fn test_borrowed_mut_writes_through() {
        let mut data = vec![0i32; 4];
        {
            let mut arr = DenseArray::from_borrowed_mut(&mut data, [2, 2], false).unwrap();
            arr.set(&[1, 1], 11).unwrap();
            let owned = arr.to_owned();
            assert!(owned.is_owned());
            assert_eq!(owned.get(&[1, 1]).unwrap(), 11);
        }
        assert_eq!(data, vec![0, 0, 0, 11]);
    }

    #[test]
    fn test_padded_text() {
        let opts = TextOptions::new().element_length(4).padding(b' ');
        let mut arr = DenseArray::text([2], opts).unwrap();
        arr.set(&[0], "abcd".to_string()).unwrap();
        assert!(matches!(
            arr.set(&[1], "abcde".to_string()),
            Err(NdError::InvalidArgument { .. })
        ));
        assert_eq!(arr.byte_size(), 8);
    }

    #[test]
    fn test_padded_layout_requires_text() {
        let layout = ElementLayout::PaddedText {
            width: 4,
            padding: 0,
        };
        assert!(matches!(
            DenseArray::<f32>::zeros([2]).unwrap().with_layout(layout),
            Err(NdError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_ndarray_interop() {
        let arr = DenseArray::from_vec([2, 3], (0..6).map(|v| v as f64).collect()).unwrap();
        let nd = arr.to_ndarray().unwrap();
        assert_eq!(nd.shape(), &[2, 3]);
        assert_eq!(nd[[1, 0].as_slice()], 3.0);

        let back = DenseArray::from_ndarray(&nd).unwrap();
        assert_eq!(back.as_slice(), arr.as_slice());
    }
}

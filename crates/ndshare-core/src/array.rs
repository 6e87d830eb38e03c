//! Backend-polymorphic array handle and its factory options.
//!
//! [`NdArray`] is a tagged variant over the three storage backends. It
//! implements [`Storage`] by delegation, so views, cursors and transfers work
//! on it without knowing the backend.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::array::{ArrayOptions, NdArray};
//! use ndshare_core::shape::Shape;
//! use ndshare_core::storage::{Storage, StorageKind};
//!
//! let opts = ArrayOptions::new().kind(StorageKind::Sparse).capacity(3);
//! let mut arr = NdArray::<f32>::create(Shape::fixed(&[2, 4]), &opts).unwrap();
//! arr.set(&[1, 1], 30.0).unwrap();
//! assert_eq!(arr.get(&[0, 0]).unwrap(), 0.0);
//! assert_eq!(arr.kind(), StorageKind::Sparse);
//! ```

use crate::dtype::{DataType, Element, ElementLayout, TextOptions};
use crate::error::{NdError, NdResult};
use crate::shape::Shape;
use crate::storage::{DenseArray, RaggedArray, SparseArray, Storage, StorageKind};
use std::ops::Range;

/// Construction-time configuration for [`NdArray::create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayOptions {
    /// Storage backend (default: dense)
    pub kind: StorageKind,
    /// Value capacity, required for sparse arrays
    pub capacity: Option<usize>,
    /// Fixed-width text layout, textual arrays only
    pub text: Option<TextOptions>,
    /// Create the array read-only (default: false)
    pub read_only: bool,
}

impl ArrayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage backend
    pub fn kind(mut self, kind: StorageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the sparse value capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set text layout options
    pub fn text(mut self, text: TextOptions) -> Self {
        self.text = Some(text);
        self
    }

    /// Set the read-only flag
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Array over any of the three storage backends
#[derive(Debug)]
pub enum NdArray<'m, T> {
    Dense(DenseArray<'m, T>),
    Sparse(SparseArray<'m, T>),
    Ragged(RaggedArray<T>),
}

impl<T: Element> NdArray<'static, T> {
    /// Create an array of `shape` configured by `options`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the shape is ragged and the kind is not
    ///   `Ragged`, a sparse array has no capacity, or text options are given
    ///   for a non-textual element type
    pub fn create(shape: impl Into<Shape>, options: &ArrayOptions) -> NdResult<Self> {
        let shape = shape.into();
        if let (Some(dim), false) = (shape.first_ragged(), options.kind == StorageKind::Ragged) {
            return Err(NdError::invalid(format!(
                "ragged dimension {} requires ragged storage, got {}",
                dim,
                options.kind.name()
            )));
        }
        let layout = match options.text {
            Some(_) if T::DTYPE != DataType::Text => {
                return Err(NdError::invalid(format!(
                    "text options do not apply to {} arrays",
                    T::DTYPE
                )))
            }
            Some(text) => text.layout(),
            None => ElementLayout::Natural,
        };

        let array = match options.kind {
            StorageKind::Dense => {
                let dense = DenseArray::zeros(shape)?.with_layout(layout)?;
                NdArray::Dense(if options.read_only {
                    dense.into_read_only()
                } else {
                    dense
                })
            }
            StorageKind::Sparse => {
                let capacity = options
                    .capacity
                    .ok_or_else(|| NdError::invalid("sparse arrays require a capacity"))?;
                let sparse = SparseArray::new(shape, capacity)?.with_layout(layout)?;
                NdArray::Sparse(if options.read_only {
                    sparse.into_read_only()
                } else {
                    sparse
                })
            }
            StorageKind::Ragged => {
                if layout != ElementLayout::Natural {
                    return Err(NdError::invalid("ragged arrays use the natural text layout"));
                }
                let mut ragged = RaggedArray::new(shape)?;
                if options.read_only {
                    ragged.finalize();
                }
                NdArray::Ragged(ragged)
            }
        };
        Ok(array)
    }
}

impl<'m, T: Element> NdArray<'m, T> {
    pub fn as_dense(&self) -> Option<&DenseArray<'m, T>> {
        match self {
            NdArray::Dense(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dense_mut(&mut self) -> Option<&mut DenseArray<'m, T>> {
        match self {
            NdArray::Dense(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sparse(&self) -> Option<&SparseArray<'m, T>> {
        match self {
            NdArray::Sparse(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sparse_mut(&mut self) -> Option<&mut SparseArray<'m, T>> {
        match self {
            NdArray::Sparse(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_ragged(&self) -> Option<&RaggedArray<T>> {
        match self {
            NdArray::Ragged(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_ragged_mut(&mut self) -> Option<&mut RaggedArray<T>> {
        match self {
            NdArray::Ragged(a) => Some(a),
            _ => None,
        }
    }
}

impl<'m, T> From<DenseArray<'m, T>> for NdArray<'m, T> {
    fn from(array: DenseArray<'m, T>) -> Self {
        NdArray::Dense(array)
    }
}

impl<'m, T> From<SparseArray<'m, T>> for NdArray<'m, T> {
    fn from(array: SparseArray<'m, T>) -> Self {
        NdArray::Sparse(array)
    }
}

impl<T> From<RaggedArray<T>> for NdArray<'_, T> {
    fn from(array: RaggedArray<T>) -> Self {
        NdArray::Ragged(array)
    }
}

macro_rules! delegate {
    ($self:expr, $a:ident => $body:expr) => {
        match $self {
            NdArray::Dense($a) => $body,
            NdArray::Sparse($a) => $body,
            NdArray::Ragged($a) => $body,
        }
    };
}

impl<T: Element> Storage for NdArray<'_, T> {
    type Elem = T;

    fn kind(&self) -> StorageKind {
        delegate!(self, a => a.kind())
    }

    fn shape(&self) -> &Shape {
        delegate!(self, a => a.shape())
    }

    fn total_elements(&self) -> NdResult<usize> {
        delegate!(self, a => a.total_elements())
    }

    fn is_read_only(&self) -> bool {
        delegate!(self, a => a.is_read_only())
    }

    fn is_stored(&self, coord: &[usize]) -> bool {
        delegate!(self, a => a.is_stored(coord))
    }

    fn layout(&self) -> ElementLayout {
        delegate!(self, a => a.layout())
    }

    fn get(&self, coord: &[usize]) -> NdResult<T> {
        delegate!(self, a => a.get(coord))
    }

    fn set(&mut self, coord: &[usize], value: T) -> NdResult<()> {
        delegate!(self, a => a.set(coord, value))
    }

    fn contiguous(&self, range: Range<usize>) -> Option<&[T]> {
        delegate!(self, a => a.contiguous(range))
    }

    fn contiguous_mut(&mut self, range: Range<usize>) -> Option<&mut [T]> {
        delegate!(self, a => a.contiguous_mut(range))
    }
}

//! Storage backends implementing the common element access contract.
//!
//! Three strategies are provided:
//!
//! - [`DenseArray`]: one contiguous row-major buffer, owned or borrowed
//! - [`SparseArray`]: coordinate/value pairs over an implicit zero fill, with
//!   a fixed value capacity
//! - [`RaggedArray`]: a tree with one level per dimension, growable along
//!   ragged dimensions
//!
//! All of them implement [`Storage`]; views and bulk transfers are written
//! against the trait and work with any backend.

pub mod dense;
pub mod ragged;
pub mod sparse;

pub use dense::DenseArray;
pub use ragged::{RaggedArray, RaggedParts};
pub use sparse::SparseArray;

use crate::dtype::{Element, ElementLayout};
use crate::error::NdResult;
use crate::index::{Index, ViewDescriptor};
use crate::shape::Shape;
use crate::view::{NdView, NdViewMut};
use std::ops::Range;

/// Storage strategy of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageKind {
    #[default]
    Dense,
    Sparse,
    Ragged,
}

impl StorageKind {
    /// Short lowercase name, used in error messages
    pub const fn name(&self) -> &'static str {
        match self {
            StorageKind::Dense => "dense",
            StorageKind::Sparse => "sparse",
            StorageKind::Ragged => "ragged",
        }
    }
}

/// Element access contract shared by every backend.
///
/// Coordinates are full (one component per dimension). Out-of-bounds
/// components fail with `IndexOutOfRange`, coordinates of the wrong length
/// with `InvalidArgument`, and writes on read-only storage with `ReadOnly`.
pub trait Storage {
    type Elem: Element;

    /// Storage strategy
    fn kind(&self) -> StorageKind;

    /// Logical shape
    fn shape(&self) -> &Shape;

    /// Number of dimensions
    fn rank(&self) -> usize {
        self.shape().rank()
    }

    /// Total element count; `UndefinedSize` for ragged shapes
    fn total_elements(&self) -> NdResult<usize> {
        self.shape().size()
    }

    fn is_read_only(&self) -> bool;

    /// Whether `coord` holds a materialised value. Only sparse storage has
    /// implicit zeros; every other backend answers `true`.
    fn is_stored(&self, _coord: &[usize]) -> bool {
        true
    }

    /// Byte layout used by stream transfers
    fn layout(&self) -> ElementLayout {
        ElementLayout::Natural
    }

    /// Read the element at `coord`
    fn get(&self, coord: &[usize]) -> NdResult<Self::Elem>;

    /// Write the element at `coord`
    fn set(&mut self, coord: &[usize], value: Self::Elem) -> NdResult<()>;

    /// Borrow a run of elements in row-major order, if the backend stores
    /// them contiguously.
    fn contiguous(&self, _range: Range<usize>) -> Option<&[Self::Elem]> {
        None
    }

    /// Mutable counterpart of [`contiguous`](Storage::contiguous); `None` on
    /// read-only storage.
    fn contiguous_mut(&mut self, _range: Range<usize>) -> Option<&mut [Self::Elem]> {
        None
    }
}

/// View construction for every [`Storage`].
///
/// # Examples
///
/// ```
/// use ndshare_core::index;
/// use ndshare_core::storage::{DenseArray, Storage, StorageExt};
///
/// let mut arr = DenseArray::<f32>::zeros([2, 3]).unwrap();
/// arr.set(&[0, 1], 5.0).unwrap();
///
/// let column = arr.slice(&[index::all(), index::at(1)]).unwrap();
/// assert_eq!(column.shape(), &[2]);
/// assert_eq!(column.get(&[0]).unwrap(), 5.0);
/// ```
pub trait StorageExt: Storage {
    /// View of the whole array
    fn view(&self) -> NdResult<NdView<'_, Self>> {
        Ok(NdView::new(self, ViewDescriptor::identity(self.shape())?))
    }

    /// Mutable view of the whole array
    fn view_mut(&mut self) -> NdResult<NdViewMut<'_, Self>> {
        let desc = ViewDescriptor::identity(self.shape())?;
        Ok(NdViewMut::new(self, desc))
    }

    /// Zero-copy sub-array selected by `indices`
    fn slice(&self, indices: &[Index]) -> NdResult<NdView<'_, Self>> {
        self.view()?.slice(indices)
    }

    /// Mutable zero-copy sub-array selected by `indices`
    fn slice_mut(&mut self, indices: &[Index]) -> NdResult<NdViewMut<'_, Self>> {
        let desc = ViewDescriptor::identity(self.shape())?.slice(indices)?;
        Ok(NdViewMut::new(self, desc))
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

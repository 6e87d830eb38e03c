//! Zero-copy views over storage backends.
//!
//! A view pairs a borrowed backend with a [`ViewDescriptor`]. Every access
//! translates the view's local coordinates into backend coordinates before
//! delegating; slicing a view composes descriptors and never copies data.
//!
//! The borrow of the backend is held for the view's lifetime, so a backend
//! always outlives the views derived from it, and a mutable view excludes
//! every other access to its backend.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::index;
//! use ndshare_core::storage::{DenseArray, StorageExt};
//!
//! let arr = DenseArray::from_vec([3, 4], (0..12).collect::<Vec<i32>>()).unwrap();
//! let view = arr.view().unwrap();
//!
//! // Rows 0 and 2, columns 1 and 3
//! let sub = view.slice(&[index::even(), index::odd()]).unwrap();
//! assert_eq!(sub.to_vec().unwrap(), vec![1, 3, 9, 11]);
//!
//! // Leading-axis iteration yields rank-1 views
//! let firsts: Vec<i32> = sub.elements().map(|row| row.get(&[0]).unwrap()).collect();
//! assert_eq!(firsts, vec![1, 9]);
//! ```

mod cursor;
mod iter;

pub use cursor::{ScalarCursor, ScalarCursorMut};
pub use iter::Elements;

use crate::dtype::Element;
use crate::error::{NdError, NdResult};
use crate::index::{self, Index, ViewDescriptor};
use crate::shape::{Coordinates, Shape};
use crate::storage::{DenseArray, Storage};
use scirs2_core::ndarray_ext::{Array, IxDyn};
use std::fmt;

fn prefix_indices(prefix: &[usize]) -> Vec<Index> {
    prefix.iter().map(|&i| index::at(i)).collect()
}

/// Read-only view of a storage backend
pub struct NdView<'a, S: ?Sized> {
    storage: &'a S,
    desc: ViewDescriptor,
}

impl<S: ?Sized> Clone for NdView<'_, S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage,
            desc: self.desc.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for NdView<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdView")
            .field("shape", &self.desc.shape())
            .finish_non_exhaustive()
    }
}

impl<'a, S: Storage + ?Sized> NdView<'a, S> {
    /// View of `storage` through `desc`.
    ///
    /// `desc` must have been resolved against the shape of `storage`.
    pub fn new(storage: &'a S, desc: ViewDescriptor) -> Self {
        Self { storage, desc }
    }

    /// Extents of the view
    pub fn shape(&self) -> &[usize] {
        self.desc.shape()
    }

    pub fn rank(&self) -> usize {
        self.desc.rank()
    }

    /// Number of elements in the view
    pub fn len(&self) -> usize {
        self.desc.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the underlying backend is read-only
    pub fn is_read_only(&self) -> bool {
        self.storage.is_read_only()
    }

    /// Read the element at local coordinate `coord`
    pub fn get(&self, coord: &[usize]) -> NdResult<S::Elem> {
        self.storage.get(&self.desc.source_coord(coord)?)
    }

    /// Value of a rank-0 view
    pub fn scalar(&self) -> NdResult<S::Elem> {
        if self.rank() != 0 {
            return Err(NdError::invalid(format!(
                "scalar access on a view of rank {}",
                self.rank()
            )));
        }
        self.get(&[])
    }

    /// Sub-view selected by `indices`, validated against this view's extents
    pub fn slice(&self, indices: &[Index]) -> NdResult<NdView<'a, S>> {
        Ok(NdView {
            storage: self.storage,
            desc: self.desc.slice(indices)?,
        })
    }

    /// Sub-view anchored at the leading coordinate `prefix`
    pub fn at(&self, prefix: &[usize]) -> NdResult<NdView<'a, S>> {
        self.slice(&prefix_indices(prefix))
    }

    /// Lazy sequence of views one rank lower, one per leading-axis position.
    ///
    /// Each call starts a fresh sequence. A rank-0 view has no leading axis
    /// and yields nothing.
    pub fn elements(&self) -> Elements<'a, S> {
        if self.rank() == 0 {
            return Elements::empty(self.clone());
        }
        Elements::new(self.clone(), &self.shape()[..1])
    }

    /// Views for every coordinate of the first `depth + 1` dimensions, in
    /// row-major order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `depth >= rank`.
    pub fn elements_at_depth(&self, depth: usize) -> NdResult<Elements<'a, S>> {
        if depth >= self.rank() {
            return Err(NdError::invalid(format!(
                "depth {} is not below view rank {}",
                depth,
                self.rank()
            )));
        }
        Ok(Elements::new(self.clone(), &self.shape()[..=depth]))
    }

    /// Sequential reader over the flattened elements, row-major
    pub fn cursor(&self) -> ScalarCursor<'a, S> {
        ScalarCursor::new(self.clone())
    }

    /// Elements in row-major order
    pub fn to_vec(&self) -> NdResult<Vec<S::Elem>> {
        if let Some(run) = self
            .desc
            .contiguous_range()
            .and_then(|range| self.storage.contiguous(range))
        {
            return Ok(run.to_vec());
        }
        Coordinates::new(self.shape())
            .map(|coord| self.get(&coord))
            .collect()
    }

    /// Materialise as an owned dense array with the backend's element layout
    pub fn to_dense(&self) -> NdResult<DenseArray<'static, S::Elem>> {
        DenseArray::from_vec(Shape::fixed(self.shape()), self.to_vec()?)?
            .with_layout(self.storage.layout())
    }

    /// Materialise as an `scirs2_core` ndarray
    pub fn to_ndarray(&self) -> NdResult<Array<S::Elem, IxDyn>> {
        Array::from_shape_vec(IxDyn(self.shape()), self.to_vec()?)
            .map_err(|e| NdError::invalid(e.to_string()))
    }

    /// Underlying backend
    pub fn storage(&self) -> &'a S {
        self.storage
    }

    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.desc
    }
}

/// Mutable view of a storage backend
pub struct NdViewMut<'a, S: ?Sized> {
    storage: &'a mut S,
    desc: ViewDescriptor,
}

impl<S: ?Sized> fmt::Debug for NdViewMut<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdViewMut")
            .field("shape", &self.desc.shape())
            .finish_non_exhaustive()
    }
}

impl<'a, S: Storage + ?Sized> NdViewMut<'a, S> {
    /// Mutable view of `storage` through `desc`
    pub fn new(storage: &'a mut S, desc: ViewDescriptor) -> Self {
        Self { storage, desc }
    }

    pub fn shape(&self) -> &[usize] {
        self.desc.shape()
    }

    pub fn rank(&self) -> usize {
        self.desc.rank()
    }

    pub fn len(&self) -> usize {
        self.desc.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_read_only(&self) -> bool {
        self.storage.is_read_only()
    }

    /// Read the element at local coordinate `coord`
    pub fn get(&self, coord: &[usize]) -> NdResult<S::Elem> {
        self.storage.get(&self.desc.source_coord(coord)?)
    }

    /// Write the element at local coordinate `coord`
    pub fn set(&mut self, coord: &[usize], value: S::Elem) -> NdResult<()> {
        let source = self.desc.source_coord(coord)?;
        self.storage.set(&source, value)
    }

    /// Write `value` at local coordinate `coord` unless it is a zero landing
    /// on an unstored sparse coordinate, which already reads as zero.
    /// Returns whether the backend was written.
    pub fn assign(&mut self, coord: &[usize], value: S::Elem) -> NdResult<bool> {
        if self.storage.is_read_only() {
            return Err(NdError::ReadOnly);
        }
        let source = self.desc.source_coord(coord)?;
        if !self.storage.is_stored(&source) && value == S::Elem::zero() {
            return Ok(false);
        }
        self.storage.set(&source, value)?;
        Ok(true)
    }

    /// Mutable sub-view selected by `indices`; borrows this view
    pub fn slice_mut(&mut self, indices: &[Index]) -> NdResult<NdViewMut<'_, S>> {
        let desc = self.desc.slice(indices)?;
        Ok(NdViewMut {
            storage: &mut *self.storage,
            desc,
        })
    }

    /// Mutable sub-view anchored at the leading coordinate `prefix`
    pub fn at_mut(&mut self, prefix: &[usize]) -> NdResult<NdViewMut<'_, S>> {
        self.slice_mut(&prefix_indices(prefix))
    }

    /// Read-only view of the same elements
    pub fn as_view(&self) -> NdView<'_, S> {
        NdView {
            storage: &*self.storage,
            desc: self.desc.clone(),
        }
    }

    /// Sequential reader/writer over the flattened elements, row-major
    pub fn cursor_mut(&mut self) -> ScalarCursorMut<'_, S> {
        ScalarCursorMut::new(&mut *self.storage, self.desc.clone())
    }

    /// Set every element of the view to `value`
    pub fn fill(&mut self, value: S::Elem) -> NdResult<()> {
        if self.storage.is_read_only() {
            return Err(NdError::ReadOnly);
        }
        value.check_layout(self.storage.layout())?;
        if let Some(range) = self.desc.contiguous_range() {
            if let Some(run) = self.storage.contiguous_mut(range) {
                run.fill(value);
                return Ok(());
            }
        }
        for coord in Coordinates::new(self.desc.shape()) {
            self.assign(&coord, value.clone())?;
        }
        Ok(())
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut *self.storage
    }

    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.desc
    }
}

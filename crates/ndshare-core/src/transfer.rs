//! Bulk transfers between views and flat containers.
//!
//! Every transfer visits source and destination at most once, in row-major
//! order. When both sides are a single contiguous run of a backend buffer
//! (a whole dense array, or a slice whose trailing dimensions are kept whole)
//! the copy is one slice operation; otherwise it falls back to per-element
//! access.
//!
//! Flat containers are addressed with 32-bit indices: a transfer into or
//! out of a slice fails with `CapacityExceeded` when the element count does
//! not fit [`FLAT_CONTAINER_LIMIT`], even though views themselves may be
//! larger. Byte streams have no such limit.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::index;
//! use ndshare_core::storage::{DenseArray, StorageExt};
//!
//! let src = DenseArray::from_vec([2, 3], vec![1i64, 2, 3, 4, 5, 6]).unwrap();
//! let column = src.slice(&[index::all(), index::at(2)]).unwrap();
//!
//! let mut flat = [0i64; 4];
//! column.copy_into(&mut flat, 1).unwrap();
//! assert_eq!(flat, [0, 3, 6, 0]);
//!
//! let mut dst = DenseArray::<i64>::zeros([3, 2]).unwrap();
//! dst.view_mut().unwrap().copy_from(&src.view().unwrap()).unwrap();
//! assert_eq!(dst.as_slice(), src.as_slice());
//! ```

use crate::dtype::{Element, ElementLayout};
use crate::error::{NdError, NdResult};
use crate::shape::Coordinates;
use crate::storage::Storage;
use crate::view::{NdView, NdViewMut};

/// Largest element count addressable in a flat container
pub const FLAT_CONTAINER_LIMIT: usize = i32::MAX as usize;

fn check_flat_count(count: usize) -> NdResult<()> {
    if count > FLAT_CONTAINER_LIMIT {
        return Err(NdError::capacity(FLAT_CONTAINER_LIMIT, count));
    }
    Ok(())
}

fn check_run<T: Element>(values: &[T], layout: ElementLayout) -> NdResult<()> {
    values.iter().try_for_each(|value| value.check_layout(layout))
}

impl<S: Storage + ?Sized> NdView<'_, S> {
    /// Write this view's elements in row-major order into `dst`, starting at
    /// flat position `offset`. Returns the number of elements written.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if the element count exceeds
    /// [`FLAT_CONTAINER_LIMIT`] or does not fit in `dst` after `offset`.
    pub fn copy_into(&self, dst: &mut [S::Elem], offset: usize) -> NdResult<usize> {
        let count = self.len();
        check_flat_count(count)?;
        let room = dst.len().min(FLAT_CONTAINER_LIMIT).saturating_sub(offset);
        if room < count {
            return Err(NdError::capacity(room, count));
        }
        let dst = &mut dst[offset..offset + count];

        if let Some(run) = self
            .descriptor()
            .contiguous_range()
            .and_then(|range| self.storage().contiguous(range))
        {
            tracing::trace!(count, "copy_into: contiguous");
            dst.clone_from_slice(run);
            return Ok(count);
        }

        tracing::trace!(count, "copy_into: per element");
        for (slot, coord) in dst.iter_mut().zip(Coordinates::new(self.shape())) {
            *slot = self.get(&coord)?;
        }
        Ok(count)
    }

    /// Copy this view's elements into `dst`, pairing elements in row-major
    /// order. Shapes may differ as long as the element counts agree.
    pub fn copy_to<D>(&self, dst: &mut NdViewMut<'_, D>) -> NdResult<usize>
    where
        D: Storage<Elem = S::Elem> + ?Sized,
    {
        dst.copy_from(self)
    }

    /// Exact number of bytes a stream write of this view produces
    pub fn encoded_len(&self) -> NdResult<usize> {
        let layout = self.storage().layout();
        if let Some(width) = <S::Elem as Element>::DTYPE.byte_width() {
            return Ok(width * self.len());
        }
        let mut total = 0;
        for value in self.cursor() {
            total += value?.encoded_len(layout);
        }
        Ok(total)
    }
}

impl<S: Storage + ?Sized> NdViewMut<'_, S> {
    /// Overwrite this view's elements in row-major order with elements of
    /// `src` starting at flat position `offset`. Returns the number of
    /// elements read.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if the element count exceeds [`FLAT_CONTAINER_LIMIT`]
    /// - `ShapeMismatch` if `src` holds fewer elements than the view after `offset`
    /// - `ReadOnly` if the backend is read-only
    /// - `InvalidArgument` if a value does not fit the backend's element layout
    pub fn copy_from_slice(&mut self, src: &[S::Elem], offset: usize) -> NdResult<usize> {
        let count = self.len();
        check_flat_count(count)?;
        let available = src.len().saturating_sub(offset);
        if available < count {
            return Err(NdError::shape_mismatch("copy_from_slice", count, available));
        }
        if self.is_read_only() {
            return Err(NdError::ReadOnly);
        }
        let src = &src[offset..offset + count];

        if let Some(range) = self.descriptor().contiguous_range() {
            let layout = self.as_view().storage().layout();
            if let Some(run) = self.storage_mut().contiguous_mut(range) {
                check_run(src, layout)?;
                tracing::trace!(count, "copy_from_slice: contiguous");
                run.clone_from_slice(src);
                return Ok(count);
            }
        }

        tracing::trace!(count, "copy_from_slice: per element");
        for (value, coord) in src.iter().zip(Coordinates::new(self.shape())) {
            self.assign(&coord, value.clone())?;
        }
        Ok(count)
    }

    /// Overwrite this view's elements with those of `src`, pairing elements
    /// in row-major order. Zeros landing on unstored sparse coordinates are
    /// skipped, as in [`NdViewMut::assign`].
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if the element counts differ
    /// - `ReadOnly` if the backend is read-only
    pub fn copy_from<R>(&mut self, src: &NdView<'_, R>) -> NdResult<usize>
    where
        R: Storage<Elem = S::Elem> + ?Sized,
    {
        let count = self.len();
        if src.len() != count {
            return Err(NdError::shape_mismatch("copy_from", count, src.len()));
        }
        if self.is_read_only() {
            return Err(NdError::ReadOnly);
        }

        let src_run = src
            .descriptor()
            .contiguous_range()
            .and_then(|range| src.storage().contiguous(range));
        if let (Some(run), Some(range)) = (src_run, self.descriptor().contiguous_range()) {
            let layout = self.as_view().storage().layout();
            if let Some(dst) = self.storage_mut().contiguous_mut(range) {
                check_run(run, layout)?;
                tracing::trace!(count, "copy_from: contiguous");
                dst.clone_from_slice(run);
                return Ok(count);
            }
        }

        tracing::trace!(count, "copy_from: per element");
        let pairs = Coordinates::new(src.shape()).zip(Coordinates::new(self.shape()));
        for (from, to) in pairs {
            self.assign(&to, src.get(&from)?)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::TextOptions;
    use crate::index::{all, at, even, range};
    use crate::storage::{DenseArray, SparseArray, StorageExt};

    fn grid() -> DenseArray<'static, i32> {
        DenseArray::from_vec([3, 4], (0..12).collect()).unwrap()
    }

    #[test]
    fn test_copy_into_contiguous_and_strided() {
        let arr = grid();
        let mut flat = vec![0; 8];
        arr.slice(&[range(1, 3)]).unwrap().copy_into(&mut flat, 0).unwrap();
        assert_eq!(flat, (4..12).collect::<Vec<_>>());

        let mut flat = vec![0; 6];
        let n = arr
            .slice(&[even(), range(1, 4)])
            .unwrap()
            .copy_into(&mut flat, 0)
            .unwrap();
        assert_eq!(n, 6);
        assert_eq!(flat, vec![1, 2, 3, 9, 10, 11]);
    }

    #[test]
    fn test_copy_into_too_small() {
        let arr = grid();
        let mut flat = vec![0; 12];
        assert!(matches!(
            arr.view().unwrap().copy_into(&mut flat, 1),
            Err(NdError::CapacityExceeded { capacity: 11, requested: 12 })
        ));
    }

    #[test]
    fn test_copy_into_count_above_flat_limit() {
        // Sparse storage lets the view exceed the limit without allocating
        let sp = SparseArray::<u8>::new([FLAT_CONTAINER_LIMIT + 1], 0).unwrap();
        let mut flat = [0u8; 4];
        assert!(matches!(
            sp.view().unwrap().copy_into(&mut flat, 0),
            Err(NdError::CapacityExceeded { capacity: FLAT_CONTAINER_LIMIT, .. })
        ));
    }

    #[test]
    fn test_copy_from_slice_with_offset() {
        let mut arr = grid();
        let src: Vec<i32> = (100..110).collect();
        arr.slice_mut(&[all(), at(0)])
            .unwrap()
            .copy_from_slice(&src, 2)
            .unwrap();
        assert_eq!(arr.get(&[0, 0]).unwrap(), 102);
        assert_eq!(arr.get(&[2, 0]).unwrap(), 104);
        assert_eq!(arr.get(&[2, 1]).unwrap(), 9);
    }

    #[test]
    fn test_copy_from_slice_too_short() {
        let mut arr = grid();
        assert!(matches!(
            arr.view_mut().unwrap().copy_from_slice(&[1, 2, 3], 0),
            Err(NdError::ShapeMismatch { expected: 12, actual: 3, .. })
        ));
    }

    #[test]
    fn test_copy_from_view_reshapes_row_major() {
        let src = grid();
        let mut dst = DenseArray::<i32>::zeros([2, 6]).unwrap();
        dst.view_mut()
            .unwrap()
            .copy_from(&src.view().unwrap())
            .unwrap();
        assert_eq!(dst.get(&[1, 0]).unwrap(), 6);
    }

    #[test]
    fn test_copy_from_count_mismatch() {
        let src = grid();
        let mut dst = DenseArray::<i32>::zeros([5]).unwrap();
        assert!(matches!(
            dst.view_mut().unwrap().copy_from(&src.view().unwrap()),
            Err(NdError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_copy_to_sparse() {
        let src = DenseArray::from_vec([4], vec![0.0f32, 1.5, 0.0, 2.5]).unwrap();
        let mut sp = SparseArray::<f32>::new([4], 4).unwrap();
        src.view()
            .unwrap()
            .copy_to(&mut sp.view_mut().unwrap())
            .unwrap();
        assert_eq!(sp.get(&[3]).unwrap(), 2.5);
    }

    #[test]
    fn test_copy_into_read_only_destination() {
        let src = grid();
        let mut dst = DenseArray::<i32>::zeros([12]).unwrap().into_read_only();
        assert!(matches!(
            dst.view_mut().unwrap().copy_from(&src.view().unwrap()),
            Err(NdError::ReadOnly)
        ));
    }

    #[test]
    fn test_encoded_len() {
        let arr = grid();
        assert_eq!(arr.view().unwrap().encoded_len().unwrap(), 48);
        let text = DenseArray::from_vec([2], vec!["ab".to_string(), String::new()]).unwrap();
        assert_eq!(text.view().unwrap().encoded_len().unwrap(), 4 + 2 + 4);
    }

    #[test]
    fn test_padded_text_rejects_long_values_in_bulk() {
        let opts = TextOptions::new().element_length(2);
        let mut arr = DenseArray::text([2], opts).unwrap();

        let long = ["toolong".to_string(), "x".to_string()];
        assert!(matches!(
            arr.view_mut().unwrap().copy_from_slice(&long, 0),
            Err(NdError::InvalidArgument { .. })
        ));

        let src = DenseArray::from_vec([2], long.to_vec()).unwrap();
        assert!(matches!(
            arr.view_mut().unwrap().copy_from(&src.view().unwrap()),
            Err(NdError::InvalidArgument { .. })
        ));
        assert_eq!(arr.as_slice(), &[String::new(), String::new()]);

        let short = ["ab".to_string(), "c".to_string()];
        arr.view_mut().unwrap().copy_from_slice(&short, 0).unwrap();
        assert_eq!(arr.as_slice(), &short);
    }

    #[test]
    fn test_copy_from_skips_zeros_into_sparse() {
        let src = DenseArray::from_vec([2, 3], vec![0i64, 7, 0, 0, 0, 9]).unwrap();
        let mut sp = SparseArray::<i64>::new([2, 3], 2).unwrap();
        let n = sp
            .view_mut()
            .unwrap()
            .copy_from(&src.view().unwrap())
            .unwrap();
        assert_eq!(n, 6);
        assert_eq!(sp.stored(), 2);

        // A zero over a stored coordinate still overwrites it
        sp.view_mut()
            .unwrap()
            .copy_from_slice(&[0, 0, 0, 0, 0, 0], 0)
            .unwrap();
        assert_eq!(sp.get(&[0, 1]).unwrap(), 0);
        assert_eq!(sp.stored(), 2);
    }
}

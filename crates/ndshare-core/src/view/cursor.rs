use super::NdView;
use crate::error::{NdError, NdResult};
use crate::index::ViewDescriptor;
use crate::shape::{Coord, Coordinates};
use crate::storage::Storage;

/// Sequential reader over a view's flattened elements, row-major.
///
/// Every call to [`NdView::cursor`] starts a fresh cursor; no position is
/// shared between cursors.
///
/// # Examples
///
/// ```
/// use ndshare_core::storage::{DenseArray, StorageExt};
///
/// let arr = DenseArray::from_vec([2], vec![1.0f32, 2.0]).unwrap();
/// let view = arr.view().unwrap();
/// let mut cursor = view.cursor();
/// assert_eq!(cursor.next_value().unwrap(), 1.0);
/// assert_eq!(cursor.next_value().unwrap(), 2.0);
/// assert!(cursor.next_value().is_err());
/// ```
pub struct ScalarCursor<'a, S: ?Sized> {
    view: NdView<'a, S>,
    coords: Coordinates,
    position: usize,
}

impl<'a, S: Storage + ?Sized> ScalarCursor<'a, S> {
    pub(super) fn new(view: NdView<'a, S>) -> Self {
        let coords = Coordinates::new(view.shape());
        Self {
            view,
            coords,
            position: 0,
        }
    }

    /// Read the next element and advance.
    ///
    /// # Errors
    ///
    /// Returns `EndOfData` once every element has been read.
    pub fn next_value(&mut self) -> NdResult<S::Elem> {
        let coord = self.coords.next().ok_or_else(|| {
            NdError::end_of_data(format!(
                "scalar cursor exhausted after {} elements",
                self.position
            ))
        })?;
        self.position += 1;
        self.view.get(&coord)
    }

    /// Number of elements read so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of elements left
    pub fn remaining(&self) -> usize {
        self.coords.len()
    }
}

/// Yields each element read, ending after the last one. Backend read
/// failures are yielded as `Err` items.
impl<S: Storage + ?Sized> Iterator for ScalarCursor<'_, S> {
    type Item = NdResult<S::Elem>;

    fn next(&mut self) -> Option<NdResult<S::Elem>> {
        if self.remaining() == 0 {
            return None;
        }
        Some(self.next_value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

/// Sequential reader/writer over a mutable view's flattened elements.
///
/// Reads and writes share one position that advances row-major. Writing
/// past the last element fails with `EndOfData`.
pub struct ScalarCursorMut<'a, S: ?Sized> {
    storage: &'a mut S,
    desc: ViewDescriptor,
    coords: Coordinates,
    position: usize,
}

impl<'a, S: Storage + ?Sized> ScalarCursorMut<'a, S> {
    pub(super) fn new(storage: &'a mut S, desc: ViewDescriptor) -> Self {
        let coords = Coordinates::new(desc.shape());
        Self {
            storage,
            desc,
            coords,
            position: 0,
        }
    }

    fn advance(&mut self, operation: &str) -> NdResult<Coord> {
        let local = self.coords.next().ok_or_else(|| {
            NdError::end_of_data(format!(
                "{} past the last of {} elements",
                operation, self.position
            ))
        })?;
        self.position += 1;
        self.desc.source_coord(&local)
    }

    /// Read the next element and advance
    pub fn next_value(&mut self) -> NdResult<S::Elem> {
        let source = self.advance("read")?;
        self.storage.get(&source)
    }

    /// Write `value` at the current position and advance.
    ///
    /// # Errors
    ///
    /// - `EndOfData` once every element has been visited
    /// - `ReadOnly` if the backend is read-only
    pub fn put(&mut self, value: S::Elem) -> NdResult<()> {
        if self.storage.is_read_only() {
            return Err(NdError::ReadOnly);
        }
        let source = self.advance("write")?;
        self.storage.set(&source, value)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.coords.len()
    }
}

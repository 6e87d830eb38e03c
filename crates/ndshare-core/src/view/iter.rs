use super::NdView;
use crate::shape::Coordinates;
use crate::storage::Storage;
use std::iter::FusedIterator;

/// Lazy sequence of sub-views over the leading dimensions of a view.
///
/// Produced by [`NdView::elements`] and [`NdView::elements_at_depth`]. Each
/// item is the view anchored at the next leading coordinate in row-major
/// order.
pub struct Elements<'a, S: ?Sized> {
    view: NdView<'a, S>,
    coords: Option<Coordinates>,
}

impl<'a, S: Storage + ?Sized> Elements<'a, S> {
    pub(super) fn new(view: NdView<'a, S>, leading: &[usize]) -> Self {
        Self {
            view,
            coords: Some(Coordinates::new(leading)),
        }
    }

    pub(super) fn empty(view: NdView<'a, S>) -> Self {
        Self { view, coords: None }
    }
}

impl<'a, S: Storage + ?Sized> Iterator for Elements<'a, S> {
    type Item = NdView<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let coord = self.coords.as_mut()?.next()?;
        // Coordinates stay within the view's leading extents
        self.view.at(&coord).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.coords {
            Some(coords) => coords.size_hint(),
            None => (0, Some(0)),
        }
    }
}

impl<S: Storage + ?Sized> ExactSizeIterator for Elements<'_, S> {}

impl<S: Storage + ?Sized> FusedIterator for Elements<'_, S> {}

//! Ordered position sequences along one dimension.

use std::sync::Arc;

/// An ordered sequence of positions selected along one dimension.
///
/// Regular selections (all, range, parity, modulo) stay in closed form as a
/// strided span; explicit inclusion and exclusion sets are stored as a list.
/// Lists are reference counted so descriptors can be cloned cheaply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Positions {
    /// `start, start + step, ..., start + (len - 1) * step`
    Span {
        start: usize,
        step: usize,
        len: usize,
    },
    /// Explicit positions, in order, duplicates allowed
    List(Arc<[usize]>),
}

impl Positions {
    /// Every position of a dimension with the given extent
    pub fn full(extent: usize) -> Self {
        Positions::Span {
            start: 0,
            step: 1,
            len: extent,
        }
    }

    /// Strided span
    pub fn span(start: usize, step: usize, len: usize) -> Self {
        Positions::Span { start, step, len }
    }

    /// Explicit list
    pub fn list(positions: impl Into<Arc<[usize]>>) -> Self {
        Positions::List(positions.into())
    }

    /// Number of selected positions
    pub fn len(&self) -> usize {
        match self {
            Positions::Span { len, .. } => *len,
            Positions::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position at local index `j`, `None` if `j >= len`
    pub fn get(&self, j: usize) -> Option<usize> {
        match self {
            Positions::Span { start, step, len } => (j < *len).then(|| start + j * step),
            Positions::List(list) => list.get(j).copied(),
        }
    }

    /// Iterate the selected positions in order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter_map(move |j| self.get(j))
    }

    /// Check if this selects every position `0..extent` in order
    pub fn is_full(&self, extent: usize) -> bool {
        match self {
            Positions::Span { start, step, len } => {
                *len == extent && (extent == 0 || (*start == 0 && (*step == 1 || extent == 1)))
            }
            Positions::List(list) => list.len() == extent && list.iter().enumerate().all(|(i, &p)| i == p),
        }
    }

    /// First position and length when the positions are consecutive
    pub fn consecutive(&self) -> Option<(usize, usize)> {
        match self {
            Positions::Span { start, step, len } if *step == 1 || *len <= 1 => Some((*start, *len)),
            Positions::Span { .. } => None,
            Positions::List(list) => {
                let first = *list.first()?;
                list.iter()
                    .enumerate()
                    .all(|(i, &p)| p == first + i)
                    .then_some((first, list.len()))
            }
        }
    }

    /// Substitute `inner` (local indices into `self`) by the positions they select.
    ///
    /// `inner` must only contain indices below `self.len()`.
    pub fn compose(&self, inner: &Positions) -> Positions {
        match (self, inner) {
            (_, Positions::Span { len: 0, .. }) => Positions::span(0, 1, 0),
            (
                Positions::Span { start, step, .. },
                Positions::Span {
                    start: inner_start,
                    step: inner_step,
                    len,
                },
            ) => Positions::Span {
                start: start + inner_start * step,
                step: step * inner_step,
                len: *len,
            },
            _ => Positions::List(inner.iter().filter_map(|j| self.get(j)).collect()),
        }
    }
}

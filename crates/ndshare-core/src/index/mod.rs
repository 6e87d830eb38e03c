//! Index algebra: symbolic per-dimension selectors and their resolution.
//!
//! An [`Index`] describes what to select along one dimension. A sequence of
//! indices (one per leading dimension, missing trailing dimensions meaning
//! "all") resolves against a shape into a [`ViewDescriptor`].
//!
//! # Examples
//!
//! ```
//! use ndshare_core::index::{self, ViewDescriptor};
//! use ndshare_core::shape::Shape;
//!
//! let desc = ViewDescriptor::identity(&Shape::fixed(&[4, 6])).unwrap();
//!
//! // Keep every row, select column 1: result is rank 1 with 4 elements
//! let column = desc.slice(&[index::all(), index::at(1)]).unwrap();
//! assert_eq!(column.shape(), &[4]);
//!
//! // Odd rows, columns 0, 3 and 3 again
//! let picked = desc.slice(&[index::odd(), index::include([0, 3, 3])]).unwrap();
//! assert_eq!(picked.shape(), &[2, 3]);
//! ```

pub mod descriptor;
pub mod positions;

pub use descriptor::{AxisMap, ViewDescriptor};
pub use positions::Positions;

use crate::dtype::Element;
use crate::error::{NdError, NdResult};
use crate::storage::Storage;
use smallvec::SmallVec;

/// Symbolic selector for one dimension
#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    /// A single position; collapses the dimension
    At(usize),
    /// Every position in order
    All,
    /// The listed positions in the given order, duplicates kept
    Include(Vec<usize>),
    /// Every position except the listed ones, ascending
    Exclude(Vec<usize>),
    /// Positions `start..end`
    Range { start: usize, end: usize },
    /// Positions 0, 2, 4, ...
    Even,
    /// Positions 1, 3, 5, ...
    Odd,
    /// Positions 0, m, 2m, ...
    Modulo(usize),
    /// Positions supplied by a rank-0 or rank-1 integer array
    Array(IndexArray),
}

/// Positions read from an integer array.
///
/// A rank-0 source supplies one position; a rank-1 source of length `k`
/// supplies positions for `k` consecutive dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexArray {
    positions: SmallVec<[i64; 6]>,
}

impl IndexArray {
    /// Positions in order, one per consumed dimension
    pub fn positions(&self) -> &[i64] {
        &self.positions
    }
}

/// Integer element types usable as array-valued selectors
pub trait PositionElement: Element {
    fn to_position(&self) -> i64;
}

impl PositionElement for i32 {
    fn to_position(&self) -> i64 {
        i64::from(*self)
    }
}

impl PositionElement for i64 {
    fn to_position(&self) -> i64 {
        *self
    }
}

impl PositionElement for u8 {
    fn to_position(&self) -> i64 {
        i64::from(*self)
    }
}

/// Resolved selection along one dimension, in local positions
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Fixed(usize),
    Keep(Positions),
}

impl Index {
    /// Build an array-valued selector from a rank-0 or rank-1 integer array.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the source rank is greater than 1.
    pub fn from_array<S>(source: &S) -> NdResult<Index>
    where
        S: Storage + ?Sized,
        S::Elem: PositionElement,
    {
        let positions: SmallVec<[i64; 6]> = match source.rank() {
            0 => SmallVec::from_elem(source.get(&[])?.to_position(), 1),
            1 => {
                let k = source.shape().extent(0)?;
                (0..k)
                    .map(|j| source.get(&[j]).map(|v| v.to_position()))
                    .collect::<NdResult<_>>()?
            }
            r => {
                return Err(NdError::invalid(format!(
                    "array-valued index must have rank 0 or 1, got rank {}",
                    r
                )))
            }
        };
        Ok(Index::Array(IndexArray { positions }))
    }

    /// Number of dimensions this index consumes
    pub fn width(&self) -> usize {
        match self {
            Index::Array(arr) => arr.positions.len(),
            _ => 1,
        }
    }

    /// Resolve a single-dimension index against `extent`.
    ///
    /// `dimension` is only used for error reporting. Array-valued indices
    /// span several dimensions and are resolved by [`ViewDescriptor::slice`].
    pub fn resolve(&self, dimension: usize, extent: usize) -> NdResult<Selection> {
        let check = |p: usize| -> NdResult<usize> {
            if p < extent {
                Ok(p)
            } else {
                Err(NdError::out_of_range(dimension, p, extent))
            }
        };

        let selection = match self {
            Index::At(i) => Selection::Fixed(check(*i)?),
            Index::All => Selection::Keep(Positions::full(extent)),
            Index::Include(list) => {
                for &p in list {
                    check(p)?;
                }
                Selection::Keep(Positions::list(list.clone()))
            }
            Index::Exclude(list) => {
                let mut excluded = vec![false; extent];
                for &p in list {
                    excluded[check(p)?] = true;
                }
                let kept: Vec<usize> = (0..extent).filter(|&p| !excluded[p]).collect();
                Selection::Keep(Positions::list(kept))
            }
            Index::Range { start, end } => {
                if *end > extent {
                    return Err(NdError::out_of_range(dimension, *end, extent));
                }
                if start > end {
                    return Err(NdError::invalid(format!(
                        "range start {} is after end {}",
                        start, end
                    )));
                }
                Selection::Keep(Positions::span(*start, 1, end - start))
            }
            Index::Even => Selection::Keep(Positions::span(0, 2, extent.div_ceil(2))),
            Index::Odd => Selection::Keep(Positions::span(1, 2, extent / 2)),
            Index::Modulo(0) => {
                return Err(NdError::invalid("modulo index requires a positive divisor"))
            }
            Index::Modulo(m) => Selection::Keep(Positions::span(0, *m, extent.div_ceil(*m))),
            Index::Array(arr) => match arr.positions.as_slice() {
                [p] => Selection::Fixed(resolve_signed(dimension, *p, extent)?),
                other => {
                    return Err(NdError::invalid(format!(
                        "array index with {} positions cannot resolve a single dimension",
                        other.len()
                    )))
                }
            },
        };
        Ok(selection)
    }
}

pub(crate) fn resolve_signed(dimension: usize, position: i64, extent: usize) -> NdResult<usize> {
    usize::try_from(position)
        .ok()
        .filter(|&p| p < extent)
        .ok_or_else(|| NdError::out_of_range_signed(dimension, position, extent))
}

/// Select a single position, collapsing the dimension
pub fn at(i: usize) -> Index {
    Index::At(i)
}

/// Select every position
pub fn all() -> Index {
    Index::All
}

/// Select the listed positions in order
pub fn include(positions: impl IntoIterator<Item = usize>) -> Index {
    Index::Include(positions.into_iter().collect())
}

/// Select every position except the listed ones
pub fn exclude(positions: impl IntoIterator<Item = usize>) -> Index {
    Index::Exclude(positions.into_iter().collect())
}

/// Select positions `start..end`
pub fn range(start: usize, end: usize) -> Index {
    Index::Range { start, end }
}

/// Select even positions
pub fn even() -> Index {
    Index::Even
}

/// Select odd positions
pub fn odd() -> Index {
    Index::Odd
}

/// Select positions 0, m, 2m, ...
pub fn modulo(m: usize) -> Index {
    Index::Modulo(m)
}

//! View descriptors: resolved coordinate transforms from a view to its source.

use super::{resolve_signed, Index, Positions, Selection};
use crate::error::{NdError, NdResult};
use crate::shape::{row_major_strides, Coord, Shape};
use smallvec::SmallVec;
use std::ops::Range;

/// How one source dimension is addressed by a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisMap {
    /// Collapsed to a single source position
    Fixed(usize),
    /// Retained; local index `j` maps to the `j`-th position
    Kept(Positions),
}

/// Resolved mapping from a view's local coordinates to source coordinates.
///
/// The descriptor holds one [`AxisMap`] per source dimension. The view's rank
/// is the number of kept axes, in source dimension order. Slicing a
/// descriptor again composes positions by substitution, so a chain of slices
/// always collapses into a single descriptor over the original source.
///
/// # Examples
///
/// ```
/// use ndshare_core::index::{self, ViewDescriptor};
/// use ndshare_core::shape::Shape;
///
/// let base = ViewDescriptor::identity(&Shape::fixed(&[10])).unwrap();
/// let evens = base.slice(&[index::even()]).unwrap();        // 0,2,4,6,8
/// let tail = evens.slice(&[index::range(2, 5)]).unwrap();   // 4,6,8
/// assert_eq!(tail.source_coord(&[0]).unwrap().as_slice(), &[4]);
/// assert_eq!(tail.source_coord(&[2]).unwrap().as_slice(), &[8]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    source: Coord,
    axes: SmallVec<[AxisMap; 6]>,
    shape: Coord,
}

impl ViewDescriptor {
    /// Descriptor selecting every element of `shape` in place.
    ///
    /// # Errors
    ///
    /// Returns `UndefinedSize` if `shape` has a ragged dimension.
    pub fn identity(shape: &Shape) -> NdResult<Self> {
        let source = shape.extents()?;
        let axes = source
            .iter()
            .map(|&e| AxisMap::Kept(Positions::full(e)))
            .collect();
        Ok(Self {
            shape: source.clone(),
            source,
            axes,
        })
    }

    /// Extents of the view
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Rank of the view (number of kept axes)
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements selected by the view
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Extents of the source the view addresses
    pub fn source_extents(&self) -> &[usize] {
        &self.source
    }

    /// Per-source-dimension mapping
    pub fn axes(&self) -> &[AxisMap] {
        &self.axes
    }

    /// Apply `indices` to this view's dimensions, producing a new descriptor
    /// over the same source.
    ///
    /// Indices are validated against this view's extents. Dimensions not
    /// covered by `indices` are kept whole.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` if a position lies outside its dimension
    /// - `InvalidArgument` for malformed expressions or more indices than dimensions
    pub fn slice(&self, indices: &[Index]) -> NdResult<ViewDescriptor> {
        let kept: SmallVec<[usize; 6]> = self
            .axes
            .iter()
            .enumerate()
            .filter(|(_, a)| matches!(a, AxisMap::Kept(_)))
            .map(|(i, _)| i)
            .collect();

        let consumed: usize = indices.iter().map(Index::width).sum();
        if consumed > kept.len() {
            return Err(NdError::invalid(format!(
                "{} indices given for a view of rank {}",
                consumed,
                kept.len()
            )));
        }

        let mut axes = self.axes.clone();
        let mut local = 0;
        for index in indices {
            let selections: SmallVec<[Selection; 6]> = match index {
                Index::Array(arr) => arr
                    .positions()
                    .iter()
                    .enumerate()
                    .map(|(offset, &p)| {
                        let dim = local + offset;
                        resolve_signed(dim, p, self.shape[dim]).map(Selection::Fixed)
                    })
                    .collect::<NdResult<_>>()?,
                other => SmallVec::from_elem(other.resolve(local, self.shape[local])?, 1),
            };

            for selection in selections {
                let axis = kept[local];
                if let AxisMap::Kept(current) = &axes[axis] {
                    axes[axis] = match selection {
                        Selection::Fixed(j) => AxisMap::Fixed(current.get(j).ok_or_else(|| {
                            NdError::out_of_range(local, j, current.len())
                        })?),
                        Selection::Keep(inner) => AxisMap::Kept(current.compose(&inner)),
                    };
                }
                local += 1;
            }
        }

        let shape = axes
            .iter()
            .filter_map(|a| match a {
                AxisMap::Kept(p) => Some(p.len()),
                AxisMap::Fixed(_) => None,
            })
            .collect();

        Ok(ViewDescriptor {
            source: self.source.clone(),
            axes,
            shape,
        })
    }

    /// Map a full local coordinate to the source coordinate it addresses.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `local` does not have one component per view dimension
    /// - `IndexOutOfRange` if a component lies outside the view's extent
    pub fn source_coord(&self, local: &[usize]) -> NdResult<Coord> {
        if local.len() != self.rank() {
            return Err(NdError::invalid(format!(
                "coordinate {:?} has {} components but the view has rank {}",
                local,
                local.len(),
                self.rank()
            )));
        }
        let mut out = Coord::with_capacity(self.axes.len());
        let mut k = 0;
        for axis in &self.axes {
            match axis {
                AxisMap::Fixed(p) => out.push(*p),
                AxisMap::Kept(positions) => {
                    let j = local[k];
                    let p = positions
                        .get(j)
                        .ok_or_else(|| NdError::out_of_range(k, j, positions.len()))?;
                    out.push(p);
                    k += 1;
                }
            }
        }
        Ok(out)
    }

    /// Flat row-major range of the source covered by this view, when the
    /// view is one contiguous block in row-major order.
    ///
    /// Full arrays and slices whose trailing dimensions are all kept whole
    /// qualify.
    pub fn contiguous_range(&self) -> Option<Range<usize>> {
        let size = self.size();
        if size == 0 {
            return Some(0..0);
        }

        // Trailing axes kept whole
        let mut split = self.axes.len();
        while split > 0 {
            match &self.axes[split - 1] {
                AxisMap::Kept(p) if p.is_full(self.source[split - 1]) => split -= 1,
                _ => break,
            }
        }

        // One partially selected axis may precede them, everything before must
        // select a single position
        if split > 0 {
            let partial = match &self.axes[split - 1] {
                AxisMap::Fixed(_) => true,
                AxisMap::Kept(p) => p.consecutive().is_some(),
            };
            if !partial {
                return None;
            }
            let leading_single = self.axes[..split - 1].iter().all(|a| match a {
                AxisMap::Fixed(_) => true,
                AxisMap::Kept(p) => p.len() == 1,
            });
            if !leading_single {
                return None;
            }
        }

        let strides = row_major_strides(&self.source);
        let start: usize = self
            .axes
            .iter()
            .zip(strides.iter())
            .map(|(axis, stride)| {
                let first = match axis {
                    AxisMap::Fixed(p) => *p,
                    AxisMap::Kept(p) => p.get(0).unwrap_or(0),
                };
                first * stride
            })
            .sum();
        Some(start..start + size)
    }
}

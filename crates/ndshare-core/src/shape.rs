//! Array geometry: dimensions, shapes, strides and coordinate traversal.
//!
//! A [`Shape`] is an ordered list of [`Dim`]s. Fixed dimensions have a known
//! extent; ragged dimensions (written `-1` in signed form) vary per
//! sub-element and are only meaningful for ragged storage.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::shape::Shape;
//!
//! let shape = Shape::fixed(&[2, 3, 4]);
//! assert_eq!(shape.rank(), 3);
//! assert_eq!(shape.size().unwrap(), 24);
//! assert_eq!(shape.strides().unwrap().as_slice(), &[12, 4, 1]);
//!
//! let ragged = Shape::new(&[3, -1]).unwrap();
//! assert!(ragged.is_ragged());
//! assert!(ragged.size().is_err());
//! assert_eq!(ragged.to_string(), "[3, -1]");
//! ```

use crate::error::{NdError, NdResult};
use smallvec::SmallVec;
use std::fmt;

/// Coordinate type using SmallVec to avoid heap allocation for common ranks.
///
/// Up to 6 dimensions stay inline; higher ranks fall back to the heap.
pub type Coord = SmallVec<[usize; 6]>;

/// Extent of a single dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dim {
    /// Known, uniform extent
    Fixed(usize),
    /// Extent varies per sub-element
    Ragged,
}

impl Dim {
    /// Extent of a fixed dimension, `None` if ragged
    pub fn extent(&self) -> Option<usize> {
        match self {
            Dim::Fixed(n) => Some(*n),
            Dim::Ragged => None,
        }
    }

    /// Check if this dimension is ragged
    pub fn is_ragged(&self) -> bool {
        matches!(self, Dim::Ragged)
    }

    /// Signed form, `-1` for ragged
    pub fn to_signed(&self) -> i64 {
        match self {
            Dim::Fixed(n) => *n as i64,
            Dim::Ragged => Shape::RAGGED,
        }
    }
}

/// Immutable description of an array's dimensionality and per-dimension extent.
///
/// Two shapes are equal when their dimension sequences are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    dims: SmallVec<[Dim; 6]>,
}

impl Shape {
    /// Signed sentinel marking a ragged dimension
    pub const RAGGED: i64 = -1;

    /// Create a shape from signed extents, `-1` marking a ragged dimension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any extent is below `-1`.
    pub fn new(extents: &[i64]) -> NdResult<Self> {
        let mut dims = SmallVec::with_capacity(extents.len());
        for (i, &e) in extents.iter().enumerate() {
            let dim = match e {
                -1 => Dim::Ragged,
                e if e >= 0 => Dim::Fixed(e as usize),
                e => {
                    return Err(NdError::invalid(format!(
                        "dimension {} has negative extent {}",
                        i, e
                    )))
                }
            };
            dims.push(dim);
        }
        Ok(Self { dims })
    }

    /// Create a shape where every dimension is fixed
    pub fn fixed(extents: &[usize]) -> Self {
        Self {
            dims: extents.iter().map(|&e| Dim::Fixed(e)).collect(),
        }
    }

    /// Create a shape from explicit dimensions
    pub fn from_dims(dims: impl IntoIterator<Item = Dim>) -> Self {
        Self {
            dims: dims.into_iter().collect(),
        }
    }

    /// The rank-0 shape
    pub fn scalar() -> Self {
        Self::default()
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Check if this is the shape of a scalar (rank 0)
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Check if any dimension is ragged
    pub fn is_ragged(&self) -> bool {
        self.first_ragged().is_some()
    }

    /// Position of the first ragged dimension, if any
    pub fn first_ragged(&self) -> Option<usize> {
        self.dims.iter().position(Dim::is_ragged)
    }

    /// All dimensions in order
    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// Dimension at position `i`
    pub fn dim(&self, i: usize) -> NdResult<Dim> {
        self.dims
            .get(i)
            .copied()
            .ok_or_else(|| NdError::out_of_range(i, i, self.rank()))
    }

    /// Extent of dimension `i`.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` if `i >= rank`
    /// - `UndefinedSize` if the dimension is ragged
    pub fn extent(&self, i: usize) -> NdResult<usize> {
        self.dim(i)?
            .extent()
            .ok_or(NdError::UndefinedSize { dimension: i })
    }

    /// All extents, failing with `UndefinedSize` if any dimension is ragged
    pub fn extents(&self) -> NdResult<Coord> {
        (0..self.rank()).map(|i| self.extent(i)).collect()
    }

    /// Total element count (product of extents).
    ///
    /// A scalar has one element. Ragged shapes have no global count and fail
    /// with `UndefinedSize`.
    pub fn size(&self) -> NdResult<usize> {
        let mut total: usize = 1;
        for i in 0..self.rank() {
            total = total
                .checked_mul(self.extent(i)?)
                .ok_or_else(|| NdError::invalid(format!("element count of {} overflows", self)))?;
        }
        Ok(total)
    }

    /// Row-major strides in elements
    pub fn strides(&self) -> NdResult<Coord> {
        let extents = self.extents()?;
        Ok(row_major_strides(&extents))
    }

    /// Signed extents, `-1` for ragged dimensions
    pub fn to_signed(&self) -> Vec<i64> {
        self.dims.iter().map(Dim::to_signed).collect()
    }

    /// Shape of the trailing dimensions starting at `from`
    pub fn tail(&self, from: usize) -> Shape {
        Shape {
            dims: self.dims.iter().skip(from).copied().collect(),
        }
    }

    /// Validate a full coordinate against this shape.
    ///
    /// Ragged dimensions are not bounds-checked here; their extent depends on
    /// the path taken through the storage.
    pub fn check_coordinate(&self, coord: &[usize]) -> NdResult<()> {
        if coord.len() != self.rank() {
            return Err(NdError::invalid(format!(
                "coordinate {:?} has {} components but shape {} has rank {}",
                coord,
                coord.len(),
                self,
                self.rank()
            )));
        }
        for (i, (&c, dim)) in coord.iter().zip(self.dims.iter()).enumerate() {
            if let Dim::Fixed(n) = dim {
                if c >= *n {
                    return Err(NdError::out_of_range(i, c, *n));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d.to_signed())?;
        }
        write!(f, "]")
    }
}

impl From<&[usize]> for Shape {
    fn from(extents: &[usize]) -> Self {
        Shape::fixed(extents)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(extents: [usize; N]) -> Self {
        Shape::fixed(&extents)
    }
}

/// Row-major strides for the given extents
pub fn row_major_strides(extents: &[usize]) -> Coord {
    let mut strides: Coord = SmallVec::from_elem(1, extents.len());
    for i in (0..extents.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * extents[i + 1];
    }
    strides
}

/// Flat row-major offset of `coord` given `strides`
pub fn flat_offset(coord: &[usize], strides: &[usize]) -> usize {
    coord.iter().zip(strides).map(|(c, s)| c * s).sum()
}

/// Row-major traversal over every coordinate of a box of extents.
///
/// A rank-0 box yields one empty coordinate; a box with any zero extent
/// yields nothing.
///
/// # Examples
///
/// ```
/// use ndshare_core::shape::Coordinates;
///
/// let coords: Vec<Vec<usize>> = Coordinates::new(&[2, 2]).map(|c| c.to_vec()).collect();
/// assert_eq!(coords, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
/// ```
#[derive(Debug, Clone)]
pub struct Coordinates {
    extents: Coord,
    next: Option<Coord>,
    remaining: usize,
}

impl Coordinates {
    /// Traverse all coordinates within `extents`
    pub fn new(extents: &[usize]) -> Self {
        let remaining = extents
            .iter()
            .try_fold(1usize, |acc, &e| acc.checked_mul(e))
            .unwrap_or(usize::MAX);
        let next = if remaining == 0 {
            None
        } else {
            Some(SmallVec::from_elem(0, extents.len()))
        };
        Self {
            extents: extents.iter().copied().collect(),
            next,
            remaining,
        }
    }
}

impl Iterator for Coordinates {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        let current = self.next.take()?;
        self.remaining = self.remaining.saturating_sub(1);

        let mut advanced = current.clone();
        let mut carry = true;
        for i in (0..advanced.len()).rev() {
            advanced[i] += 1;
            if advanced[i] < self.extents[i] {
                carry = false;
                break;
            }
            advanced[i] = 0;
        }
        if !carry {
            self.next = Some(advanced);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Coordinates {}

//! Ragged storage: a tree with one level per dimension.
//!
//! Fixed dimensions produce levels with a uniform child count, created
//! eagerly. Ragged dimensions start empty and grow when a write lands past
//! their current extent; intermediate children are filled with zero
//! sub-trees. Reads never grow the tree.
//!
//! Ragged arrays have no global element count, so they cannot be viewed or
//! sliced. Reads go through `get`, [`RaggedArray::values_at`] and
//! [`RaggedArray::to_row_splits`]; bulk writes through
//! [`RaggedArray::copy_from`].
//!
//! # Examples
//!
//! ```
//! use ndshare_core::shape::Shape;
//! use ndshare_core::storage::{RaggedArray, Storage};
//!
//! let mut rg = RaggedArray::<i32>::new(Shape::new(&[3, -1]).unwrap()).unwrap();
//! rg.set(&[0, 2], 30).unwrap();
//! assert_eq!(rg.values_at(&[0]).unwrap(), vec![0, 0, 30]);
//! assert_eq!(rg.extent_at(&[1]).unwrap(), 0);
//! assert!(rg.get(&[1, 0]).is_err());
//! ```

use super::{Storage, StorageKind};
use crate::dtype::Element;
use crate::error::{NdError, NdResult};
use crate::shape::{Coordinates, Dim, Shape};
use crate::view::NdView;

#[derive(Debug, Clone, PartialEq)]
enum Node<T> {
    Leaf(T),
    Branch(Vec<Node<T>>),
}

impl<T: Element> Node<T> {
    /// Zero sub-tree for the remaining dimensions
    fn build(dims: &[Dim]) -> Self {
        match dims.split_first() {
            None => Node::Leaf(T::zero()),
            Some((Dim::Fixed(n), rest)) => Node::Branch((0..*n).map(|_| Self::build(rest)).collect()),
            Some((Dim::Ragged, _)) => Node::Branch(Vec::new()),
        }
    }

    fn collect_leaves(&self, out: &mut Vec<T>) {
        match self {
            Node::Leaf(v) => out.push(v.clone()),
            Node::Branch(children) => children.iter().for_each(|c| c.collect_leaves(out)),
        }
    }

    fn count_leaves(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(children) => children.iter().map(Node::count_leaves).sum(),
        }
    }

    fn set(&mut self, dims: &[Dim], coord: &[usize], level: usize, value: T) -> NdResult<()> {
        let (Some((dim, rest)), Some((&i, tail))) = (dims.split_first(), coord.split_first())
        else {
            *self = Node::Leaf(value);
            return Ok(());
        };
        let Node::Branch(children) = self else {
            return Err(NdError::invalid("coordinate descends below a leaf"));
        };
        if i >= children.len() {
            match dim {
                Dim::Fixed(n) => return Err(NdError::out_of_range(level, i, *n)),
                Dim::Ragged => {
                    tracing::trace!(level, from = children.len(), to = i + 1, "ragged level grown");
                    children.resize_with(i + 1, || Self::build(rest));
                }
            }
        }
        children[i].set(rest, tail, level + 1, value)
    }
}

/// Row-split export of a ragged array.
///
/// `row_splits[l]` has one entry per node at level `l` plus one; entries
/// `k` and `k + 1` delimit the children of node `k` among the nodes of level
/// `l + 1` (or among `values` at the last level).
#[derive(Debug, Clone, PartialEq)]
pub struct RaggedParts<T> {
    pub shape: Shape,
    pub values: Vec<T>,
    pub row_splits: Vec<Vec<usize>>,
}

/// Ragged N-dimensional array
#[derive(Debug, Clone)]
pub struct RaggedArray<T> {
    shape: Shape,
    root: Node<T>,
    read_only: bool,
}

impl<T: Element> RaggedArray<T> {
    /// Empty ragged array; fixed levels are created eagerly with zero leaves
    pub fn new(shape: impl Into<Shape>) -> NdResult<Self> {
        let shape = shape.into();
        let root = Node::build(shape.dims());
        tracing::debug!(shape = %shape, dtype = %T::DTYPE, "ragged array created");
        Ok(Self {
            shape,
            root,
            read_only: false,
        })
    }

    fn node(&self, prefix: &[usize]) -> NdResult<&Node<T>> {
        if prefix.len() > self.rank() {
            return Err(NdError::invalid(format!(
                "prefix {:?} is longer than rank {}",
                prefix,
                self.rank()
            )));
        }
        let mut node = &self.root;
        for (level, &i) in prefix.iter().enumerate() {
            node = match node {
                Node::Branch(children) => children
                    .get(i)
                    .ok_or_else(|| NdError::out_of_range(level, i, children.len()))?,
                Node::Leaf(_) => return Err(NdError::invalid("prefix descends below a leaf")),
            };
        }
        Ok(node)
    }

    /// Current extent of the level below `prefix`.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` if the prefix leaves the current structure
    /// - `InvalidArgument` if `prefix` addresses a single element
    pub fn extent_at(&self, prefix: &[usize]) -> NdResult<usize> {
        match self.node(prefix)? {
            Node::Branch(children) => Ok(children.len()),
            Node::Leaf(_) => Err(NdError::invalid("prefix addresses a single element")),
        }
    }

    /// Number of elements under `prefix`
    pub fn size_at(&self, prefix: &[usize]) -> NdResult<usize> {
        Ok(self.node(prefix)?.count_leaves())
    }

    /// Elements under `prefix` in row-major order
    pub fn values_at(&self, prefix: &[usize]) -> NdResult<Vec<T>> {
        let mut out = Vec::new();
        self.node(prefix)?.collect_leaves(&mut out);
        Ok(out)
    }

    /// Every element in row-major order
    pub fn leaves(&self) -> Vec<T> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }

    /// Write `values` at positions `0..values.len()` of the last level under
    /// `prefix`, growing ragged levels as needed.
    pub fn set_values_at(&mut self, prefix: &[usize], values: &[T]) -> NdResult<()> {
        if prefix.len() + 1 != self.rank() {
            return Err(NdError::invalid(format!(
                "prefix {:?} does not address a row of rank {}",
                prefix,
                self.rank()
            )));
        }
        let mut coord: Vec<usize> = prefix.to_vec();
        coord.push(0);
        let last = prefix.len();
        for (j, value) in values.iter().enumerate() {
            coord[last] = j;
            self.set(&coord, value.clone())?;
        }
        Ok(())
    }

    /// Copy every element of `src` to the same coordinate in this array,
    /// growing ragged levels as needed. Returns the number of elements copied.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if the ranks differ
    /// - `IndexOutOfRange` if a coordinate exceeds a fixed level
    pub fn copy_from<S>(&mut self, src: &NdView<'_, S>) -> NdResult<usize>
    where
        S: Storage<Elem = T> + ?Sized,
    {
        if src.rank() != self.rank() {
            return Err(NdError::shape_mismatch("ragged copy_from rank", self.rank(), src.rank()));
        }
        let mut count = 0;
        for coord in Coordinates::new(src.shape()) {
            self.set(&coord, src.get(&coord)?)?;
            count += 1;
        }
        tracing::trace!(count, "copied view into ragged array");
        Ok(count)
    }

    /// Freeze the structure; later writes fail with `ReadOnly`
    pub fn finalize(&mut self) {
        self.read_only = true;
        tracing::debug!(shape = %self.shape, "ragged array finalized");
    }

    /// Flatten into values plus per-level row splits
    pub fn to_row_splits(&self) -> RaggedParts<T> {
        let mut row_splits = Vec::with_capacity(self.rank());
        let mut level: Vec<&Node<T>> = vec![&self.root];
        for _ in 0..self.rank() {
            let mut splits = Vec::with_capacity(level.len() + 1);
            splits.push(0);
            let mut next = Vec::new();
            for node in level.iter().copied() {
                if let Node::Branch(children) = node {
                    next.extend(children.iter());
                }
                splits.push(next.len());
            }
            row_splits.push(splits);
            level = next;
        }
        RaggedParts {
            shape: self.shape.clone(),
            values: self.leaves(),
            row_splits,
        }
    }
}

impl<T: Element> Storage for RaggedArray<T> {
    type Elem = T;

    fn kind(&self) -> StorageKind {
        StorageKind::Ragged
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn get(&self, coord: &[usize]) -> NdResult<T> {
        if coord.len() != self.rank() {
            return Err(NdError::invalid(format!(
                "coordinate {:?} has {} components but shape {} has rank {}",
                coord,
                coord.len(),
                self.shape,
                self.rank()
            )));
        }
        match self.node(coord)? {
            Node::Leaf(v) => Ok(v.clone()),
            Node::Branch(_) => Err(NdError::invalid("coordinate addresses a sub-array")),
        }
    }

    fn set(&mut self, coord: &[usize], value: T) -> NdResult<()> {
        if self.read_only {
            return Err(NdError::ReadOnly);
        }
        if coord.len() != self.rank() {
            return Err(NdError::invalid(format!(
                "coordinate {:?} has {} components but shape {} has rank {}",
                coord,
                coord.len(),
                self.shape,
                self.rank()
            )));
        }
        self.root.set(self.shape.dims(), coord, 0, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> RaggedArray<i32> {
        let mut rg = RaggedArray::new(Shape::new(&[3, -1]).unwrap()).unwrap();
        for (coord, v) in [
            ([0, 0], 10),
            ([0, 1], 20),
            ([0, 2], 30),
            ([1, 0], 40),
            ([2, 0], 50),
            ([2, 1], 60),
        ] {
            rg.set(&coord, v).unwrap();
        }
        rg
    }

    #[test]
    fn test_per_row_reads() {
        let rg = rows();
        assert_eq!(rg.values_at(&[0]).unwrap(), vec![10, 20, 30]);
        assert_eq!(rg.values_at(&[1]).unwrap(), vec![40]);
        assert_eq!(rg.values_at(&[2]).unwrap(), vec![50, 60]);
        assert!(rg.get(&[1, 1]).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_growth_fills_zeros() {
        let mut rg = RaggedArray::<f64>::new(Shape::new(&[2, -1]).unwrap()).unwrap();
        rg.set(&[1, 4], 1.5).unwrap();
        assert_eq!(rg.extent_at(&[1]).unwrap(), 5);
        for k in 0..4 {
            assert_eq!(rg.get(&[1, k]).unwrap(), 0.0);
        }
        assert_eq!(rg.extent_at(&[0]).unwrap(), 0);
    }

    #[test]
    fn test_fixed_level_bound() {
        let mut rg = rows();
        assert!(rg.set(&[3, 0], 1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_nested_ragged_growth() {
        let mut rg = RaggedArray::<u8>::new(Shape::new(&[-1, -1]).unwrap()).unwrap();
        rg.set(&[2, 1], 7).unwrap();
        assert_eq!(rg.extent_at(&[]).unwrap(), 3);
        assert_eq!(rg.extent_at(&[0]).unwrap(), 0);
        assert_eq!(rg.extent_at(&[2]).unwrap(), 2);
        assert_eq!(rg.size_at(&[]).unwrap(), 2);
    }

    #[test]
    fn test_total_elements_undefined() {
        assert!(matches!(
            rows().total_elements(),
            Err(NdError::UndefinedSize { dimension: 1 })
        ));
    }

    #[test]
    fn test_finalize_is_read_only() {
        let mut rg = rows();
        rg.finalize();
        assert!(rg.is_read_only());
        assert!(matches!(rg.set(&[0, 0], 1), Err(NdError::ReadOnly)));
    }

    #[test]
    fn test_row_splits() {
        let parts = rows().to_row_splits();
        assert_eq!(parts.values, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(parts.row_splits, vec![vec![0, 3], vec![0, 3, 4, 6]]);
    }

    #[test]
    fn test_set_values_at() {
        let mut rg = RaggedArray::<i32>::new(Shape::new(&[2, -1]).unwrap()).unwrap();
        rg.set_values_at(&[1], &[1, 2, 3]).unwrap();
        assert_eq!(rg.values_at(&[1]).unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            rg.set_values_at(&[], &[1]),
            Err(NdError::InvalidArgument { .. })
        ));
    }
}

//! # ndshare-core
//!
//! N-dimensional arrays with zero-copy views over owned or borrowed memory.
//!
//! This crate provides the building blocks of the ndshare stack:
//!
//! - **Shapes** ([`Shape`]) with fixed and ragged dimensions
//! - **Element types** ([`Element`], [`DataType`]) with a stable byte codec
//! - **Index algebra** ([`index`]) resolving symbolic selectors into [`ViewDescriptor`]s
//! - **Storage backends**: [`DenseArray`], [`SparseArray`] and [`RaggedArray`]
//! - **Views** ([`NdView`], [`NdViewMut`]) with leading-axis iteration and scalar cursors
//! - **Bulk transfers** between views and flat containers ([`transfer`])
//! - **A backend-polymorphic handle** ([`NdArray`]) created from [`ArrayOptions`]
//!
//! Byte-stream transfers and binding to externally owned memory live in
//! `ndshare-io`.
//!
//! ## Quick Start
//!
//! ```
//! use ndshare_core::index::{all, at};
//! use ndshare_core::{DenseArray, Storage, StorageExt};
//!
//! let mut arr = DenseArray::<f32>::zeros([2, 3]).unwrap();
//! arr.set(&[0, 1], 5.0).unwrap();
//!
//! let column = arr.slice(&[all(), at(1)]).unwrap();
//! assert_eq!(column.rank(), 1);
//! assert_eq!(column.len(), 2);
//! assert_eq!(column.get(&[0]).unwrap(), 5.0);
//! ```
//!
//! ## Storage Backends
//!
//! ```
//! use ndshare_core::{RaggedArray, Shape, SparseArray, Storage};
//!
//! // Sparse: unset coordinates read as zero, capacity is fixed
//! let mut sp = SparseArray::<f64>::new([2, 4], 1).unwrap();
//! sp.set(&[1, 1], 3.0).unwrap();
//! assert_eq!(sp.get(&[0, 0]).unwrap(), 0.0);
//! assert!(sp.set(&[0, 0], 1.0).is_err());
//!
//! // Ragged: writes past a ragged level grow it
//! let mut rg = RaggedArray::<i32>::new(Shape::new(&[2, -1]).unwrap()).unwrap();
//! rg.set(&[1, 2], 7).unwrap();
//! assert_eq!(rg.values_at(&[1]).unwrap(), vec![0, 0, 7]);
//! ```
//!
//! ## Memory Layout
//!
//! Dense storage is row-major. Transfers over a whole dense array or a slice
//! whose trailing dimensions are kept whole copy one contiguous run; other
//! selections fall back to per-element access.
//!
//! ## Concurrency
//!
//! Arrays carry no internal locking. Shared references allow concurrent
//! reads; writes require exclusive access, which the borrow checker enforces
//! through `&mut`.
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`NdResult`]. See [`NdError`] for the
//! error kinds.
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for shapes, data types and options

pub mod array;
pub mod dtype;
pub mod error;
pub mod index;
pub mod shape;
pub mod storage;
pub mod transfer;
pub mod view;


pub use array::{ArrayOptions, NdArray};
pub use dtype::{DataType, Element, ElementLayout, TextOptions};
pub use error::{NdError, NdResult};
pub use index::{Index, ViewDescriptor};
pub use shape::{Coord, Coordinates, Dim, Shape};
pub use storage::{
    DenseArray, RaggedArray, RaggedParts, SparseArray, Storage, StorageExt, StorageKind,
};
pub use transfer::FLAT_CONTAINER_LIMIT;
pub use view::{Elements, NdView, NdViewMut, ScalarCursor, ScalarCursorMut};

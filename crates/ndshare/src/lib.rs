//! # ndshare
//!
//! N-dimensional arrays over owned or externally owned buffers, with dense,
//! sparse and ragged storage behind one access contract and zero-copy views.
//!
//! This is the meta crate that re-exports the ndshare stack:
//!
//! - `ndshare-core`: shapes, element types, index algebra, storage backends,
//!   views and flat-container transfers
//! - `ndshare-io`: byte-stream transfers and binding to host-owned memory
//!
//! ## Quick Start
//!
//! ```
//! use ndshare::prelude::*;
//!
//! let opts = ArrayOptions::new().kind(StorageKind::Sparse).capacity(3);
//! let mut arr = NdArray::<f32>::create([2, 4], &opts).unwrap();
//! arr.set(&[0, 3], 20.0).unwrap();
//!
//! let row = arr.slice(&[at(0)]).unwrap();
//! assert_eq!(row.to_vec().unwrap(), vec![0.0, 0.0, 0.0, 20.0]);
//!
//! let bytes = row.to_bytes().unwrap();
//! assert_eq!(bytes.len(), 16);
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for shapes, data types and options

pub use ndshare_core::*;
pub use ndshare_io::*;

/// Common imports
pub mod prelude {
    pub use ndshare_core::index::{all, at, even, exclude, include, modulo, odd, range, Index};
    pub use ndshare_core::{
        ArrayOptions, DataType, DenseArray, Element, NdArray, NdError, NdResult, NdView,
        NdViewMut, RaggedArray, Shape, SparseArray, Storage, StorageExt, StorageKind,
        TextOptions,
    };
    pub use ndshare_io::{FromByteStream, RawMemory, ToByteStream};
}

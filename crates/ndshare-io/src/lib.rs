//! # ndshare-io
//!
//! Moving ndshare arrays across process and runtime boundaries.
//!
//! - **Byte streams** ([`ToByteStream`], [`FromByteStream`]): row-major
//!   element transfer through any [`std::io::Read`]/[`std::io::Write`], or
//!   through [`bytes::Bytes`] buffers
//! - **External memory binding** ([`bind_dense`], [`bind_sparse`],
//!   [`bind_tensor`]): arrays that read and write host-owned bytes in place
//!
//! ## Example
//!
//! ```
//! use ndshare_core::{DenseArray, Storage};
//! use ndshare_io::{bind_dense, materialize, RawMemory, ToByteStream};
//!
//! let host = vec![1.0f64, 2.0, 3.0, 4.0];
//! let bytes: &[u8] = bytemuck::cast_slice(&host);
//!
//! let bound = bind_dense::<f64>(RawMemory::ReadOnly(bytes), [2, 2], true).unwrap();
//! assert_eq!(bound.to_bytes().unwrap().len(), 32);
//!
//! let owned: DenseArray<'static, f64> = materialize(&bound).unwrap();
//! assert_eq!(owned.get(&[1, 0]).unwrap(), 3.0);
//! ```

pub mod binding;
pub mod stream;

pub use binding::{
    bind_dense, bind_sparse, bind_tensor, materialize, release, snapshot, ExternalTensor,
    RawMemory,
};
pub use stream::{FromByteStream, ToByteStream};

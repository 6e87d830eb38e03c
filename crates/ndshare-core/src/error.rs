//! Unified error type for ndshare arrays
//!
//! Every fallible operation in the engine reports one of the conditions below.
//! None of them is fatal: each is local to the failing call and the caller is
//! expected to correct its input or pick another operation.
//!
//! # Partial writes
//!
//! Bulk transfers abort on the first failing element. The destination state
//! before that element is unspecified; callers that need atomicity must
//! transfer into a scratch copy first.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::error::{NdError, NdResult};
//!
//! fn check_position(index: usize, extent: usize) -> NdResult<()> {
//!     if index >= extent {
//!         return Err(NdError::out_of_range(0, index, extent));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_position(3, 2).is_err());
//! ```

use thiserror::Error;

/// Top-level error type for all array operations
#[derive(Error, Debug)]
pub enum NdError {
    /// A coordinate or slice position lies outside the current extents
    #[error("Index out of range: index {index} is outside dimension {dimension} with extent {extent}")]
    IndexOutOfRange {
        dimension: usize,
        index: i64,
        extent: usize,
    },

    /// Malformed input, e.g. a non-positive modulo or a coordinate of the wrong length
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Element count or rank disagreement between a transfer source and destination
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Sparse value capacity exhausted, or a flat container too small for the element count
    #[error("Capacity exceeded: {requested} elements requested but only {capacity} available")]
    CapacityExceeded { capacity: usize, requested: usize },

    /// A write was attempted on a read-only array or view
    #[error("Array is read-only")]
    ReadOnly,

    /// The operation has no meaning for this storage backend
    #[error("Operation {operation} is not supported by {backend} storage")]
    UnsupportedOperation {
        operation: &'static str,
        backend: &'static str,
    },

    /// A cursor or byte stream was advanced past the available elements
    #[error("End of data: {context}")]
    EndOfData { context: String },

    /// A global element count was requested on a shape with ragged dimensions
    #[error("Undefined size: dimension {dimension} is ragged")]
    UndefinedSize { dimension: usize },

    /// I/O failure raised by a byte channel
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for array operations
pub type NdResult<T> = Result<T, NdError>;

// Convenience constructors for common error patterns
impl NdError {
    /// Create an index out of range error
    pub fn out_of_range(dimension: usize, index: usize, extent: usize) -> Self {
        Self::out_of_range_signed(dimension, index as i64, extent)
    }

    /// Create an index out of range error for a signed (possibly negative) position
    pub fn out_of_range_signed(dimension: usize, index: i64, extent: usize) -> Self {
        NdError::IndexOutOfRange {
            dimension,
            index,
            extent,
        }
    }

    /// Create an invalid argument error with a message
    pub fn invalid(reason: impl Into<String>) -> Self {
        NdError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        NdError::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }

    /// Create a capacity exceeded error
    pub fn capacity(capacity: usize, requested: usize) -> Self {
        NdError::CapacityExceeded {
            capacity,
            requested,
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: &'static str, backend: &'static str) -> Self {
        NdError::UnsupportedOperation { operation, backend }
    }

    /// Create an end of data error
    pub fn end_of_data(context: impl Into<String>) -> Self {
        NdError::EndOfData {
            context: context.into(),
        }
    }

    /// Whether this error reports an out-of-range coordinate
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, NdError::IndexOutOfRange { .. })
    }
}

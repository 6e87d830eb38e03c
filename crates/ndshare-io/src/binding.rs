//! Binding arrays to externally owned memory.
//!
//! A host runtime that already holds tensor bytes hands them over as
//! [`RawMemory`]; the bound array reads and writes those bytes in place for
//! as long as the borrow lives. The lifetime `'m` on the returned arrays is
//! the validity window of the external buffer: the borrow checker rejects
//! any use after the host reclaims it.
//!
//! Only element types with a plain-old-data representation can be bound
//! ([`bytemuck::Pod`]); textual tensors must be copied through a byte
//! stream instead.

use bytemuck::Pod;
use ndshare_core::{
    DataType, DenseArray, Element, NdArray, NdError, NdResult, NdView, Shape, SparseArray,
    Storage, StorageExt,
};

/// Externally owned bytes offered for binding
#[derive(Debug)]
pub enum RawMemory<'m> {
    /// Bytes the host only lends for reading
    ReadOnly(&'m [u8]),
    /// Bytes the host lends for reading and writing
    ReadWrite(&'m mut [u8]),
}

impl RawMemory<'_> {
    pub fn byte_len(&self) -> usize {
        match self {
            RawMemory::ReadOnly(bytes) => bytes.len(),
            RawMemory::ReadWrite(bytes) => bytes.len(),
        }
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, RawMemory::ReadWrite(_))
    }
}

impl<'m> From<&'m [u8]> for RawMemory<'m> {
    fn from(bytes: &'m [u8]) -> Self {
        RawMemory::ReadOnly(bytes)
    }
}

impl<'m> From<&'m mut [u8]> for RawMemory<'m> {
    fn from(bytes: &'m mut [u8]) -> Self {
        RawMemory::ReadWrite(bytes)
    }
}

/// A tensor owned by a host runtime
pub trait ExternalTensor {
    /// Logical shape of the tensor
    fn shape(&self) -> &Shape;

    /// Element kind of the tensor bytes
    fn dtype(&self) -> DataType;

    /// The tensor's backing bytes
    fn memory(&mut self) -> RawMemory<'_>;
}

/// Bind a dense array directly onto external bytes; no data is copied.
///
/// # Errors
///
/// - `ShapeMismatch` if the byte length differs from `shape` times the element width
/// - `InvalidArgument` if that byte length overflows `usize`, the bytes are
///   misaligned for `T`, or writable access is requested over read-only memory
///
/// # Examples
///
/// ```
/// use ndshare_core::Storage;
/// use ndshare_io::{bind_dense, RawMemory};
///
/// let mut host = vec![0.0f32; 6];
/// {
///     let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut host);
///     let mut arr = bind_dense::<f32>(RawMemory::ReadWrite(bytes), [2, 3], false).unwrap();
///     arr.set(&[1, 2], 4.5).unwrap();
/// }
/// assert_eq!(host[5], 4.5);
/// ```
pub fn bind_dense<'m, T>(
    memory: RawMemory<'m>,
    shape: impl Into<Shape>,
    read_only: bool,
) -> NdResult<DenseArray<'m, T>>
where
    T: Element + Pod,
{
    let shape = shape.into();
    let size = shape.size()?;
    let expected = size.checked_mul(std::mem::size_of::<T>()).ok_or_else(|| {
        NdError::invalid(format!(
            "{} elements of {} overflow the addressable byte length",
            size,
            T::DTYPE
        ))
    })?;
    if memory.byte_len() != expected {
        return Err(NdError::shape_mismatch(
            "bind_dense bytes",
            expected,
            memory.byte_len(),
        ));
    }

    tracing::debug!(
        shape = %shape,
        dtype = %T::DTYPE,
        bytes = expected,
        read_only,
        "binding external memory"
    );

    match memory {
        RawMemory::ReadOnly(bytes) => {
            if !read_only {
                return Err(NdError::invalid(
                    "read-only memory cannot be bound for writing",
                ));
            }
            let data = bytemuck::try_cast_slice::<u8, T>(bytes).map_err(|e| {
                NdError::invalid(format!("cannot reinterpret external memory: {}", e))
            })?;
            DenseArray::from_borrowed(data, shape)
        }
        RawMemory::ReadWrite(bytes) => {
            let data = bytemuck::try_cast_slice_mut::<u8, T>(bytes).map_err(|e| {
                NdError::invalid(format!("cannot reinterpret external memory: {}", e))
            })?;
            DenseArray::from_borrowed_mut(data, shape, read_only)
        }
    }
}

/// Bind a sparse array onto external index and value buffers.
///
/// `indices` holds `capacity × rank` little-endian `i64` coordinates and
/// `values` holds `capacity` elements; the first `stored` entries are live.
pub fn bind_sparse<'m, T>(
    indices: RawMemory<'m>,
    values: RawMemory<'m>,
    shape: impl Into<Shape>,
    capacity: usize,
    stored: usize,
    read_only: bool,
) -> NdResult<SparseArray<'m, T>>
where
    T: Element + Pod,
{
    let shape = shape.into();
    let rank = shape.rank();
    let indices = bind_dense::<i64>(indices, [capacity, rank], read_only)?;
    let values = bind_dense::<T>(values, [capacity], read_only)?;
    SparseArray::from_parts(indices, values, shape, stored, read_only)
}

/// Bind a dense array onto a host tensor, checking its element kind
pub fn bind_tensor<'m, T, E>(tensor: &'m mut E, read_only: bool) -> NdResult<DenseArray<'m, T>>
where
    T: Element + Pod,
    E: ExternalTensor + ?Sized,
{
    let dtype = tensor.dtype();
    if dtype != T::DTYPE {
        return Err(NdError::invalid(format!(
            "tensor holds {} elements, requested {}",
            dtype,
            T::DTYPE
        )));
    }
    let shape = tensor.shape().clone();
    bind_dense(tensor.memory(), shape, read_only)
}

/// Read-only view of a bound array for downstream consumers
pub fn snapshot<S: Storage>(array: &S) -> NdResult<NdView<'_, S>> {
    array.view()
}

/// Copy a bound array into owned memory that outlives the external buffer
pub fn materialize<S: Storage>(array: &S) -> NdResult<DenseArray<'static, S::Elem>> {
    array.view()?.to_dense()
}

/// Give a bound array back to its host; the external buffer is untouched
pub fn release<'m, T: Element>(array: impl Into<NdArray<'m, T>>) {
    let array = array.into();
    tracing::debug!(
        kind = array.kind().name(),
        shape = %array.shape(),
        "releasing bound array"
    );
}

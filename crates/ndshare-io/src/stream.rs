//! Byte-stream transfer of array contents.
//!
//! Elements travel in row-major order across all dimensions, each encoded
//! with the element codec of [`ndshare_core::dtype`]:
//!
//! | element      | bytes                                                      |
//! |--------------|------------------------------------------------------------|
//! | `f32`, `i32` | 4, little-endian                                           |
//! | `f64`, `i64` | 8, little-endian                                           |
//! | `u8`, `bool` | 1 (`bool` is `0` or `1`)                                   |
//! | text         | `u32` LE byte length + UTF-8, or exactly `element_length` bytes right-padded when a padded layout is configured |
//!
//! [`ToByteStream::write_to`] reads the array out into a channel;
//! [`FromByteStream::read_from`] fills the array from a channel. Ragged
//! arrays can be written out (leaves in row-major order) but not filled
//! from a stream: without explicit coordinates the structure is ambiguous.
//!
//! A failing read leaves the array partially updated up to the failing
//! element.
//!
//! # Examples
//!
//! ```
//! use ndshare_core::{DenseArray, Storage};
//! use ndshare_io::{FromByteStream, ToByteStream};
//!
//! let words = DenseArray::from_vec([2], vec!["ab".to_string(), "c".to_string()]).unwrap();
//! let bytes = words.to_bytes().unwrap();
//! assert_eq!(&bytes[..6], &[2, 0, 0, 0, b'a', b'b']);
//!
//! let mut back = DenseArray::<String>::zeros([2]).unwrap();
//! back.read_bytes(bytes).unwrap();
//! assert_eq!(back.get(&[1]).unwrap(), "c");
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ndshare_core::shape::Coordinates;
use ndshare_core::{
    DenseArray, Element, ElementLayout, NdArray, NdError, NdResult, NdView, NdViewMut, RaggedArray,
    SparseArray, Storage, StorageExt,
};
use std::io::{Read, Write};

/// Read array contents out into an ordered byte channel
pub trait ToByteStream {
    /// Encode every element into `out`; returns the number of bytes written
    fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> NdResult<u64>;

    /// Encode every element into a new buffer
    fn to_bytes(&self) -> NdResult<Bytes> {
        let mut writer = BytesMut::new().writer();
        self.write_to(&mut writer)?;
        Ok(writer.into_inner().freeze())
    }
}

/// Fill array contents from an ordered byte channel
pub trait FromByteStream {
    /// Decode one element per position from `input`; returns the number of
    /// elements written.
    ///
    /// # Errors
    ///
    /// - `EndOfData` if the stream ends early
    /// - `InvalidArgument` for malformed element bytes
    /// - `ReadOnly` if the array is read-only
    /// - `UnsupportedOperation` for ragged arrays
    fn read_from<R: Read + ?Sized>(&mut self, input: &mut R) -> NdResult<usize>;

    /// Decode from a buffer that must be consumed exactly
    fn read_bytes(&mut self, bytes: Bytes) -> NdResult<usize> {
        let mut reader = bytes.reader();
        let count = self.read_from(&mut reader)?;
        let trailing = reader.get_ref().remaining();
        if trailing > 0 {
            return Err(NdError::invalid(format!(
                "{} trailing bytes after {} elements",
                trailing, count
            )));
        }
        Ok(count)
    }
}

fn encode_all<T, W, I>(values: I, layout: ElementLayout, out: &mut W) -> NdResult<u64>
where
    T: Element,
    W: Write + ?Sized,
    I: IntoIterator<Item = NdResult<T>>,
{
    let mut written = 0u64;
    let mut count = 0usize;
    for value in values {
        let value = value?;
        value.encode(layout, out)?;
        written += value.encoded_len(layout) as u64;
        count += 1;
    }
    tracing::trace!(count, bytes = written, "stream write");
    Ok(written)
}

impl<S: Storage + ?Sized> ToByteStream for NdView<'_, S> {
    fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> NdResult<u64> {
        let values = Coordinates::new(self.shape()).map(|coord| self.get(&coord));
        encode_all(values, self.storage().layout(), out)
    }
}

impl<T: Element> ToByteStream for DenseArray<'_, T> {
    fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> NdResult<u64> {
        encode_all(self.as_slice().iter().cloned().map(Ok), self.layout(), out)
    }
}

impl<T: Element> ToByteStream for SparseArray<'_, T> {
    fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> NdResult<u64> {
        self.view()?.write_to(out)
    }
}

impl<T: Element> ToByteStream for RaggedArray<T> {
    fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> NdResult<u64> {
        encode_all(self.leaves().into_iter().map(Ok), self.layout(), out)
    }
}

impl<T: Element> ToByteStream for NdArray<'_, T> {
    fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> NdResult<u64> {
        match self {
            NdArray::Dense(a) => a.write_to(out),
            NdArray::Sparse(a) => a.write_to(out),
            NdArray::Ragged(a) => a.write_to(out),
        }
    }
}

impl<S: Storage + ?Sized> FromByteStream for NdViewMut<'_, S> {
    /// Zero values landing on unstored sparse coordinates are skipped so they
    /// do not consume capacity.
    fn read_from<R: Read + ?Sized>(&mut self, input: &mut R) -> NdResult<usize> {
        if self.is_read_only() {
            return Err(NdError::ReadOnly);
        }
        let layout = self.as_view().storage().layout();
        let mut count = 0;
        for coord in Coordinates::new(self.shape()) {
            let value = S::Elem::decode(layout, input)?;
            self.assign(&coord, value)?;
            count += 1;
        }
        tracing::trace!(count, "stream read");
        Ok(count)
    }
}

impl<T: Element> FromByteStream for DenseArray<'_, T> {
    fn read_from<R: Read + ?Sized>(&mut self, input: &mut R) -> NdResult<usize> {
        self.view_mut()?.read_from(input)
    }
}

impl<T: Element> FromByteStream for SparseArray<'_, T> {
    fn read_from<R: Read + ?Sized>(&mut self, input: &mut R) -> NdResult<usize> {
        let count = self.view_mut()?.read_from(input)?;
        tracing::trace!(stored = self.stored(), "sparse stream read");
        Ok(count)
    }
}

impl<T: Element> FromByteStream for RaggedArray<T> {
    fn read_from<R: Read + ?Sized>(&mut self, _input: &mut R) -> NdResult<usize> {
        Err(NdError::unsupported("read_from", self.kind().name()))
    }
}

impl<T: Element> FromByteStream for NdArray<'_, T> {
    fn read_from<R: Read + ?Sized>(&mut self, input: &mut R) -> NdResult<usize> {
        match self {
            NdArray::Dense(a) => a.read_from(input),
            NdArray::Sparse(a) => a.read_from(input),
            NdArray::Ragged(a) => a.read_from(input),
        }
    }
}

//! Element types and their byte encoding.
//!
//! [`Element`] is implemented for the fixed set of supported kinds:
//! `f32`, `f64`, `i32`, `i64`, `bool`, `u8` and the variable-length `String`.
//!
//! ## Byte encoding
//!
//! All multi-byte numbers are little-endian. `bool` is one byte (`0`/`1`).
//! Text uses one of two layouts:
//!
//! - [`ElementLayout::Natural`]: a `u32` little-endian byte length followed by
//!   the UTF-8 bytes.
//! - [`ElementLayout::PaddedText`]: exactly `width` bytes, the UTF-8 bytes
//!   followed by the padding byte. Trailing padding bytes are stripped on read.
//!
//! Numeric kinds ignore the layout.

use crate::error::{NdError, NdResult};
use std::fmt;
use std::io::{ErrorKind, Read, Write};

/// Logical element kind of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    Float32,
    Float64,
    Int32,
    Int64,
    Bool,
    UInt8,
    Text,
}

impl DataType {
    /// Per-element byte size for fixed-width kinds, `None` for text
    pub const fn byte_width(&self) -> Option<usize> {
        match self {
            DataType::Float32 | DataType::Int32 => Some(4),
            DataType::Float64 | DataType::Int64 => Some(8),
            DataType::Bool | DataType::UInt8 => Some(1),
            DataType::Text => None,
        }
    }

    pub const fn is_variable_sized(&self) -> bool {
        matches!(self, DataType::Text)
    }

    /// Short lowercase name
    pub const fn name(&self) -> &'static str {
        match self {
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Bool => "bool",
            DataType::UInt8 => "uint8",
            DataType::Text => "text",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How elements are laid out in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementLayout {
    /// Native width for numbers, length-prefixed for text
    #[default]
    Natural,
    /// Text stored in a fixed number of bytes, right-padded
    PaddedText { width: usize, padding: u8 },
}

/// Construction-time options for textual arrays.
///
/// Without an element length, text is stored with the natural
/// length-prefixed layout and the buffer size is only known once every
/// element is set.
///
/// # Examples
///
/// ```
/// use ndshare_core::dtype::{ElementLayout, TextOptions};
///
/// let opts = TextOptions::new().element_length(8).padding(b' ');
/// assert_eq!(opts.layout(), ElementLayout::PaddedText { width: 8, padding: b' ' });
/// assert_eq!(TextOptions::default().layout(), ElementLayout::Natural);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextOptions {
    /// Fixed per-element byte length (default: none, length-prefixed)
    pub element_length: Option<usize>,
    /// Padding byte used to fill short elements (default: 0)
    pub padding: u8,
}

impl TextOptions {
    /// Create default text options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed per-element byte length
    pub fn element_length(mut self, len: usize) -> Self {
        self.element_length = Some(len);
        self
    }

    /// Set the padding byte
    pub fn padding(mut self, padding: u8) -> Self {
        self.padding = padding;
        self
    }

    /// Resulting element layout
    pub fn layout(&self) -> ElementLayout {
        match self.element_length {
            Some(width) => ElementLayout::PaddedText {
                width,
                padding: self.padding,
            },
            None => ElementLayout::Natural,
        }
    }
}

/// A value that can be stored in an array.
///
/// Implementations provide the zero value used for unset sparse coordinates
/// and freshly grown ragged levels, plus the stable byte codec.
pub trait Element: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Logical kind of this element type
    const DTYPE: DataType;

    /// The zero value (`0`, `false`, empty string)
    fn zero() -> Self;

    /// Check that this value can be stored under `layout`
    fn check_layout(&self, _layout: ElementLayout) -> NdResult<()> {
        Ok(())
    }

    /// Number of bytes [`encode`](Element::encode) writes for this value
    fn encoded_len(&self, layout: ElementLayout) -> usize;

    /// Write this value to `out`
    fn encode<W: Write + ?Sized>(&self, layout: ElementLayout, out: &mut W) -> NdResult<()>;

    /// Read one value from `input`.
    ///
    /// # Errors
    ///
    /// - `EndOfData` if the stream ends inside the value
    /// - `InvalidArgument` if the bytes are not a valid encoding
    fn decode<R: Read + ?Sized>(layout: ElementLayout, input: &mut R) -> NdResult<Self>;
}

fn read_exact<R: Read + ?Sized>(input: &mut R, buf: &mut [u8]) -> NdResult<()> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            NdError::end_of_data(format!("stream ended inside a {}-byte value", buf.len()))
        }
        _ => NdError::Io(e),
    })
}

macro_rules! impl_fixed_element {
    ($ty:ty, $dtype:ident, $zero:expr) => {
        impl Element for $ty {
            const DTYPE: DataType = DataType::$dtype;

            fn zero() -> Self {
                $zero
            }

            fn encoded_len(&self, _layout: ElementLayout) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn encode<W: Write + ?Sized>(
                &self,
                _layout: ElementLayout,
                out: &mut W,
            ) -> NdResult<()> {
                out.write_all(&self.to_le_bytes())?;
                Ok(())
            }

            fn decode<R: Read + ?Sized>(_layout: ElementLayout, input: &mut R) -> NdResult<Self> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                read_exact(input, &mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    };
}

impl_fixed_element!(f32, Float32, 0.0);
impl_fixed_element!(f64, Float64, 0.0);
impl_fixed_element!(i32, Int32, 0);
impl_fixed_element!(i64, Int64, 0);
impl_fixed_element!(u8, UInt8, 0);

impl Element for bool {
    const DTYPE: DataType = DataType::Bool;

    fn zero() -> Self {
        false
    }

    fn encoded_len(&self, _layout: ElementLayout) -> usize {
        1
    }

    fn encode<W: Write + ?Sized>(&self, _layout: ElementLayout, out: &mut W) -> NdResult<()> {
        out.write_all(&[u8::from(*self)])?;
        Ok(())
    }

    fn decode<R: Read + ?Sized>(_layout: ElementLayout, input: &mut R) -> NdResult<Self> {
        let mut buf = [0u8; 1];
        read_exact(input, &mut buf)?;
        match buf[0] {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(NdError::invalid(format!(
                "invalid bool byte {} (expected 0 or 1)",
                b
            ))),
        }
    }
}

impl Element for String {
    const DTYPE: DataType = DataType::Text;

    fn zero() -> Self {
        String::new()
    }

    fn check_layout(&self, layout: ElementLayout) -> NdResult<()> {
        match layout {
            ElementLayout::PaddedText { width, .. } if self.len() > width => {
                Err(NdError::invalid(format!(
                    "text of {} bytes does not fit element length {}",
                    self.len(),
                    width
                )))
            }
            // Trailing padding is stripped on read
            ElementLayout::PaddedText { padding, .. }
                if self.as_bytes().last() == Some(&padding) =>
            {
                Err(NdError::invalid(format!(
                    "text ending in padding byte {:#04x} cannot be stored padded",
                    padding
                )))
            }
            ElementLayout::Natural if self.len() > u32::MAX as usize => Err(NdError::invalid(
                format!("text of {} bytes exceeds the length prefix", self.len()),
            )),
            _ => Ok(()),
        }
    }

    fn encoded_len(&self, layout: ElementLayout) -> usize {
        match layout {
            ElementLayout::Natural => 4 + self.len(),
            ElementLayout::PaddedText { width, .. } => width,
        }
    }

    fn encode<W: Write + ?Sized>(&self, layout: ElementLayout, out: &mut W) -> NdResult<()> {
        self.check_layout(layout)?;
        match layout {
            ElementLayout::Natural => {
                out.write_all(&(self.len() as u32).to_le_bytes())?;
                out.write_all(self.as_bytes())?;
            }
            ElementLayout::PaddedText { width, padding } => {
                out.write_all(self.as_bytes())?;
                let fill = vec![padding; width - self.len()];
                out.write_all(&fill)?;
            }
        }
        Ok(())
    }

    fn decode<R: Read + ?Sized>(layout: ElementLayout, input: &mut R) -> NdResult<Self> {
        let bytes = match layout {
            ElementLayout::Natural => {
                let mut len = [0u8; 4];
                read_exact(input, &mut len)?;
                let len = u32::from_le_bytes(len) as usize;
                let mut bytes = Vec::new();
                Read::take(&mut *input, len as u64).read_to_end(&mut bytes)?;
                if bytes.len() != len {
                    return Err(NdError::end_of_data(format!(
                        "stream ended after {} of {} text bytes",
                        bytes.len(),
                        len
                    )));
                }
                bytes
            }
            ElementLayout::PaddedText { width, padding } => {
                let mut bytes = vec![0u8; width];
                read_exact(input, &mut bytes)?;
                let end = bytes
                    .iter()
                    .rposition(|&b| b != padding)
                    .map_or(0, |p| p + 1);
                bytes.truncate(end);
                bytes
            }
        };
        String::from_utf8(bytes).map_err(|_| NdError::invalid("invalid UTF-8 in text element"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Element>(value: T, layout: ElementLayout) -> T {
        let mut buf = Vec::new();
        value.encode(layout, &mut buf).unwrap();
        assert_eq!(buf.len(), value.encoded_len(layout));
        T::decode(layout, &mut buf.as_slice()).unwrap()
    }

    #[test]
    fn test_byte_widths() {
        assert_eq!(DataType::Float32.byte_width(), Some(4));
        assert_eq!(DataType::Int64.byte_width(), Some(8));
        assert_eq!(DataType::Bool.byte_width(), Some(1));
        assert_eq!(DataType::Text.byte_width(), None);
        assert!(DataType::Text.is_variable_sized());
    }

    #[test]
    fn test_fixed_width_little_endian() {
        let mut buf = Vec::new();
        1i32.encode(ElementLayout::Natural, &mut buf).unwrap();
        assert_eq!(buf, vec![1, 0, 0, 0]);
        assert_eq!(roundtrip(-2.5f64, ElementLayout::Natural), -2.5);
    }

    #[test]
    fn test_text_length_prefixed() {
        let mut buf = Vec::new();
        "héllo"
            .to_string()
            .encode(ElementLayout::Natural, &mut buf)
            .unwrap();
        assert_eq!(&buf[..4], &6u32.to_le_bytes());
        assert_eq!(roundtrip(String::new(), ElementLayout::Natural), "");
    }

    #[test]
    fn test_text_padded() {
        let layout = ElementLayout::PaddedText {
            width: 6,
            padding: b'_',
        };
        let mut buf = Vec::new();
        "abc".to_string().encode(layout, &mut buf).unwrap();
        assert_eq!(buf, b"abc___".to_vec());
        assert_eq!(roundtrip("abc".to_string(), layout), "abc");
    }

    #[test]
    fn test_text_too_long_for_padding() {
        let layout = ElementLayout::PaddedText {
            width: 2,
            padding: 0,
        };
        assert!(matches!(
            "abc".to_string().check_layout(layout),
            Err(NdError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let bytes = [1u8, 2];
        let err = i32::decode(ElementLayout::Natural, &mut &bytes[..]).unwrap_err();
        assert!(matches!(err, NdError::EndOfData { .. }));
    }

    #[test]
    fn test_invalid_bool_byte() {
        let bytes = [7u8];
        assert!(matches!(
            bool::decode(ElementLayout::Natural, &mut &bytes[..]),
            Err(NdError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_text_ending_in_padding_rejected() {
        let layout = ElementLayout::PaddedText {
            width: 4,
            padding: b' ',
        };
        assert!(matches!(
            "ab ".to_string().check_layout(layout),
            Err(NdError::InvalidArgument { .. })
        ));
        assert!(" ab".to_string().check_layout(layout).is_ok());
        assert!(String::new().check_layout(layout).is_ok());
        assert!("ab ".to_string().check_layout(ElementLayout::Natural).is_ok());
    }

    #[test]
    fn test_oversized_length_prefix_is_end_of_data() {
        let mut bytes = u32::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let err = String::decode(ElementLayout::Natural, &mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, NdError::EndOfData { .. }));
    }
}

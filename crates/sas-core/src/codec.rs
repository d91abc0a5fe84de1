//! # Fixed-Width Field Codec
//!
//! Primitives for the payload fields of the long polls this engine answers.
//!
//! - BCD fields are packed two digits per byte, most significant digit first.
//! - Binary fields are little-endian.
//!
//! [`PayloadReader`] and [`PayloadWriter`] keep offsets so truncation errors
//! point at the field that failed.

use crate::error::CodecError;

// ─── BCD ─────────────────────────────────────────────────────────────

/// Encode `value` as `width` bytes of packed BCD.
pub fn bcd_encode(value: u64, width: usize) -> Result<Vec<u8>, CodecError> {
    let digits = width * 2;
    let mut out = vec![0u8; width];
    let mut rest = value;
    for byte in out.iter_mut().rev() {
        let low = (rest % 10) as u8;
        rest /= 10;
        let high = (rest % 10) as u8;
        rest /= 10;
        *byte = (high << 4) | low;
    }
    if rest != 0 {
        return Err(CodecError::BcdOverflow { value, digits });
    }
    Ok(out)
}

/// Decode packed BCD into an integer.
///
/// Fields wider than 9 bytes may overflow `u64`; callers only use this for
/// the widths defined by the long-poll tables (at most 9 bytes).
pub fn bcd_decode(bytes: &[u8]) -> Result<u64, CodecError> {
    let mut value: u64 = 0;
    for (offset, &byte) in bytes.iter().enumerate() {
        let high = byte >> 4;
        let low = byte & 0x0F;
        if high > 9 || low > 9 {
            return Err(CodecError::InvalidBcd { byte, offset });
        }
        value = value * 100 + u64::from(high) * 10 + u64::from(low);
    }
    Ok(value)
}

/// Decode packed BCD into its digit string, leading zeros kept.
pub fn bcd_digits(bytes: &[u8]) -> Result<String, CodecError> {
    let mut digits = String::with_capacity(bytes.len() * 2);
    for (offset, &byte) in bytes.iter().enumerate() {
        let high = byte >> 4;
        let low = byte & 0x0F;
        if high > 9 || low > 9 {
            return Err(CodecError::InvalidBcd { byte, offset });
        }
        digits.push(char::from(b'0' + high));
        digits.push(char::from(b'0' + low));
    }
    Ok(digits)
}

// ─── Writer ──────────────────────────────────────────────────────────

/// Append-only builder for a response payload.
#[derive(Debug, Default)]
pub struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw byte.
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// Append a little-endian binary field of `width` bytes.
    pub fn binary(&mut self, value: u64, width: usize) -> Result<&mut Self, CodecError> {
        if width < 8 && value >> (width * 8) != 0 {
            return Err(CodecError::BinaryOverflow {
                value,
                bytes: width,
            });
        }
        self.buf.extend_from_slice(&value.to_le_bytes()[..width]);
        Ok(self)
    }

    /// Append a BCD field of `width` bytes.
    pub fn bcd(&mut self, value: u64, width: usize) -> Result<&mut Self, CodecError> {
        self.buf.extend(bcd_encode(value, width)?);
        Ok(self)
    }

    /// Append raw bytes.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Current length of the payload.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish and return the payload.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Finish, prefixing the payload with its own length byte.
    pub fn finish_with_length(self) -> Result<Vec<u8>, CodecError> {
        let len = u8::try_from(self.buf.len()).map_err(|_| CodecError::BinaryOverflow {
            value: self.buf.len() as u64,
            bytes: 1,
        })?;
        let mut out = Vec::with_capacity(self.buf.len() + 1);
        out.push(len);
        out.extend(self.buf);
        Ok(out)
    }
}

// ─── Reader ──────────────────────────────────────────────────────────

/// Cursor over an inbound command payload.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> PayloadReader<'a> {
    /// Start reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Start reading a length-prefixed payload, checking the length byte.
    pub fn with_length_prefix(bytes: &'a [u8]) -> Result<Self, CodecError> {
        let mut reader = Self::new(bytes);
        let declared = usize::from(reader.u8()?);
        let actual = reader.remaining();
        if declared != actual {
            return Err(CodecError::LengthMismatch { declared, actual });
        }
        Ok(reader)
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self.offset + n;
        if end > self.bytes.len() {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: end - self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Read one byte.
    pub fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian binary field of `width` bytes (at most 8).
    pub fn binary(&mut self, width: usize) -> Result<u64, CodecError> {
        let raw = self.take(width)?;
        let mut le = [0u8; 8];
        le[..width].copy_from_slice(raw);
        Ok(u64::from_le_bytes(le))
    }

    /// Read a BCD field of `width` bytes.
    pub fn bcd(&mut self, width: usize) -> Result<u64, CodecError> {
        bcd_decode(self.take(width)?)
    }

    /// Read a BCD field of `width` bytes as a digit string.
    pub fn bcd_digits(&mut self, width: usize) -> Result<String, CodecError> {
        bcd_digits(self.take(width)?)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcd_encode_amount() {
        assert_eq!(
            bcd_encode(1_000, 5).unwrap(),
            vec![0x00, 0x00, 0x00, 0x10, 0x00]
        );
    }

    #[test]
    fn test_bcd_encode_overflow() {
        let err = bcd_encode(100, 1).unwrap_err();
        assert_eq!(
            err,
            CodecError::BcdOverflow {
                value: 100,
                digits: 2
            }
        );
    }

    #[test]
    fn test_bcd_decode_rejects_hex_nibble() {
        let err = bcd_decode(&[0x12, 0x3A]).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidBcd {
                byte: 0x3A,
                offset: 1
            }
        );
    }

    #[test]
    fn test_bcd_digits_keep_leading_zeros() {
        assert_eq!(bcd_digits(&[0x03, 0x64]).unwrap(), "0364");
    }

    #[test]
    fn test_writer_binary_is_little_endian() {
        let mut w = PayloadWriter::new();
        w.binary(0x0012_3456, 3).unwrap();
        assert_eq!(w.finish(), vec![0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_writer_binary_overflow() {
        let mut w = PayloadWriter::new();
        assert!(w.binary(0x1_0000, 2).is_err());
    }

    #[test]
    fn test_writer_length_prefix() {
        let mut w = PayloadWriter::new();
        w.u8(0xAA).u8(0xBB);
        assert_eq!(w.finish_with_length().unwrap(), vec![2, 0xAA, 0xBB]);
    }

    #[test]
    fn test_reader_truncated() {
        let mut r = PayloadReader::new(&[0x01, 0x02]);
        r.u8().unwrap();
        let err = r.binary(3).unwrap_err();
        assert_eq!(err, CodecError::Truncated { offset: 1, needed: 2 });
    }

    #[test]
    fn test_reader_length_mismatch() {
        let err = PayloadReader::with_length_prefix(&[3, 0x00]).unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthMismatch {
                declared: 3,
                actual: 1
            }
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any value that fits a field decodes back to itself.
        #[test]
        fn bcd_fits_field(value in 0u64..10_000_000_000) {
            let encoded = bcd_encode(value, 5).unwrap();
            prop_assert_eq!(encoded.len(), 5);
            prop_assert_eq!(bcd_decode(&encoded).unwrap(), value);
        }

        /// Every encoded nibble is a decimal digit.
        #[test]
        fn bcd_nibbles_are_decimal(value in any::<u32>()) {
            for byte in bcd_encode(u64::from(value), 5).unwrap() {
                prop_assert!(byte >> 4 <= 9 && byte & 0x0F <= 9);
            }
        }
    }
}

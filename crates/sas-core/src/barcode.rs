//! # Barcode → Validation Data
//!
//! A Secure Enhanced ticket barcode is eighteen decimal digits: the first two
//! are the validation system ID, the remaining sixteen are the validation
//! number. `"036429188185446104"` is system ID `3`, validation number
//! `6429188185446104`.
//!
//! On the wire the same eighteen digits travel as nine BCD bytes (parsing
//! code `0x00`).

use crate::codec::bcd_encode;
use crate::error::{BarcodeError, CodecError};
use crate::identity::{ValidationNumber, ValidationSystemId};

/// Number of digits in a parsing-code-0 validation barcode.
pub const VALIDATION_DIGITS: usize = 18;

/// Width of the BCD validation data field on long polls 0x70 and 0x71.
pub const VALIDATION_DATA_BYTES: usize = VALIDATION_DIGITS / 2;

/// Parsing code for eighteen-digit BCD validation data.
pub const PARSING_CODE_BCD18: u8 = 0x00;

/// Validation identifiers carried by a ticket barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationData {
    /// Two-digit validation system ID.
    pub system_id: ValidationSystemId,
    /// Sixteen-digit validation number.
    pub number: ValidationNumber,
}

impl ValidationData {
    /// Derive validation data from a barcode.
    ///
    /// The barcode must contain at least [`VALIDATION_DIGITS`] characters, all
    /// of them decimal digits. Only the first eighteen digits are used.
    pub fn from_barcode(barcode: Option<&str>) -> Result<Self, BarcodeError> {
        let barcode = barcode.ok_or(BarcodeError::Missing)?;
        if let Some(position) = barcode.bytes().position(|b| !b.is_ascii_digit()) {
            return Err(BarcodeError::NonDigit { position });
        }
        if barcode.len() < VALIDATION_DIGITS {
            return Err(BarcodeError::TooShort {
                len: barcode.len(),
                required: VALIDATION_DIGITS,
            });
        }
        let digits = &barcode.as_bytes()[..VALIDATION_DIGITS];
        let system_id = digits[..2]
            .iter()
            .fold(0u8, |acc, d| acc * 10 + (d - b'0'));
        let number = digits[2..]
            .iter()
            .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
        // Both folds are bounded by their digit counts.
        Ok(Self {
            system_id: ValidationSystemId::new(system_id).unwrap_or_default(),
            number: ValidationNumber::new(number).unwrap_or_default(),
        })
    }
}

/// The eighteen digits a barcode travels as on long polls 0x70 and 0x71.
///
/// Longer barcodes keep their leading eighteen digits; shorter ones are
/// zero-padded on the left, as the BCD field carries them. Returns `None`
/// for an empty barcode or one with a non-digit among those digits.
pub fn validation_digits(barcode: &str) -> Option<String> {
    let digits = barcode.get(..VALIDATION_DIGITS).unwrap_or(barcode);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{digits:0>width$}", width = VALIDATION_DIGITS))
}

/// Encode an eighteen-digit barcode as nine BCD bytes.
pub fn encode_validation_data(barcode: &str) -> Result<Vec<u8>, CodecError> {
    if barcode.is_empty()
        || barcode.len() > VALIDATION_DIGITS
        || !barcode.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(CodecError::OutOfRange {
            field: "validation_data",
            value: barcode.len() as u64,
        });
    }
    let value = barcode
        .bytes()
        .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
    bcd_encode(value, VALIDATION_DATA_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_enhanced_barcode() {
        let data = ValidationData::from_barcode(Some("036429188185446104")).unwrap();
        assert_eq!(data.system_id.get(), 3);
        assert_eq!(data.number.get(), 6_429_188_185_446_104);
    }

    #[test]
    fn test_missing_barcode() {
        assert_eq!(
            ValidationData::from_barcode(None).unwrap_err(),
            BarcodeError::Missing
        );
    }

    #[test]
    fn test_short_barcode() {
        assert_eq!(
            ValidationData::from_barcode(Some("12")).unwrap_err(),
            BarcodeError::TooShort {
                len: 2,
                required: 18
            }
        );
    }

    #[test]
    fn test_non_digit_barcode() {
        assert_eq!(
            ValidationData::from_barcode(Some("03642918818544610X")).unwrap_err(),
            BarcodeError::NonDigit { position: 17 }
        );
    }

    #[test]
    fn test_longer_barcode_uses_leading_digits() {
        let data = ValidationData::from_barcode(Some("0364291881854461049")).unwrap();
        assert_eq!(data.system_id.get(), 3);
        assert_eq!(data.number.get(), 6_429_188_185_446_104);
    }

    #[test]
    fn test_encode_validation_data() {
        let bytes = encode_validation_data("036429188185446104").unwrap();
        assert_eq!(
            bytes,
            vec![0x03, 0x64, 0x29, 0x18, 0x81, 0x85, 0x44, 0x61, 0x04]
        );
    }

    #[test]
    fn test_validation_digits_pad_and_truncate() {
        assert_eq!(
            validation_digits("1234567890").as_deref(),
            Some("000000001234567890")
        );
        assert_eq!(
            validation_digits("0364291881854461049").as_deref(),
            Some("036429188185446104")
        );
        assert_eq!(
            validation_digits("036429188185446104").as_deref(),
            Some("036429188185446104")
        );
        assert_eq!(validation_digits(""), None);
        assert_eq!(validation_digits("12AB"), None);
    }
}

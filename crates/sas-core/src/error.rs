//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared by the validation engine crates. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Codec errors name the offending byte offset or field width.
//! - Barcode errors distinguish "absent", "too short", and "non-digit" so the
//!   record selector can log why a response was degraded.
//! - Protocol-level rejections are NOT errors. They travel as status codes in
//!   response payloads.

use thiserror::Error;

/// Top-level error type for the validation engine.
#[derive(Error, Debug)]
pub enum SasError {
    /// Wire payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Barcode could not be turned into validation data.
    #[error("barcode error: {0}")]
    Barcode(#[from] BarcodeError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Error while encoding or decoding a fixed-width wire field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value needs more BCD digits than the field provides.
    #[error("value {value} does not fit in {digits} BCD digits")]
    BcdOverflow {
        /// Value that was being encoded.
        value: u64,
        /// Number of digits available in the field.
        digits: usize,
    },

    /// A nibble above 9 was found while decoding BCD.
    #[error("byte {byte:#04x} at offset {offset} is not valid BCD")]
    InvalidBcd {
        /// The offending byte.
        byte: u8,
        /// Offset of the byte within the field.
        offset: usize,
    },

    /// The value needs more bytes than the binary field provides.
    #[error("value {value} does not fit in {bytes} binary bytes")]
    BinaryOverflow {
        /// Value that was being encoded.
        value: u64,
        /// Width of the field in bytes.
        bytes: usize,
    },

    /// The payload ended before a field could be read.
    #[error("payload truncated: needed {needed} more bytes at offset {offset}")]
    Truncated {
        /// Offset at which the read started.
        offset: usize,
        /// Bytes that were still required.
        needed: usize,
    },

    /// A declared length byte disagrees with the bytes that follow it.
    #[error("declared length {declared} does not match payload length {actual}")]
    LengthMismatch {
        /// Length announced by the payload.
        declared: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// A field held a value outside its defined range.
    #[error("field {field} holds out-of-range value {value}")]
    OutOfRange {
        /// Name of the field.
        field: &'static str,
        /// Offending raw value.
        value: u64,
    },
}

/// Error while deriving validation data from a ticket barcode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarcodeError {
    /// The transaction carries no barcode at all.
    #[error("no barcode present")]
    Missing,

    /// The barcode has fewer digits than the validation format requires.
    #[error("barcode has {len} characters, at least {required} required")]
    TooShort {
        /// Length of the barcode.
        len: usize,
        /// Minimum number of digits required.
        required: usize,
    },

    /// The barcode contains a non-digit character.
    #[error("barcode has non-digit character at position {position}")]
    NonDigit {
        /// Zero-based index of the first offending character.
        position: usize,
    },
}

/// Error while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML document could not be parsed.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration parsed but violates a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

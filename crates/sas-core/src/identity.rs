//! # Wire Identifier Newtypes
//!
//! Newtype wrappers for the identifiers exchanged with the host. Each
//! constructor enforces the range of the wire field that carries it, so an
//! out-of-range value is rejected at the boundary instead of being silently
//! truncated by the encoder.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest value representable in a three-byte binary field.
const THREE_BYTE_MAX: u32 = 0x00FF_FFFF;

/// Identifier of a completed transaction in the history log.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Machine validation ID assigned by the host for Secure Enhanced validation.
///
/// Three binary bytes on the wire. Zero is reserved: a set request carrying
/// zero is a query and never changes stored data.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MachineValidationId(u32);

impl MachineValidationId {
    /// The reserved "query only" identifier.
    pub const QUERY: Self = Self(0);

    /// Largest assignable identifier.
    pub const MAX: u32 = THREE_BYTE_MAX;

    /// Create an identifier, rejecting values wider than three bytes.
    pub fn new(raw: u32) -> Option<Self> {
        (raw <= Self::MAX).then_some(Self(raw))
    }

    /// The raw value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the reserved zero identifier.
    pub fn is_query(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MachineValidationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

/// Validation sequence number, stored and compared modulo 2^24.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceNumber(u32);

impl SequenceNumber {
    /// Largest sequence number before rollover to zero.
    pub const MAX: u32 = THREE_BYTE_MAX;

    /// Number of distinct sequence values.
    pub const MODULUS: u32 = THREE_BYTE_MAX + 1;

    /// Create a sequence number, rejecting values wider than three bytes.
    pub fn new(raw: u32) -> Option<Self> {
        (raw <= Self::MAX).then_some(Self(raw))
    }

    /// Create a sequence number, reducing `raw` modulo 2^24.
    pub fn wrapping(raw: u32) -> Self {
        Self(raw % Self::MODULUS)
    }

    /// The raw value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The following sequence number; `MAX` rolls over to zero.
    pub fn next(self) -> Self {
        Self::wrapping(self.0.wrapping_add(1))
    }

    /// Whether `self` is the immediate successor of `previous`, rollover included.
    pub fn follows(self, previous: Self) -> bool {
        previous.next() == self
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation system ID: two BCD digits, `00`–`99`.
///
/// On long poll 0x58 a system ID of zero means the host denies the cash-out.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ValidationSystemId(u8);

impl ValidationSystemId {
    /// Largest representable system ID.
    pub const MAX: u8 = 99;

    /// Create a system ID, rejecting values above 99.
    pub fn new(raw: u8) -> Option<Self> {
        (raw <= Self::MAX).then_some(Self(raw))
    }

    /// The raw value.
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Validation number: sixteen decimal digits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ValidationNumber(u64);

impl ValidationNumber {
    /// Largest sixteen-digit value.
    pub const MAX: u64 = 9_999_999_999_999_999;

    /// Create a validation number, rejecting values above sixteen digits.
    pub fn new(raw: u64) -> Option<Self> {
        (raw <= Self::MAX).then_some(Self(raw))
    }

    /// The raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ValidationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016}", self.0)
    }
}

/// Restricted credit pool identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PoolId(pub u16);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

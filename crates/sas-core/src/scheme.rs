//! # Validation Schemes and Host-Control Bits
//!
//! The EGM runs exactly one of three ticket-validation schemes. The host
//! negotiates the ticketing features in force through the sixteen-bit
//! status word of long poll 0x7B; [`HostControlBits`] names those bits.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

/// Mutually exclusive ticket-validation schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationScheme {
    /// No validation; ticketing is unavailable.
    #[default]
    None,
    /// The host supplies each validation number (long polls 0x57/0x58).
    System,
    /// The EGM derives validation numbers from its host-assigned ID and
    /// sequence (long polls 0x4C/0x4D).
    SecureEnhanced,
}

impl ValidationScheme {
    /// Returns the canonical scheme name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::System => "SYSTEM",
            Self::SecureEnhanced => "SECURE_ENHANCED",
        }
    }
}

impl fmt::Display for ValidationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-control bits of the extended validation status word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostControlBits(u16);

impl HostControlBits {
    /// No bits set.
    pub const EMPTY: Self = Self(0);
    /// Bit 0: the printer is the cash-out device.
    pub const USE_PRINTER_AS_CASHOUT_DEVICE: Self = Self(1 << 0);
    /// Bit 1: the printer prints handpay receipts.
    pub const USE_PRINTER_AS_HANDPAY_DEVICE: Self = Self(1 << 1);
    /// Bit 2: handpays and handpay receipts are validated.
    pub const VALIDATE_HANDPAYS: Self = Self(1 << 2);
    /// Bit 3: restricted promotional tickets may be printed.
    pub const PRINT_RESTRICTED_TICKETS: Self = Self(1 << 3);
    /// Bit 4: tickets may be printed for foreign restricted amounts.
    pub const TICKETS_FOR_FOREIGN_RESTRICTED_AMOUNTS: Self = Self(1 << 4);
    /// Bit 5: tickets may be redeemed.
    pub const TICKET_REDEMPTION: Self = Self(1 << 5);
    /// Bit 15: Secure Enhanced validation is configured.
    pub const SECURE_ENHANCED_CONFIGURATION: Self = Self(1 << 15);

    /// Every defined bit.
    pub const ALL: Self = Self(
        Self::USE_PRINTER_AS_CASHOUT_DEVICE.0
            | Self::USE_PRINTER_AS_HANDPAY_DEVICE.0
            | Self::VALIDATE_HANDPAYS.0
            | Self::PRINT_RESTRICTED_TICKETS.0
            | Self::TICKETS_FOR_FOREIGN_RESTRICTED_AMOUNTS.0
            | Self::TICKET_REDEMPTION.0
            | Self::SECURE_ENHANCED_CONFIGURATION.0,
    );

    /// Bits that only apply under Secure Enhanced validation.
    pub const SECURE_ENHANCED_ONLY: Self = Self(
        Self::VALIDATE_HANDPAYS.0
            | Self::SECURE_ENHANCED_CONFIGURATION.0
            | Self::USE_PRINTER_AS_HANDPAY_DEVICE.0,
    );

    /// Bits that require a working printer.
    pub const PRINTER: Self =
        Self(Self::USE_PRINTER_AS_CASHOUT_DEVICE.0 | Self::USE_PRINTER_AS_HANDPAY_DEVICE.0);

    /// Build from a raw status word, dropping undefined bits.
    pub fn from_bits_truncate(raw: u16) -> Self {
        Self(raw & Self::ALL.0)
    }

    /// The raw status word.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `self` with the bits of `other` cleared.
    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// `self` with the bits of `other` set or cleared.
    pub fn with(self, other: Self, enabled: bool) -> Self {
        if enabled {
            self | other
        } else {
            self.without(other)
        }
    }

    /// Whether no bits are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for HostControlBits {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for HostControlBits {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for HostControlBits {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl fmt::Display for HostControlBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_serde() {
        let json = serde_json::to_string(&ValidationScheme::SecureEnhanced).unwrap();
        assert_eq!(json, "\"secure_enhanced\"");
    }

    #[test]
    fn test_truncate_drops_undefined_bits() {
        let bits = HostControlBits::from_bits_truncate(0xFFFF);
        assert_eq!(bits, HostControlBits::ALL);
        assert_eq!(bits.bits(), 0x803F);
    }

    #[test]
    fn test_without_and_contains() {
        let bits = HostControlBits::ALL.without(HostControlBits::PRINTER);
        assert!(!bits.contains(HostControlBits::USE_PRINTER_AS_CASHOUT_DEVICE));
        assert!(bits.contains(HostControlBits::TICKET_REDEMPTION));
    }

    #[test]
    fn test_not_stays_within_defined_bits() {
        assert_eq!(!HostControlBits::EMPTY, HostControlBits::ALL);
    }
}

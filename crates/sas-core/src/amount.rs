//! # Amount Units
//!
//! The accounting subsystem keeps balances in millicents (1/1000 of a cent)
//! so fractional denominations never lose precision. Every amount field on
//! the wire is whole cents. These two newtypes make the unit part of the
//! type, so a millicent value cannot be BCD-encoded by accident.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of millicents in one cent.
pub const MILLICENTS_PER_CENT: u64 = 1_000;

/// An amount in the accounting subsystem's internal unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Millicents(pub u64);

/// An amount in the wire unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Millicents {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Convert to wire cents.
    ///
    /// Exact whenever the value is a whole number of cents. Sub-cent
    /// remainders are truncated; the accounting subsystem never produces
    /// them for ticket or handpay amounts.
    pub fn to_cents(self) -> Cents {
        Cents(self.0 / MILLICENTS_PER_CENT)
    }

    /// Whether the value converts to cents without a remainder.
    pub fn is_whole_cents(self) -> bool {
        self.0 % MILLICENTS_PER_CENT == 0
    }

    /// Add two amounts, saturating at `u64::MAX`.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Whether the amount is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Cents {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Convert to the internal unit. `None` on overflow.
    pub fn to_millicents(self) -> Option<Millicents> {
        self.0.checked_mul(MILLICENTS_PER_CENT).map(Millicents)
    }

    /// Whether the amount is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Millicents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mc", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_million_millicents_is_one_thousand_cents() {
        assert_eq!(Millicents(1_000_000).to_cents(), Cents(1_000));
        assert!(Millicents(1_000_000).is_whole_cents());
    }

    #[test]
    fn test_cents_round_trip_is_exact() {
        let cents = Cents(123_456);
        assert_eq!(cents.to_millicents().unwrap().to_cents(), cents);
    }

    #[test]
    fn test_to_millicents_overflow_is_none() {
        assert!(Cents(u64::MAX).to_millicents().is_none());
    }

    #[test]
    fn test_sub_cent_remainder_truncates() {
        assert_eq!(Millicents(1_999).to_cents(), Cents(1));
        assert!(!Millicents(1_999).is_whole_cents());
    }

    #[test]
    fn test_cents_display() {
        assert_eq!(Cents(1_005).to_string(), "10.05");
    }
}

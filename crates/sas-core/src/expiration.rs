//! # Ticket Expirations
//!
//! An expiration field on the wire is four BCD bytes holding one of:
//!
//! - `00000000` — use the configured default.
//! - `0000NNNN` — a day count, 1 to 9999.
//! - `MMDDYYYY` — a calendar date.
//!
//! Any value above 9999 is a date; a valid month makes every date at least
//! `01010000`, so the two encodings never collide.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Largest day count that can be expressed.
pub const MAX_EXPIRATION_DAYS: u16 = 9_999;

/// A ticket expiration as carried on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    /// No explicit expiration; the configured default applies.
    #[default]
    Default,
    /// Expires this many days after issue.
    Days(u16),
    /// Expires on a calendar date.
    Date(NaiveDate),
}

impl Expiration {
    /// Decode the raw eight-digit value of a BCD expiration field.
    pub fn from_wire(raw: u32) -> Result<Self, CodecError> {
        if raw == 0 {
            return Ok(Self::Default);
        }
        if raw <= u32::from(MAX_EXPIRATION_DAYS) {
            return Ok(Self::Days(raw as u16));
        }
        let month = raw / 1_000_000;
        let day = (raw / 10_000) % 100;
        let year = raw % 10_000;
        NaiveDate::from_ymd_opt(year as i32, month, day)
            .map(Self::Date)
            .ok_or(CodecError::OutOfRange {
                field: "expiration",
                value: u64::from(raw),
            })
    }

    /// Raw eight-digit value for the BCD expiration field.
    pub fn to_wire(self) -> u32 {
        match self {
            Self::Default => 0,
            Self::Days(days) => u32::from(days),
            Self::Date(date) => {
                date.month() * 1_000_000 + date.day() * 10_000 + date.year().max(0) as u32
            }
        }
    }

    /// Whether this is the "use default" marker.
    pub fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }

    /// Whether this is a day count.
    pub fn is_day_count(self) -> bool {
        matches!(self, Self::Days(_))
    }

    /// Whether this is a calendar date.
    pub fn is_date(self) -> bool {
        matches!(self, Self::Date(_))
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Days(days) => write!(f, "{days} days"),
            Self::Date(date) => write!(f, "{}", date.format("%m/%d/%Y")),
        }
    }
}

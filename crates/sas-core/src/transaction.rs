//! # Completed Transactions
//!
//! The accounting subsystem hands this engine two classes of completed
//! transaction: tickets printed at cash-out (voucher-out) and handpays.
//! Each class has its own pending-report slot in the record selector.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::amount::Millicents;
use crate::expiration::Expiration;
use crate::identity::{PoolId, TransactionId};

/// Pending-report slot a transaction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Ticket printed at cash-out.
    VoucherOut,
    /// Handpay, with or without a receipt.
    Handpay,
}

impl TransactionKind {
    /// Returns the canonical kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoucherOut => "VOUCHER_OUT",
            Self::Handpay => "HANDPAY",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credit type of a printed ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// Cashable credits.
    Cashable,
    /// Restricted (non-cashable) promotional credits.
    RestrictedPromo,
    /// Non-restricted promotional credits.
    NonRestrictedPromo,
}

/// What caused a handpay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandpayKind {
    /// Credits cancelled by the attendant.
    CancelledCredit,
    /// A game win above the handpay limit.
    GameWin,
    /// A bonus award paid by hand.
    BonusPay,
}

impl HandpayKind {
    /// Whether the handpay is a jackpot (game win or bonus) rather than
    /// cancelled credits.
    pub fn is_jackpot(self) -> bool {
        matches!(self, Self::GameWin | Self::BonusPay)
    }
}

/// Ticket kind reported with a validation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    /// Cashable ticket.
    Cashable,
    /// Restricted promotional ticket.
    RestrictedPromo,
    /// Handpay with no receipt printed.
    HandpayNoReceipt,
    /// Handpay with a receipt printed.
    HandpayReceiptPrinted,
    /// Non-restricted promotional ticket.
    NonRestrictedPromo,
}

impl From<VoucherKind> for TicketKind {
    fn from(kind: VoucherKind) -> Self {
        match kind {
            VoucherKind::Cashable => Self::Cashable,
            VoucherKind::RestrictedPromo => Self::RestrictedPromo,
            VoucherKind::NonRestrictedPromo => Self::NonRestrictedPromo,
        }
    }
}

/// A ticket printed at cash-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherOutTransaction {
    /// History log identifier.
    pub id: TransactionId,
    /// Ticket amount.
    pub amount: Millicents,
    /// Credit type of the ticket.
    pub kind: VoucherKind,
    /// Printed barcode, if one was generated.
    pub barcode: Option<String>,
    /// Ticket sequence number printed on the ticket.
    pub ticket_number: u16,
    /// Expiration printed on the ticket.
    pub expiration: Expiration,
    /// Restricted pool of the ticket; zero for cashable tickets.
    pub pool_id: PoolId,
    /// When the ticket was printed (EGM local time).
    pub occurred_at: NaiveDateTime,
    /// Whether the host has already acknowledged the validation record.
    pub host_acknowledged: bool,
}

/// A handpay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandpayTransaction {
    /// History log identifier.
    pub id: TransactionId,
    /// Cause of the handpay.
    pub handpay_kind: HandpayKind,
    /// Cashable component.
    pub cashable: Millicents,
    /// Restricted promotional component.
    pub promo: Millicents,
    /// Non-cash (non-restricted promotional) component.
    pub non_cash: Millicents,
    /// Whether a handpay receipt was printed.
    pub receipt_printed: bool,
    /// Receipt sequence number; meaningful only when a receipt was printed.
    pub receipt_sequence: u16,
    /// Receipt expiration in days; meaningful only when a receipt was printed.
    pub expiration_days: u16,
    /// Receipt barcode, if one was generated.
    pub barcode: Option<String>,
    /// When the handpay was keyed off (EGM local time).
    pub occurred_at: NaiveDateTime,
    /// Whether the host has already acknowledged the validation record.
    pub host_acknowledged: bool,
}

impl HandpayTransaction {
    /// Sum of all handpay components.
    pub fn total(&self) -> Millicents {
        self.cashable
            .saturating_add(self.promo)
            .saturating_add(self.non_cash)
    }
}

/// A completed transaction of either class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transaction {
    /// Ticket printed at cash-out.
    VoucherOut(VoucherOutTransaction),
    /// Handpay.
    Handpay(HandpayTransaction),
}

impl Transaction {
    /// History log identifier.
    pub fn id(&self) -> TransactionId {
        match self {
            Self::VoucherOut(v) => v.id,
            Self::Handpay(h) => h.id,
        }
    }

    /// Pending-report slot of this transaction.
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::VoucherOut(_) => TransactionKind::VoucherOut,
            Self::Handpay(_) => TransactionKind::Handpay,
        }
    }

    /// When the transaction completed.
    pub fn occurred_at(&self) -> NaiveDateTime {
        match self {
            Self::VoucherOut(v) => v.occurred_at,
            Self::Handpay(h) => h.occurred_at,
        }
    }

    /// Whether the host has acknowledged this transaction's validation record.
    pub fn host_acknowledged(&self) -> bool {
        match self {
            Self::VoucherOut(v) => v.host_acknowledged,
            Self::Handpay(h) => h.host_acknowledged,
        }
    }

    /// Mark the validation record acknowledged.
    pub fn acknowledge(&mut self) {
        match self {
            Self::VoucherOut(v) => v.host_acknowledged = true,
            Self::Handpay(h) => h.host_acknowledged = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap()
    }

    #[test]
    fn test_handpay_total_sums_components() {
        let h = HandpayTransaction {
            id: TransactionId(7),
            handpay_kind: HandpayKind::GameWin,
            cashable: Millicents(1_000_000),
            promo: Millicents(20_000),
            non_cash: Millicents(3_000),
            receipt_printed: false,
            receipt_sequence: 0,
            expiration_days: 0,
            barcode: None,
            occurred_at: at(),
            host_acknowledged: false,
        };
        assert_eq!(h.total(), Millicents(1_023_000));
    }

    #[test]
    fn test_transaction_serde_is_tagged() {
        let t = Transaction::VoucherOut(VoucherOutTransaction {
            id: TransactionId(1),
            amount: Millicents(5_000),
            kind: VoucherKind::Cashable,
            barcode: Some("036429188185446104".into()),
            ticket_number: 12,
            expiration: Expiration::Days(30),
            pool_id: PoolId(0),
            occurred_at: at(),
            host_acknowledged: false,
        });
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "voucher_out");
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_acknowledge_sets_flag() {
        let mut t = Transaction::Handpay(HandpayTransaction {
            id: TransactionId(3),
            handpay_kind: HandpayKind::CancelledCredit,
            cashable: Millicents(1),
            promo: Millicents::ZERO,
            non_cash: Millicents::ZERO,
            receipt_printed: true,
            receipt_sequence: 4,
            expiration_days: 30,
            barcode: None,
            occurred_at: at(),
            host_acknowledged: false,
        });
        t.acknowledge();
        assert!(t.host_acknowledged());
        assert_eq!(t.kind(), TransactionKind::Handpay);
    }
}

//! # External Collaborators
//!
//! Narrow read/write interfaces to the subsystems this engine consumes but
//! does not own: transaction history, configuration, device status, and bank
//! balances. Each trait has a small in-memory implementation used by tests
//! and by the command-line harness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::amount::Cents;
use crate::config::FeatureFlags;
use crate::identity::TransactionId;
use crate::scheme::ValidationScheme;
use crate::transaction::{Transaction, TransactionKind};

// ─── Traits ──────────────────────────────────────────────────────────

/// Completed-transaction log owned by the accounting subsystem.
pub trait TransactionHistory: Send + Sync {
    /// All voucher-out and handpay transactions, ordered by transaction id.
    fn recall(&self) -> Vec<Transaction>;

    /// Record that the host acknowledged a transaction's validation record.
    fn acknowledge(&self, kind: TransactionKind, id: TransactionId);
}

/// Read-only feature configuration.
pub trait ConfigurationProvider: Send + Sync {
    /// The validation scheme in force.
    fn validation_scheme(&self) -> ValidationScheme;

    /// Feature-support flags.
    fn features(&self) -> FeatureFlags;

    /// EGM asset number reported on long poll 0x7B.
    fn asset_number(&self) -> u32;

    /// Expiration in days printed on handpay receipts.
    fn handpay_expiration_days(&self) -> u16;

    /// Cashable ticket expiration used until the host sets one.
    fn cashable_expiration_days(&self) -> u16;

    /// Restricted ticket expiration used until the host sets one.
    fn default_restricted_expiration_days(&self) -> u16;
}

/// Printer and note-acceptor status.
pub trait DeviceStatus: Send + Sync {
    /// Whether the ticket printer is able to print.
    fn printer_can_print(&self) -> bool;

    /// Whether the note acceptor is enabled.
    fn note_acceptor_enabled(&self) -> bool;
}

/// Credit meter account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    /// Cashable credits.
    Cashable,
    /// Restricted promotional credits.
    Restricted,
    /// Non-restricted promotional credits.
    NonRestricted,
}

/// Bank balance queries.
pub trait BankBalance: Send + Sync {
    /// Current balance of one credit account.
    fn query_balance(&self, account: AccountType) -> Cents;
}

// ─── In-memory implementations ───────────────────────────────────────

/// Transaction history held in memory.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    transactions: RwLock<Vec<Transaction>>,
}

impl InMemoryHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed transaction.
    pub fn record(&self, transaction: Transaction) {
        let mut guard = self.transactions.write();
        guard.push(transaction);
        guard.sort_by_key(Transaction::id);
    }

    /// Look up a transaction by id.
    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions.read().iter().find(|t| t.id() == id).cloned()
    }
}

impl TransactionHistory for InMemoryHistory {
    fn recall(&self) -> Vec<Transaction> {
        self.transactions.read().clone()
    }

    fn acknowledge(&self, kind: TransactionKind, id: TransactionId) {
        let mut guard = self.transactions.write();
        if let Some(t) = guard.iter_mut().find(|t| t.id() == id && t.kind() == kind) {
            t.acknowledge();
        }
    }
}

/// Device status flags that tests and the harness can flip.
#[derive(Debug)]
pub struct StaticDeviceStatus {
    printer: AtomicBool,
    note_acceptor: AtomicBool,
}

impl StaticDeviceStatus {
    /// Create a status with both devices in the given state.
    pub fn new(printer_can_print: bool, note_acceptor_enabled: bool) -> Self {
        Self {
            printer: AtomicBool::new(printer_can_print),
            note_acceptor: AtomicBool::new(note_acceptor_enabled),
        }
    }

    /// Set whether the printer can print.
    pub fn set_printer(&self, can_print: bool) {
        self.printer.store(can_print, Ordering::SeqCst);
    }

    /// Set whether the note acceptor is enabled.
    pub fn set_note_acceptor(&self, enabled: bool) {
        self.note_acceptor.store(enabled, Ordering::SeqCst);
    }
}

impl Default for StaticDeviceStatus {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl DeviceStatus for StaticDeviceStatus {
    fn printer_can_print(&self) -> bool {
        self.printer.load(Ordering::SeqCst)
    }

    fn note_acceptor_enabled(&self) -> bool {
        self.note_acceptor.load(Ordering::SeqCst)
    }
}

/// Bank balances held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    balances: RwLock<HashMap<AccountType, Cents>>,
}

impl InMemoryBank {
    /// Create a bank with every balance at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the balance of one account.
    pub fn set_balance(&self, account: AccountType, amount: Cents) {
        self.balances.write().insert(account, amount);
    }
}

impl BankBalance for InMemoryBank {
    fn query_balance(&self, account: AccountType) -> Cents {
        self.balances
            .read()
            .get(&account)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Millicents;
    use crate::transaction::{HandpayKind, HandpayTransaction};
    use chrono::NaiveDate;

    fn handpay(id: u64) -> Transaction {
        Transaction::Handpay(HandpayTransaction {
            id: TransactionId(id),
            handpay_kind: HandpayKind::GameWin,
            cashable: Millicents(1_000),
            promo: Millicents::ZERO,
            non_cash: Millicents::ZERO,
            receipt_printed: false,
            receipt_sequence: 0,
            expiration_days: 0,
            barcode: None,
            occurred_at: NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            host_acknowledged: false,
        })
    }

    #[test]
    fn test_history_recall_is_ordered_by_id() {
        let history = InMemoryHistory::new();
        history.record(handpay(9));
        history.record(handpay(2));
        let ids: Vec<_> = history.recall().iter().map(Transaction::id).collect();
        assert_eq!(ids, vec![TransactionId(2), TransactionId(9)]);
    }

    #[test]
    fn test_history_acknowledge_matches_kind() {
        let history = InMemoryHistory::new();
        history.record(handpay(1));
        history.acknowledge(TransactionKind::VoucherOut, TransactionId(1));
        assert!(!history.get(TransactionId(1)).unwrap().host_acknowledged());
        history.acknowledge(TransactionKind::Handpay, TransactionId(1));
        assert!(history.get(TransactionId(1)).unwrap().host_acknowledged());
    }

    #[test]
    fn test_bank_defaults_to_zero() {
        let bank = InMemoryBank::new();
        assert_eq!(bank.query_balance(AccountType::Restricted), Cents::ZERO);
        bank.set_balance(AccountType::Restricted, Cents(500));
        assert_eq!(bank.query_balance(AccountType::Restricted), Cents(500));
    }

    #[test]
    fn test_device_status_toggles() {
        let status = StaticDeviceStatus::default();
        assert!(status.printer_can_print());
        status.set_printer(false);
        assert!(!status.printer_can_print());
    }
}

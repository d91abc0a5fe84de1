//! # Validation Record Selector
//!
//! Turns completed voucher-out and handpay transactions into the validation
//! records the host reads with long poll 0x4D.
//!
//! ## Slots
//!
//! Each transaction class has one slot holding its oldest unacknowledged
//! record. Reading a slot never changes it: two reads with nothing in
//! between return identical responses. A slot is cleared only through the
//! [`ImpliedAck`] attached to a `Current` read, once the host's next poll
//! implicitly confirms it. The slot is then refilled with the next
//! unacknowledged transaction of the class, if the history holds one.
//!
//! ## Degraded Responses
//!
//! A record whose barcode is missing, too short, or not all digits is still
//! reported with its amount, type, and index, but with a zero validation
//! number and system ID.

use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sas_core::{
    Cents, ConfigurationProvider, Expiration, HandpayKind, PoolId, TicketKind, Transaction,
    TransactionHistory, TransactionId, TransactionKind, ValidationData, ValidationNumber,
    ValidationScheme, ValidationSystemId, VoucherKind,
};

/// Ticket number reported for a handpay without a receipt.
pub const NO_RECEIPT_TICKET_NUMBER: u16 = 0xFFFF;

// ─── Wire Enums ──────────────────────────────────────────────────────

/// Function code of long poll 0x4D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCode {
    /// Oldest unacknowledged record; the read may be acknowledged.
    Current,
    /// Upper bound lookup.
    Max,
    /// Peek without acknowledgment.
    LookAhead,
}

impl FunctionCode {
    /// Decode a wire function code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Current),
            0x1F => Some(Self::Max),
            0xFF => Some(Self::LookAhead),
            _ => None,
        }
    }

    /// Wire value.
    pub fn code(self) -> u8 {
        match self {
            Self::Current => 0x00,
            Self::Max => 0x1F,
            Self::LookAhead => 0xFF,
        }
    }
}

/// Validation type of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationType {
    /// Cash-out or non-restricted promotional ticket.
    CashableTicket,
    /// Restricted promotional ticket.
    RestrictedPromoTicket,
    /// Cancelled-credit handpay with a receipt printed.
    CancelledCreditHandpayReceipt,
    /// Jackpot handpay with a receipt printed.
    JackpotHandpayReceipt,
    /// Cancelled-credit handpay without a receipt.
    CancelledCreditHandpayNoReceipt,
    /// Jackpot handpay without a receipt.
    JackpotHandpayNoReceipt,
}

impl ValidationType {
    /// Wire value.
    pub fn code(self) -> u8 {
        match self {
            Self::CashableTicket => 0x00,
            Self::RestrictedPromoTicket => 0x01,
            Self::CancelledCreditHandpayReceipt => 0x10,
            Self::JackpotHandpayReceipt => 0x20,
            Self::CancelledCreditHandpayNoReceipt => 0x40,
            Self::JackpotHandpayNoReceipt => 0x60,
        }
    }

    fn for_handpay(kind: HandpayKind, receipt_printed: bool) -> Self {
        match (kind.is_jackpot(), receipt_printed) {
            (false, true) => Self::CancelledCreditHandpayReceipt,
            (true, true) => Self::JackpotHandpayReceipt,
            (false, false) => Self::CancelledCreditHandpayNoReceipt,
            (true, false) => Self::JackpotHandpayNoReceipt,
        }
    }
}

// ─── Records ─────────────────────────────────────────────────────────

/// A completed transaction awaiting its validation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingValidationRecord {
    /// History log identifier.
    pub transaction_id: TransactionId,
    /// Slot the record occupies.
    pub kind: TransactionKind,
    /// Ticket kind.
    pub ticket_kind: TicketKind,
    /// Wire validation type.
    pub validation_type: ValidationType,
    /// Amount in cents.
    pub amount: Cents,
    /// Ticket or receipt number.
    pub ticket_number: u16,
    /// Printed expiration.
    pub expiration: Expiration,
    /// Restricted pool.
    pub pool_id: PoolId,
    /// Printed barcode.
    pub barcode: Option<String>,
    /// Completion time.
    pub occurred_at: NaiveDateTime,
}

impl PendingValidationRecord {
    /// Build the record for a completed transaction.
    ///
    /// `handpay_expiration_days` applies to printed handpay receipts that
    /// carry no expiration of their own.
    pub fn from_transaction(transaction: &Transaction, handpay_expiration_days: u16) -> Self {
        match transaction {
            Transaction::VoucherOut(v) => Self {
                transaction_id: v.id,
                kind: TransactionKind::VoucherOut,
                ticket_kind: v.kind.into(),
                validation_type: match v.kind {
                    VoucherKind::RestrictedPromo => ValidationType::RestrictedPromoTicket,
                    VoucherKind::Cashable | VoucherKind::NonRestrictedPromo => {
                        ValidationType::CashableTicket
                    }
                },
                amount: v.amount.to_cents(),
                ticket_number: v.ticket_number,
                expiration: v.expiration,
                pool_id: v.pool_id,
                barcode: v.barcode.clone(),
                occurred_at: v.occurred_at,
            },
            Transaction::Handpay(h) => {
                let (ticket_kind, ticket_number, expiration) = if h.receipt_printed {
                    let days = if h.expiration_days == 0 {
                        handpay_expiration_days
                    } else {
                        h.expiration_days
                    };
                    (
                        TicketKind::HandpayReceiptPrinted,
                        h.receipt_sequence,
                        Expiration::Days(days),
                    )
                } else {
                    (
                        TicketKind::HandpayNoReceipt,
                        NO_RECEIPT_TICKET_NUMBER,
                        Expiration::Default,
                    )
                };
                Self {
                    transaction_id: h.id,
                    kind: TransactionKind::Handpay,
                    ticket_kind,
                    validation_type: ValidationType::for_handpay(
                        h.handpay_kind,
                        h.receipt_printed,
                    ),
                    amount: h.total().to_cents(),
                    ticket_number,
                    expiration,
                    pool_id: PoolId::default(),
                    barcode: h.barcode.clone(),
                    occurred_at: h.occurred_at,
                }
            }
        }
    }
}

/// A validation record as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResponse {
    /// Whether a record was found.
    pub successful: bool,
    /// Validation type; `None` on failure.
    pub validation_type: Option<ValidationType>,
    /// Position of the record; zero on failure.
    pub index: u8,
    /// Completion time; reported only under Secure Enhanced validation.
    pub occurred_at: Option<NaiveDateTime>,
    /// Validation number derived from the barcode.
    pub validation_number: ValidationNumber,
    /// Validation system ID derived from the barcode.
    pub system_id: ValidationSystemId,
    /// Amount in cents.
    pub amount: Cents,
    /// Ticket or receipt number.
    pub ticket_number: u16,
    /// Printed expiration.
    pub expiration: Expiration,
    /// Restricted pool.
    pub pool_id: PoolId,
    /// Transaction reported.
    pub transaction_id: Option<TransactionId>,
}

impl ValidationResponse {
    /// The response reported when nothing is pending.
    pub fn failed() -> Self {
        Self {
            successful: false,
            validation_type: None,
            index: 0,
            occurred_at: None,
            validation_number: ValidationNumber::default(),
            system_id: ValidationSystemId::default(),
            amount: Cents::ZERO,
            ticket_number: 0,
            expiration: Expiration::Default,
            pool_id: PoolId::default(),
            transaction_id: None,
        }
    }

    fn for_record(record: &PendingValidationRecord, secure_enhanced: bool) -> Self {
        let (validation_number, system_id, occurred_at) = if secure_enhanced {
            match ValidationData::from_barcode(record.barcode.as_deref()) {
                Ok(data) => (data.number, data.system_id, Some(record.occurred_at)),
                Err(e) => {
                    tracing::debug!(
                        transaction_id = %record.transaction_id,
                        error = %e,
                        "reporting record without validation number"
                    );
                    (
                        ValidationNumber::default(),
                        ValidationSystemId::default(),
                        Some(record.occurred_at),
                    )
                }
            }
        } else {
            (
                ValidationNumber::default(),
                ValidationSystemId::default(),
                None,
            )
        };
        Self {
            successful: true,
            validation_type: Some(record.validation_type),
            index: 1,
            occurred_at,
            validation_number,
            system_id,
            amount: record.amount,
            ticket_number: record.ticket_number,
            expiration: record.expiration,
            pool_id: record.pool_id,
            transaction_id: Some(record.transaction_id),
        }
    }
}

// ─── Slots ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Slot {
    record: PendingValidationRecord,
    exception_pending: bool,
}

#[derive(Debug, Default)]
struct Slots {
    voucher_out: Option<Slot>,
    handpay: Option<Slot>,
}

impl Slots {
    fn get(&self, kind: TransactionKind) -> Option<&Slot> {
        match kind {
            TransactionKind::VoucherOut => self.voucher_out.as_ref(),
            TransactionKind::Handpay => self.handpay.as_ref(),
        }
    }

    fn get_mut(&mut self, kind: TransactionKind) -> &mut Option<Slot> {
        match kind {
            TransactionKind::VoucherOut => &mut self.voucher_out,
            TransactionKind::Handpay => &mut self.handpay,
        }
    }
}

/// Oldest transaction of `kind` the host has not acknowledged.
fn oldest_unacknowledged(
    history: &dyn TransactionHistory,
    kind: TransactionKind,
) -> Option<Transaction> {
    history
        .recall()
        .into_iter()
        .filter(|t| t.kind() == kind && !t.host_acknowledged())
        .min_by_key(Transaction::id)
}

// ─── Implied Acknowledgment ──────────────────────────────────────────

/// Hooks fired by the framing layer once the host's next poll implicitly
/// confirms or rejects a `Current` read.
///
/// Both methods consume the hook, so at most one of them runs.
#[must_use = "a Current read must be acknowledged or rejected"]
pub struct ImpliedAck {
    slots: Arc<Mutex<Slots>>,
    history: Arc<dyn TransactionHistory>,
    handpay_expiration_days: u16,
    kind: TransactionKind,
    transaction_id: TransactionId,
}

impl std::fmt::Debug for ImpliedAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpliedAck")
            .field("kind", &self.kind)
            .field("transaction_id", &self.transaction_id)
            .finish()
    }
}

impl ImpliedAck {
    /// Transaction the hook refers to.
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// The host confirmed the record: acknowledge it and move the slot on.
    pub fn ack(self) {
        self.history.acknowledge(self.kind, self.transaction_id);
        let next = oldest_unacknowledged(self.history.as_ref(), self.kind)
            .map(|t| PendingValidationRecord::from_transaction(&t, self.handpay_expiration_days));
        let mut slots = self.slots.lock();
        let slot = slots.get_mut(self.kind);
        if slot
            .as_ref()
            .is_some_and(|s| s.record.transaction_id == self.transaction_id)
        {
            tracing::debug!(
                kind = %self.kind,
                transaction_id = %self.transaction_id,
                "validation record acknowledged"
            );
            *slot = next.map(|record| Slot {
                record,
                exception_pending: true,
            });
        }
    }

    /// The host rejected the read: keep the record, clear its exception.
    pub fn nack(self) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(self.kind) {
            if slot.record.transaction_id == self.transaction_id {
                tracing::debug!(
                    kind = %self.kind,
                    transaction_id = %self.transaction_id,
                    "validation record read rejected"
                );
                slot.exception_pending = false;
            }
        }
    }
}

/// Result of a selector read.
#[derive(Debug)]
pub struct Selection {
    /// Response for the host.
    pub response: ValidationResponse,
    /// Acknowledgment hooks; present only on a successful `Current` read.
    pub implied: Option<ImpliedAck>,
}

// ─── Selector ────────────────────────────────────────────────────────

/// Selector over the pending validation records.
pub struct ValidationRecordSelector {
    slots: Arc<Mutex<Slots>>,
    history: Arc<dyn TransactionHistory>,
    config: Arc<dyn ConfigurationProvider>,
}

impl std::fmt::Debug for ValidationRecordSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRecordSelector")
            .field("slots", &*self.slots.lock())
            .finish()
    }
}

impl ValidationRecordSelector {
    /// Create a selector with empty slots.
    pub fn new(
        history: Arc<dyn TransactionHistory>,
        config: Arc<dyn ConfigurationProvider>,
    ) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots::default())),
            history,
            config,
        }
    }

    /// Rebuild both slots from the history after a power cycle.
    ///
    /// Returns the number of slots filled.
    pub fn restore(&self) -> usize {
        let days = self.config.handpay_expiration_days();
        let mut restored = 0;
        let mut slots = self.slots.lock();
        for kind in [TransactionKind::VoucherOut, TransactionKind::Handpay] {
            let slot = oldest_unacknowledged(self.history.as_ref(), kind).map(|t| Slot {
                record: PendingValidationRecord::from_transaction(&t, days),
                exception_pending: true,
            });
            restored += usize::from(slot.is_some());
            *slots.get_mut(kind) = slot;
        }
        tracing::debug!(restored, "validation records restored");
        restored
    }

    /// A transaction completed; queue its validation record.
    ///
    /// A record already waiting in the slot stays ahead of it.
    pub fn record_completed(&self, transaction: &Transaction) {
        if transaction.host_acknowledged() {
            return;
        }
        let kind = transaction.kind();
        let mut slots = self.slots.lock();
        let slot = slots.get_mut(kind);
        if let Some(existing) = slot.as_ref() {
            tracing::debug!(
                kind = %kind,
                transaction_id = %transaction.id(),
                waiting = %existing.record.transaction_id,
                "validation record queued behind pending record"
            );
            return;
        }
        *slot = Some(Slot {
            record: PendingValidationRecord::from_transaction(
                transaction,
                self.config.handpay_expiration_days(),
            ),
            exception_pending: true,
        });
    }

    /// Record waiting in a slot.
    pub fn pending(&self, kind: TransactionKind) -> Option<PendingValidationRecord> {
        self.slots.lock().get(kind).map(|s| s.record.clone())
    }

    /// Whether the record in a slot still has its exception outstanding.
    pub fn exception_pending(&self, kind: TransactionKind) -> bool {
        self.slots
            .lock()
            .get(kind)
            .is_some_and(|s| s.exception_pending)
    }

    /// Class of the oldest pending record across both slots.
    pub fn oldest_pending_kind(&self) -> Option<TransactionKind> {
        let slots = self.slots.lock();
        [TransactionKind::VoucherOut, TransactionKind::Handpay]
            .into_iter()
            .filter_map(|kind| slots.get(kind).map(|s| (s.record.transaction_id, kind)))
            .min_by_key(|(id, _)| *id)
            .map(|(_, kind)| kind)
    }

    /// Read the validation record of one slot.
    pub fn select(&self, function_code: FunctionCode, kind: TransactionKind) -> Selection {
        let secure_enhanced = self.config.validation_scheme() == ValidationScheme::SecureEnhanced;
        let slots = self.slots.lock();
        let Some(slot) = slots.get(kind) else {
            return Selection {
                response: ValidationResponse::failed(),
                implied: None,
            };
        };
        let response = ValidationResponse::for_record(&slot.record, secure_enhanced);
        let implied = (function_code == FunctionCode::Current).then(|| ImpliedAck {
            slots: Arc::clone(&self.slots),
            history: Arc::clone(&self.history),
            handpay_expiration_days: self.config.handpay_expiration_days(),
            kind,
            transaction_id: slot.record.transaction_id,
        });
        Selection { response, implied }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sas_core::{
        HandpayTransaction, InMemoryHistory, Millicents, StaticConfiguration, ValidationConfig,
        VoucherOutTransaction,
    };

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap()
    }

    fn voucher(id: u64, barcode: Option<&str>) -> Transaction {
        Transaction::VoucherOut(VoucherOutTransaction {
            id: TransactionId(id),
            amount: Millicents(1_000_000),
            kind: VoucherKind::Cashable,
            barcode: barcode.map(str::to_string),
            ticket_number: 42,
            expiration: Expiration::Days(30),
            pool_id: PoolId(0),
            occurred_at: at(),
            host_acknowledged: false,
        })
    }

    fn game_win(id: u64) -> Transaction {
        Transaction::Handpay(HandpayTransaction {
            id: TransactionId(id),
            handpay_kind: HandpayKind::GameWin,
            cashable: Millicents(1_000_000),
            promo: Millicents(250_000),
            non_cash: Millicents(5_000),
            receipt_printed: false,
            receipt_sequence: 0,
            expiration_days: 0,
            barcode: None,
            occurred_at: at(),
            host_acknowledged: false,
        })
    }

    fn selector(
        scheme: ValidationScheme,
        transactions: Vec<Transaction>,
    ) -> (Arc<InMemoryHistory>, ValidationRecordSelector) {
        let history = Arc::new(InMemoryHistory::new());
        for t in transactions {
            history.record(t);
        }
        let config = Arc::new(StaticConfiguration::new(ValidationConfig {
            validation_scheme: scheme,
            ..ValidationConfig::default()
        }));
        let selector = ValidationRecordSelector::new(history.clone(), config);
        selector.restore();
        (history, selector)
    }

    #[test]
    fn test_voucher_barcode_scenario() {
        let (_, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![voucher(1, Some("036429188185446104"))],
        );
        let selection = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        let response = selection.response;
        assert!(response.successful);
        assert_eq!(response.amount, Cents(1_000));
        assert_eq!(response.validation_number.get(), 6_429_188_185_446_104);
        assert_eq!(response.system_id.get(), 3);
        assert_eq!(response.validation_type, Some(ValidationType::CashableTicket));
        assert_eq!(response.ticket_number, 42);
        assert_eq!(response.occurred_at, Some(at()));
        assert!(selection.implied.is_some());
    }

    #[test]
    fn test_handpay_without_receipt() {
        let (_, selector) = selector(ValidationScheme::SecureEnhanced, vec![game_win(2)]);
        let response = selector
            .select(FunctionCode::Current, TransactionKind::Handpay)
            .response;
        assert_eq!(response.ticket_number, NO_RECEIPT_TICKET_NUMBER);
        assert_eq!(response.expiration, Expiration::Default);
        assert_eq!(response.expiration.to_wire(), 0);
        assert_eq!(response.amount, Cents(1_255));
        assert_eq!(
            response.validation_type,
            Some(ValidationType::JackpotHandpayNoReceipt)
        );
    }

    #[test]
    fn test_handpay_receipt_uses_configured_expiration() {
        let Transaction::Handpay(mut h) = game_win(3) else {
            unreachable!()
        };
        h.handpay_kind = HandpayKind::CancelledCredit;
        h.receipt_printed = true;
        h.receipt_sequence = 77;
        let record = PendingValidationRecord::from_transaction(&Transaction::Handpay(h), 90);
        assert_eq!(record.ticket_number, 77);
        assert_eq!(record.expiration, Expiration::Days(90));
        assert_eq!(record.ticket_kind, TicketKind::HandpayReceiptPrinted);
        assert_eq!(
            record.validation_type,
            ValidationType::CancelledCreditHandpayReceipt
        );
    }

    #[test]
    fn test_degraded_barcodes_zero_validation_fields() {
        for barcode in [Some("12"), None, Some("03642918818544610X")] {
            let (_, selector) =
                selector(ValidationScheme::SecureEnhanced, vec![voucher(1, barcode)]);
            let response = selector
                .select(FunctionCode::Current, TransactionKind::VoucherOut)
                .response;
            assert!(response.successful);
            assert_eq!(response.validation_number.get(), 0);
            assert_eq!(response.system_id.get(), 0);
            assert_eq!(response.amount, Cents(1_000));
            assert_eq!(response.index, 1);
        }
    }

    #[test]
    fn test_read_is_idempotent() {
        let (_, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![voucher(1, Some("036429188185446104"))],
        );
        let first = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        let second = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        assert_eq!(first.response, second.response);
    }

    #[test]
    fn test_max_and_look_ahead_match_current_without_hooks() {
        let (_, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![voucher(1, Some("036429188185446104"))],
        );
        let current = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        for code in [FunctionCode::Max, FunctionCode::LookAhead] {
            let other = selector.select(code, TransactionKind::VoucherOut);
            assert_eq!(other.response, current.response);
            assert!(other.implied.is_none());
        }
    }

    #[test]
    fn test_empty_slot_is_failed_response() {
        let (_, selector) = selector(ValidationScheme::SecureEnhanced, vec![]);
        let selection = selector.select(FunctionCode::Current, TransactionKind::Handpay);
        assert_eq!(selection.response, ValidationResponse::failed());
        assert!(selection.implied.is_none());
    }

    #[test]
    fn test_ack_clears_slot_and_history() {
        let (history, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![voucher(1, Some("036429188185446104"))],
        );
        let selection = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        selection.implied.unwrap().ack();
        assert!(selector.pending(TransactionKind::VoucherOut).is_none());
        assert!(history.get(TransactionId(1)).unwrap().host_acknowledged());
        let next = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        assert!(!next.response.successful);
    }

    #[test]
    fn test_ack_advances_to_next_record() {
        let (_, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![
                voucher(1, Some("036429188185446104")),
                voucher(4, Some("010000000000000001")),
            ],
        );
        let first = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        assert_eq!(first.response.transaction_id, Some(TransactionId(1)));
        first.implied.unwrap().ack();
        let second = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        assert_eq!(second.response.transaction_id, Some(TransactionId(4)));
    }

    #[test]
    fn test_nack_keeps_record_and_clears_exception() {
        let (history, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![voucher(1, Some("036429188185446104"))],
        );
        assert!(selector.exception_pending(TransactionKind::VoucherOut));
        let selection = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        selection.implied.unwrap().nack();
        assert!(!selector.exception_pending(TransactionKind::VoucherOut));
        assert!(selector.pending(TransactionKind::VoucherOut).is_some());
        assert!(!history.get(TransactionId(1)).unwrap().host_acknowledged());
    }

    #[test]
    fn test_stale_ack_leaves_new_record() {
        let (history, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![voucher(1, Some("036429188185446104"))],
        );
        let stale = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        let fresh = selector.select(FunctionCode::Current, TransactionKind::VoucherOut);
        fresh.implied.unwrap().ack();
        history.record(voucher(5, None));
        selector.record_completed(&voucher(5, None));
        stale.implied.unwrap().ack();
        assert_eq!(
            selector
                .pending(TransactionKind::VoucherOut)
                .map(|r| r.transaction_id),
            Some(TransactionId(5))
        );
    }

    #[test]
    fn test_validation_fields_only_under_secure_enhanced() {
        let (_, selector) = selector(
            ValidationScheme::System,
            vec![voucher(1, Some("036429188185446104"))],
        );
        let response = selector
            .select(FunctionCode::Current, TransactionKind::VoucherOut)
            .response;
        assert_eq!(response.validation_number.get(), 0);
        assert_eq!(response.system_id.get(), 0);
        assert_eq!(response.occurred_at, None);
        assert_eq!(response.amount, Cents(1_000));
    }

    #[test]
    fn test_oldest_pending_kind() {
        let (_, selector) = selector(
            ValidationScheme::SecureEnhanced,
            vec![game_win(2), voucher(3, None)],
        );
        assert_eq!(
            selector.oldest_pending_kind(),
            Some(TransactionKind::Handpay)
        );
    }

    #[test]
    fn test_acknowledged_transactions_are_not_restored() {
        let mut acked = voucher(1, None);
        acked.acknowledge();
        let (_, selector) = selector(ValidationScheme::SecureEnhanced, vec![acked.clone()]);
        assert!(selector.pending(TransactionKind::VoucherOut).is_none());
        selector.record_completed(&acked);
        assert!(selector.pending(TransactionKind::VoucherOut).is_none());
    }
}

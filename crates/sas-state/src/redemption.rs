//! # Voucher Redemption
//!
//! Ticket-in handshake between the note acceptor, the host and the credit
//! meters.
//!
//! ## States
//!
//! ```text
//! Idle ──present_ticket()──▶ ValidationRequestPending ──redeem(accept)──▶ RequestPending
//!  ▲                                   │                                       │
//!  │                          redeem(reject) / time_out()                      │
//!  ├───────────────────────────────────┘                                       │
//!  └─────────────────────────────redemption_completed()────────────────────────┘
//! ```
//!
//! `present_ticket` hands the note acceptor flow a single-resolution
//! receiver. The host's redeem command (long poll 0x71), arriving on a
//! different call, resolves it exactly once: with the credited amount on
//! acceptance, or with zero on any rejection. Rejections skip
//! `RequestPending` and return straight to `Idle`.
//!
//! A [`TransferCode::RequestForCurrentTicketStatus`] query never creates or
//! resolves anything. It reports where the current ticket stands.
//!
//! Redemption is disabled unless both the configured feature flag and the
//! ticket-redemption host-control bit in force allow it. The host compares
//! tickets by their eighteen validation data digits, not by the raw barcode.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use sas_core::barcode::{validation_digits, PARSING_CODE_BCD18};
use sas_core::{
    AccountType, BankBalance, Cents, ConfigurationProvider, Expiration, HostControlBits, PoolId,
};

use crate::error::RedemptionError;
use crate::policy::TicketingPolicyCoordinator;

// ─── Wire Codes ──────────────────────────────────────────────────────

/// Host instruction carried by the redeem command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferCode {
    /// Valid cashable ticket.
    ValidCashableTicket,
    /// Valid restricted promotional ticket.
    ValidRestrictedPromotionalTicket,
    /// Valid non-restricted promotional ticket.
    ValidNonRestrictedPromotionalTicket,
    /// Host could not validate the ticket.
    UnableToValidate,
    /// Validation number is not valid.
    NotAValidValidationNumber,
    /// Validation number is not in the host system.
    ValidationNumberNotInSystem,
    /// Ticket is marked pending in the host system.
    TicketMarkedPendingInSystem,
    /// Ticket was already redeemed.
    TicketAlreadyRedeemed,
    /// Ticket has expired.
    TicketExpired,
    /// Host has no validation information for the ticket.
    ValidationInformationNotAvailable,
    /// Ticket amount does not match the host record.
    TicketAmountDoesNotMatchSystem,
    /// Ticket amount exceeds the auto-redemption limit.
    TicketAmountExceedsAutoRedemptionLimit,
    /// Status query.
    RequestForCurrentTicketStatus,
}

impl TransferCode {
    /// Decode a wire transfer code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Self::ValidCashableTicket,
            0x01 => Self::ValidRestrictedPromotionalTicket,
            0x02 => Self::ValidNonRestrictedPromotionalTicket,
            0x80 => Self::UnableToValidate,
            0x81 => Self::NotAValidValidationNumber,
            0x82 => Self::ValidationNumberNotInSystem,
            0x83 => Self::TicketMarkedPendingInSystem,
            0x84 => Self::TicketAlreadyRedeemed,
            0x85 => Self::TicketExpired,
            0x86 => Self::ValidationInformationNotAvailable,
            0x87 => Self::TicketAmountDoesNotMatchSystem,
            0x88 => Self::TicketAmountExceedsAutoRedemptionLimit,
            0xFF => Self::RequestForCurrentTicketStatus,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn code(self) -> u8 {
        match self {
            Self::ValidCashableTicket => 0x00,
            Self::ValidRestrictedPromotionalTicket => 0x01,
            Self::ValidNonRestrictedPromotionalTicket => 0x02,
            Self::UnableToValidate => 0x80,
            Self::NotAValidValidationNumber => 0x81,
            Self::ValidationNumberNotInSystem => 0x82,
            Self::TicketMarkedPendingInSystem => 0x83,
            Self::TicketAlreadyRedeemed => 0x84,
            Self::TicketExpired => 0x85,
            Self::ValidationInformationNotAvailable => 0x86,
            Self::TicketAmountDoesNotMatchSystem => 0x87,
            Self::TicketAmountExceedsAutoRedemptionLimit => 0x88,
            Self::RequestForCurrentTicketStatus => 0xFF,
        }
    }

    /// Whether the host accepts the ticket.
    pub fn is_accept(self) -> bool {
        matches!(
            self,
            Self::ValidCashableTicket
                | Self::ValidRestrictedPromotionalTicket
                | Self::ValidNonRestrictedPromotionalTicket
        )
    }

    /// Whether this is the restricted promotional acceptance.
    pub fn is_restricted(self) -> bool {
        self == Self::ValidRestrictedPromotionalTicket
    }

    /// Machine status reported once an accepted ticket is credited.
    fn redeemed_status(self) -> Option<TicketStatus> {
        match self {
            Self::ValidCashableTicket => Some(TicketStatus::CashableTicketRedeemed),
            Self::ValidRestrictedPromotionalTicket => {
                Some(TicketStatus::RestrictedPromotionalTicketRedeemed)
            }
            Self::ValidNonRestrictedPromotionalTicket => {
                Some(TicketStatus::NonRestrictedPromotionalTicketRedeemed)
            }
            _ => None,
        }
    }
}

/// Machine status reported in the redeem response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Cashable ticket redeemed.
    CashableTicketRedeemed,
    /// Restricted promotional ticket redeemed.
    RestrictedPromotionalTicketRedeemed,
    /// Non-restricted promotional ticket redeemed.
    NonRestrictedPromotionalTicketRedeemed,
    /// Ticket inserted, waiting for the redeem command.
    WaitingForLongPoll71,
    /// Redemption accepted, credits being applied.
    TicketRedemptionPending,
    /// Rejected by the host, or unknown.
    TicketRejectedByHost,
    /// Validation data does not match the inserted ticket.
    ValidationNumberDoesNotMatch,
    /// Transfer code is not usable here.
    NotAValidTransferFunction,
    /// Transfer amount is not usable.
    NotAValidTransferAmount,
    /// The machine cannot accept the transfer now.
    GamingMachineUnableToAcceptTransfer,
    /// The host did not answer in time.
    TicketRejectedDueToTimeout,
    /// Ticket redemption is disabled.
    TicketRedemptionDisabled,
    /// No ticket information is available.
    NoValidationInfoAvailable,
}

impl TicketStatus {
    /// Wire value.
    pub fn code(self) -> u8 {
        match self {
            Self::CashableTicketRedeemed => 0x00,
            Self::RestrictedPromotionalTicketRedeemed => 0x01,
            Self::NonRestrictedPromotionalTicketRedeemed => 0x02,
            Self::WaitingForLongPoll71 => 0x20,
            Self::TicketRedemptionPending => 0x40,
            Self::TicketRejectedByHost => 0x80,
            Self::ValidationNumberDoesNotMatch => 0x81,
            Self::NotAValidTransferFunction => 0x82,
            Self::NotAValidTransferAmount => 0x83,
            Self::GamingMachineUnableToAcceptTransfer => 0x87,
            Self::TicketRejectedDueToTimeout => 0x88,
            Self::TicketRedemptionDisabled => 0x8A,
            Self::NoValidationInfoAvailable => 0xFF,
        }
    }

    /// Metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CashableTicketRedeemed => "cashable_redeemed",
            Self::RestrictedPromotionalTicketRedeemed => "restricted_redeemed",
            Self::NonRestrictedPromotionalTicketRedeemed => "non_restricted_redeemed",
            Self::WaitingForLongPoll71 => "waiting",
            Self::TicketRedemptionPending => "pending",
            Self::TicketRejectedByHost => "rejected_by_host",
            Self::ValidationNumberDoesNotMatch => "validation_mismatch",
            Self::NotAValidTransferFunction => "invalid_transfer_function",
            Self::NotAValidTransferAmount => "invalid_transfer_amount",
            Self::GamingMachineUnableToAcceptTransfer => "unable_to_accept",
            Self::TicketRejectedDueToTimeout => "timed_out",
            Self::TicketRedemptionDisabled => "disabled",
            Self::NoValidationInfoAvailable => "no_validation_info",
        }
    }

    /// Whether the ticket was credited.
    pub fn is_redeemed(self) -> bool {
        self.code() <= 0x02
    }
}

// ─── Requests and Outcomes ───────────────────────────────────────────

/// Redeem command from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemRequest {
    /// Host instruction.
    pub transfer_code: TransferCode,
    /// Amount to credit.
    pub amount: Cents,
    /// Validation data digits of the ticket being redeemed.
    pub barcode: String,
    /// Restricted pool; zero unless restricted.
    pub pool_id: PoolId,
    /// Restricted expiration; default unless restricted.
    pub expiration: Expiration,
}

/// Redeem response for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemResponse {
    /// Machine status.
    pub status: TicketStatus,
    /// Amount being or already credited.
    pub amount: Cents,
    /// Barcode of the ticket the status refers to.
    pub barcode: Option<String>,
}

/// Final result delivered to the ticket-insertion flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionOutcome {
    /// Barcode of the inserted ticket.
    pub barcode: String,
    /// Amount to credit; zero on rejection.
    pub amount: Cents,
    /// Status explaining the outcome.
    pub status: TicketStatus,
}

/// Validation data requested by the host (long poll 0x70).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Barcode of the inserted ticket.
    pub barcode: String,
    /// Parsing code of the validation data.
    pub parsing_code: u8,
}

// ─── State ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
enum RedemptionState {
    #[default]
    Idle,
    Finished(RedeemResponse),
    ValidationRequestPending {
        barcode: String,
        responder: oneshot::Sender<RedemptionOutcome>,
    },
    RequestPending {
        barcode: String,
        amount: Cents,
        status: TicketStatus,
    },
}

impl RedemptionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle | Self::Finished(_) => "IDLE",
            Self::ValidationRequestPending { .. } => "VALIDATION_REQUEST_PENDING",
            Self::RequestPending { .. } => "REQUEST_PENDING",
        }
    }

    /// Answer to a status query.
    fn status(&self) -> RedeemResponse {
        match self {
            Self::Idle => RedeemResponse {
                status: TicketStatus::NoValidationInfoAvailable,
                amount: Cents::ZERO,
                barcode: None,
            },
            Self::Finished(last) => last.clone(),
            Self::ValidationRequestPending { barcode, .. } => RedeemResponse {
                status: TicketStatus::WaitingForLongPoll71,
                amount: Cents::ZERO,
                barcode: Some(barcode.clone()),
            },
            Self::RequestPending {
                barcode, amount, ..
            } => RedeemResponse {
                status: TicketStatus::TicketRedemptionPending,
                amount: *amount,
                barcode: Some(barcode.clone()),
            },
        }
    }
}

/// Resolve the waiting ticket flow and return to idle.
fn finish(
    barcode: String,
    responder: oneshot::Sender<RedemptionOutcome>,
    amount: Cents,
    status: TicketStatus,
) -> (RedemptionState, RedeemResponse) {
    let response = RedeemResponse {
        status,
        amount,
        barcode: Some(barcode.clone()),
    };
    if responder
        .send(RedemptionOutcome {
            barcode,
            amount,
            status,
        })
        .is_err()
    {
        tracing::debug!(status = status.as_str(), "ticket flow no longer waiting");
    }
    metrics::counter!("sas_ticket_redemptions_total", "status" => status.as_str()).increment(1);
    (RedemptionState::Finished(response.clone()), response)
}

// ─── Machine ─────────────────────────────────────────────────────────

/// The ticket-in redemption handshake.
pub struct VoucherRedemptionMachine {
    state: Mutex<RedemptionState>,
    policy: Arc<TicketingPolicyCoordinator>,
    bank: Arc<dyn BankBalance>,
    config: Arc<dyn ConfigurationProvider>,
}

impl std::fmt::Debug for VoucherRedemptionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoucherRedemptionMachine")
            .field("state", &self.state_name())
            .finish()
    }
}

impl VoucherRedemptionMachine {
    /// Create an idle machine.
    pub fn new(
        policy: Arc<TicketingPolicyCoordinator>,
        bank: Arc<dyn BankBalance>,
        config: Arc<dyn ConfigurationProvider>,
    ) -> Self {
        Self {
            state: Mutex::new(RedemptionState::Idle),
            policy,
            bank,
            config,
        }
    }

    /// Name of the current state.
    pub fn state_name(&self) -> &'static str {
        self.state.lock().name()
    }

    /// A ticket was inserted. The receiver resolves exactly once.
    pub fn present_ticket(
        &self,
        barcode: impl Into<String>,
    ) -> Result<oneshot::Receiver<RedemptionOutcome>, RedemptionError> {
        let barcode = barcode.into();
        let mut state = self.state.lock();
        if !matches!(*state, RedemptionState::Idle | RedemptionState::Finished(_)) {
            return Err(RedemptionError::Busy);
        }
        tracing::debug!(barcode = %barcode, "ticket presented");
        let (responder, rx) = oneshot::channel();
        *state = RedemptionState::ValidationRequestPending { barcode, responder };
        Ok(rx)
    }

    /// Long poll 0x70: validation data of the inserted ticket.
    pub fn request_validation_data(&self) -> Option<ValidationRequest> {
        match &*self.state.lock() {
            RedemptionState::ValidationRequestPending { barcode, .. } => Some(ValidationRequest {
                barcode: barcode.clone(),
                parsing_code: PARSING_CODE_BCD18,
            }),
            _ => None,
        }
    }

    /// Long poll 0x71: apply the host's redeem command.
    ///
    /// `bits_in_force` are the host-control bits currently negotiated.
    pub fn redeem(&self, request: RedeemRequest, bits_in_force: HostControlBits) -> RedeemResponse {
        let mut guard = self.state.lock();
        if request.transfer_code == TransferCode::RequestForCurrentTicketStatus {
            return guard.status();
        }

        let (barcode, responder) = match std::mem::take(&mut *guard) {
            RedemptionState::ValidationRequestPending { barcode, responder } => {
                (barcode, responder)
            }
            other => {
                let response = match &other {
                    RedemptionState::RequestPending { .. } => other.status(),
                    _ => RedemptionState::Idle.status(),
                };
                *guard = other;
                tracing::warn!(
                    transfer_code = request.transfer_code.code(),
                    state = guard.name(),
                    "redeem without a ticket awaiting validation"
                );
                return response;
            }
        };

        if !self.config.features().ticket_redemption
            || !bits_in_force.contains(HostControlBits::TICKET_REDEMPTION)
        {
            tracing::warn!(barcode = %barcode, bits = %bits_in_force, "ticket redemption disabled");
            let (next, response) = finish(
                barcode,
                responder,
                Cents::ZERO,
                TicketStatus::TicketRedemptionDisabled,
            );
            *guard = next;
            return response;
        }

        let presented = validation_digits(&barcode);
        if presented.is_none() || presented != validation_digits(&request.barcode) {
            tracing::warn!(
                barcode = %barcode,
                host_barcode = %request.barcode,
                "validation data does not match inserted ticket"
            );
            *guard = RedemptionState::ValidationRequestPending {
                barcode: barcode.clone(),
                responder,
            };
            return RedeemResponse {
                status: TicketStatus::ValidationNumberDoesNotMatch,
                amount: Cents::ZERO,
                barcode: Some(barcode),
            };
        }

        let (next, response) = match self.classify(&request) {
            Ok(status) => {
                let response = RedeemResponse {
                    status: TicketStatus::TicketRedemptionPending,
                    amount: request.amount,
                    barcode: Some(barcode.clone()),
                };
                tracing::info!(
                    barcode = %barcode,
                    amount = %request.amount,
                    status = status.as_str(),
                    "ticket accepted"
                );
                if responder
                    .send(RedemptionOutcome {
                        barcode: barcode.clone(),
                        amount: request.amount,
                        status,
                    })
                    .is_err()
                {
                    tracing::debug!(barcode = %barcode, "ticket flow no longer waiting");
                }
                (
                    RedemptionState::RequestPending {
                        barcode,
                        amount: request.amount,
                        status,
                    },
                    response,
                )
            }
            Err(status) => {
                tracing::warn!(
                    barcode = %barcode,
                    transfer_code = request.transfer_code.code(),
                    status = status.as_str(),
                    "ticket rejected"
                );
                finish(barcode, responder, Cents::ZERO, status)
            }
        };
        *guard = next;
        response
    }

    /// Decide the final status of a redeem command for the inserted ticket.
    fn classify(&self, request: &RedeemRequest) -> Result<TicketStatus, TicketStatus> {
        let Some(status) = request.transfer_code.redeemed_status() else {
            return Err(TicketStatus::TicketRejectedByHost);
        };
        if request.amount.is_zero() {
            return Err(TicketStatus::NotAValidTransferAmount);
        }
        if request.transfer_code.is_restricted() {
            if !self.config.features().restricted_tickets {
                return Err(TicketStatus::NotAValidTransferFunction);
            }
            let balance = self.bank.query_balance(AccountType::Restricted);
            let resolution = self
                .policy
                .resolve_pool_and_expiration(request.pool_id, request.expiration, balance)
                .map_err(|_| TicketStatus::GamingMachineUnableToAcceptTransfer)?;
            // Persistence failures are logged by the policy writer.
            drop(resolution.receipt);
        }
        Ok(status)
    }

    /// Credits for an accepted ticket have been applied (or failed to be).
    ///
    /// Returns `false` when no redemption was pending.
    pub fn redemption_completed(&self, success: bool) -> bool {
        let mut guard = self.state.lock();
        let RedemptionState::RequestPending {
            barcode,
            amount,
            status,
        } = std::mem::take(&mut *guard)
        else {
            return false;
        };
        let final_status = if success {
            status
        } else {
            TicketStatus::GamingMachineUnableToAcceptTransfer
        };
        metrics::counter!("sas_ticket_redemptions_total", "status" => final_status.as_str())
            .increment(1);
        tracing::debug!(
            barcode = %barcode,
            status = final_status.as_str(),
            "redemption completed"
        );
        *guard = RedemptionState::Finished(RedeemResponse {
            status: final_status,
            amount: if success { amount } else { Cents::ZERO },
            barcode: Some(barcode),
        });
        true
    }

    /// The host did not answer in time: reject the inserted ticket.
    ///
    /// Returns `false` when no ticket was waiting.
    pub fn time_out(&self) -> bool {
        let mut guard = self.state.lock();
        match std::mem::take(&mut *guard) {
            RedemptionState::ValidationRequestPending { barcode, responder } => {
                tracing::warn!(barcode = %barcode, "ticket redemption timed out");
                let (next, _) = finish(
                    barcode,
                    responder,
                    Cents::ZERO,
                    TicketStatus::TicketRejectedDueToTimeout,
                );
                *guard = next;
                true
            }
            other => {
                *guard = other;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::{FeatureFlags, InMemoryBank, StaticConfiguration, ValidationConfig};
    use sas_store::MemoryStore;

    const BARCODE: &str = "036429188185446104";
    const ENABLED: HostControlBits = HostControlBits::ALL;

    struct Fixture {
        config: Arc<StaticConfiguration>,
        bank: Arc<InMemoryBank>,
        policy: Arc<TicketingPolicyCoordinator>,
        machine: VoucherRedemptionMachine,
    }

    fn fixture() -> Fixture {
        let config = Arc::new(StaticConfiguration::new(ValidationConfig::default()));
        let bank = Arc::new(InMemoryBank::new());
        let policy = Arc::new(
            TicketingPolicyCoordinator::load(Arc::new(MemoryStore::new()), config.as_ref())
                .unwrap(),
        );
        let machine = VoucherRedemptionMachine::new(policy.clone(), bank.clone(), config.clone());
        Fixture {
            config,
            bank,
            policy,
            machine,
        }
    }

    fn request(code: TransferCode, amount: u64) -> RedeemRequest {
        RedeemRequest {
            transfer_code: code,
            amount: Cents(amount),
            barcode: BARCODE.to_string(),
            pool_id: PoolId(0),
            expiration: Expiration::Default,
        }
    }

    fn restricted(amount: u64, pool: u16, expiration: Expiration) -> RedeemRequest {
        RedeemRequest {
            pool_id: PoolId(pool),
            expiration,
            ..request(TransferCode::ValidRestrictedPromotionalTicket, amount)
        }
    }

    #[test]
    fn test_transfer_code_round_trip() {
        for code in [0x00, 0x01, 0x02, 0x80, 0x84, 0x88, 0xFF] {
            assert_eq!(TransferCode::from_code(code).unwrap().code(), code);
        }
        assert!(TransferCode::from_code(0x03).is_none());
        assert!(TransferCode::from_code(0x89).is_none());
    }

    #[tokio::test]
    async fn test_cashable_ticket_redeemed() {
        let f = fixture();
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let validation = f.machine.request_validation_data().unwrap();
        assert_eq!(validation.barcode, BARCODE);
        assert_eq!(validation.parsing_code, PARSING_CODE_BCD18);

        let response = f
            .machine
            .redeem(request(TransferCode::ValidCashableTicket, 1_000), ENABLED);
        assert_eq!(response.status, TicketStatus::TicketRedemptionPending);
        assert_eq!(response.amount, Cents(1_000));
        assert_eq!(f.machine.state_name(), "REQUEST_PENDING");

        let outcome = rx.await.unwrap();
        assert_eq!(outcome.amount, Cents(1_000));
        assert_eq!(outcome.status, TicketStatus::CashableTicketRedeemed);

        assert!(f.machine.redemption_completed(true));
        let query = f
            .machine
            .redeem(request(TransferCode::RequestForCurrentTicketStatus, 0), ENABLED);
        assert_eq!(query.status, TicketStatus::CashableTicketRedeemed);
        assert_eq!(query.amount, Cents(1_000));
    }

    #[tokio::test]
    async fn test_host_rejection_resolves_with_zero() {
        let f = fixture();
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f
            .machine
            .redeem(request(TransferCode::TicketAlreadyRedeemed, 1_000), ENABLED);
        assert_eq!(response.status, TicketStatus::TicketRejectedByHost);
        assert_eq!(f.machine.state_name(), "IDLE");
        let outcome = rx.await.unwrap();
        assert_eq!(outcome.amount, Cents::ZERO);
        assert_eq!(outcome.status, TicketStatus::TicketRejectedByHost);
    }

    #[tokio::test]
    async fn test_disabled_redemption_short_circuits() {
        let f = fixture();
        f.config.set_features(FeatureFlags {
            ticket_redemption: false,
            ..FeatureFlags::default()
        });
        // A pool conflict would be reported if the policy were consulted.
        f.bank.set_balance(AccountType::Restricted, Cents(500));
        let before = f.policy.current();
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f
            .machine
            .redeem(request(TransferCode::ValidCashableTicket, 1_000), ENABLED);
        assert_eq!(response.status, TicketStatus::TicketRedemptionDisabled);
        let outcome = rx.await.unwrap();
        assert_eq!(outcome.amount, Cents::ZERO);
        assert_eq!(outcome.status, TicketStatus::TicketRedemptionDisabled);
        assert_eq!(f.policy.current(), before);
    }

    #[tokio::test]
    async fn test_status_query_has_no_effect() {
        let f = fixture();
        let idle = f
            .machine
            .redeem(request(TransferCode::RequestForCurrentTicketStatus, 0), ENABLED);
        assert_eq!(idle.status, TicketStatus::NoValidationInfoAvailable);

        let mut rx = f.machine.present_ticket(BARCODE).unwrap();
        let waiting = f
            .machine
            .redeem(request(TransferCode::RequestForCurrentTicketStatus, 0), ENABLED);
        assert_eq!(waiting.status, TicketStatus::WaitingForLongPoll71);
        assert_eq!(f.machine.state_name(), "VALIDATION_REQUEST_PENDING");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_ticket_is_busy() {
        let f = fixture();
        let _rx = f.machine.present_ticket(BARCODE).unwrap();
        assert_eq!(
            f.machine.present_ticket(BARCODE).unwrap_err(),
            RedemptionError::Busy
        );
    }

    #[tokio::test]
    async fn test_redeem_without_ticket() {
        let f = fixture();
        let response = f
            .machine
            .redeem(request(TransferCode::ValidCashableTicket, 1_000), ENABLED);
        assert_eq!(response.status, TicketStatus::NoValidationInfoAvailable);
    }

    #[tokio::test]
    async fn test_mismatched_validation_data_keeps_ticket_waiting() {
        let f = fixture();
        let mut rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f.machine.redeem(
            RedeemRequest {
                barcode: "000000000000000001".into(),
                ..request(TransferCode::ValidCashableTicket, 1_000)
            },
            ENABLED,
        );
        assert_eq!(response.status, TicketStatus::ValidationNumberDoesNotMatch);
        assert_eq!(f.machine.state_name(), "VALIDATION_REQUEST_PENDING");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_short_barcode_matches_padded_validation_data() {
        let f = fixture();
        let rx = f.machine.present_ticket("1234567890").unwrap();
        let response = f.machine.redeem(
            RedeemRequest {
                barcode: "000000001234567890".into(),
                ..request(TransferCode::ValidCashableTicket, 1_000)
            },
            ENABLED,
        );
        assert_eq!(response.status, TicketStatus::TicketRedemptionPending);
        let outcome = rx.await.unwrap();
        assert_eq!(outcome.barcode, "1234567890");
        assert_eq!(outcome.amount, Cents(1_000));
    }

    #[tokio::test]
    async fn test_long_barcode_matches_leading_digits() {
        let f = fixture();
        let rx = f.machine.present_ticket("0364291881854461049").unwrap();
        let response = f
            .machine
            .redeem(request(TransferCode::ValidCashableTicket, 1_000), ENABLED);
        assert_eq!(response.status, TicketStatus::TicketRedemptionPending);
        assert_eq!(rx.await.unwrap().amount, Cents(1_000));
    }

    #[tokio::test]
    async fn test_cleared_redemption_bit_disables_redemption() {
        let f = fixture();
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f.machine.redeem(
            request(TransferCode::ValidCashableTicket, 1_000),
            HostControlBits::ALL.without(HostControlBits::TICKET_REDEMPTION),
        );
        assert_eq!(response.status, TicketStatus::TicketRedemptionDisabled);
        assert_eq!(f.machine.state_name(), "IDLE");
        let outcome = rx.await.unwrap();
        assert_eq!(outcome.status, TicketStatus::TicketRedemptionDisabled);
        assert_eq!(outcome.amount, Cents::ZERO);
    }

    #[tokio::test]
    async fn test_zero_amount_is_invalid() {
        let f = fixture();
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f.machine.redeem(request(TransferCode::ValidCashableTicket, 0), ENABLED);
        assert_eq!(response.status, TicketStatus::NotAValidTransferAmount);
        assert_eq!(rx.await.unwrap().amount, Cents::ZERO);
    }

    #[tokio::test]
    async fn test_restricted_pool_conflict_refused() {
        let f = fixture();
        f.policy
            .resolve_pool_and_expiration(PoolId(4), Expiration::Days(30), Cents::ZERO)
            .unwrap();
        f.bank.set_balance(AccountType::Restricted, Cents(500));
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f.machine.redeem(restricted(1_000, 5, Expiration::Days(30)), ENABLED);
        assert_eq!(
            response.status,
            TicketStatus::GamingMachineUnableToAcceptTransfer
        );
        assert_eq!(rx.await.unwrap().amount, Cents::ZERO);
    }

    #[tokio::test]
    async fn test_restricted_ticket_updates_pool() {
        let f = fixture();
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f.machine.redeem(restricted(2_000, 7, Expiration::Days(14)), ENABLED);
        assert_eq!(response.status, TicketStatus::TicketRedemptionPending);
        let outcome = rx.await.unwrap();
        assert_eq!(
            outcome.status,
            TicketStatus::RestrictedPromotionalTicketRedeemed
        );
        let policy = f.policy.current();
        assert_eq!(policy.pool_id, PoolId(7));
        assert_eq!(policy.restricted_combined_expiration, Expiration::Days(14));
    }

    #[tokio::test]
    async fn test_restricted_ticket_unsupported() {
        let f = fixture();
        f.config.set_features(FeatureFlags {
            restricted_tickets: false,
            ..FeatureFlags::default()
        });
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        let response = f.machine.redeem(restricted(2_000, 7, Expiration::Default), ENABLED);
        assert_eq!(response.status, TicketStatus::NotAValidTransferFunction);
        assert_eq!(rx.await.unwrap().amount, Cents::ZERO);
    }

    #[tokio::test]
    async fn test_time_out_rejects_ticket() {
        let f = fixture();
        let rx = f.machine.present_ticket(BARCODE).unwrap();
        assert!(f.machine.time_out());
        let outcome = rx.await.unwrap();
        assert_eq!(outcome.status, TicketStatus::TicketRejectedDueToTimeout);
        assert!(!f.machine.time_out());
    }

    #[tokio::test]
    async fn test_failed_credit_reported_by_status_query() {
        let f = fixture();
        let _rx = f.machine.present_ticket(BARCODE).unwrap();
        f.machine
            .redeem(request(TransferCode::ValidCashableTicket, 1_000), ENABLED);
        assert!(f.machine.redemption_completed(false));
        let query = f
            .machine
            .redeem(request(TransferCode::RequestForCurrentTicketStatus, 0), ENABLED);
        assert_eq!(
            query.status,
            TicketStatus::GamingMachineUnableToAcceptTransfer
        );
        assert!(!f.machine.redemption_completed(true));
    }
}

//! # Host Validation Handshake
//!
//! Under System validation the host, not the EGM, supplies the validation
//! number printed on a cash-out ticket. The EGM announces the pending
//! cash-out (long poll 0x57) and waits for the host to send a number or a
//! denial (long poll 0x58).
//!
//! ## States
//!
//! ```text
//! NoValidationPending ──begin_cashout()──▶ CashoutInformationPending
//!        ▲                                      │            │
//!        │                                 deny (id 0)    approve
//!        │                                      │            │
//!        ├──────────────────────────────────────┘            ▼
//!        └──cashout_completed() / deny──────────── ValidationNumberPending
//! ```
//!
//! `abandon()` returns to `NoValidationPending` from any state, resolving an
//! outstanding verdict as [`HostValidationVerdict::TimedOut`].
//!
//! Outside System validation the handshake does not apply: 0x57 reports
//! "not waiting" and 0x58 is acknowledged without effect.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use sas_core::{
    Cents, ConfigurationProvider, ValidationNumber, ValidationScheme, ValidationSystemId,
};

use crate::error::HostValidationError;

// ─── Data ────────────────────────────────────────────────────────────

/// Credit type of a pending cash-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashoutType {
    /// Cashable credits.
    Cashable,
    /// Restricted promotional credits.
    Restricted,
}

/// Cash-out awaiting a host validation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostValidationData {
    /// Cash-out amount.
    pub amount: Cents,
    /// Credit type being cashed out.
    pub ticket_type: CashoutType,
}

/// Answer to a pending-cashout query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCashout {
    /// A cash-out is waiting for the host.
    Waiting(HostValidationData),
    /// Nothing is waiting.
    NotWaiting,
}

/// Result of a host validation-number submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitStatus {
    /// Accepted (or ignored because the handshake does not apply).
    Acknowledged,
    /// No cash-out is in progress.
    NotInCashout,
    /// A number was supplied while one is already being printed.
    ImproperValidationRejected,
}

/// Outcome delivered to the cash-out flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostValidationVerdict {
    /// The host supplied a validation number.
    Approved {
        /// Validation system ID to print.
        system_id: ValidationSystemId,
        /// Validation number to print.
        number: ValidationNumber,
    },
    /// The host denied the cash-out.
    Denied,
    /// The cash-out was abandoned before the host answered.
    TimedOut,
}

// ─── State ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
enum HostValidationState {
    #[default]
    NoValidationPending,
    CashoutInformationPending {
        data: HostValidationData,
        responder: oneshot::Sender<HostValidationVerdict>,
    },
    ValidationNumberPending {
        data: HostValidationData,
    },
}

impl HostValidationState {
    fn name(&self) -> &'static str {
        match self {
            Self::NoValidationPending => "NO_VALIDATION_PENDING",
            Self::CashoutInformationPending { .. } => "CASHOUT_INFORMATION_PENDING",
            Self::ValidationNumberPending { .. } => "VALIDATION_NUMBER_PENDING",
        }
    }
}

fn resolve(responder: oneshot::Sender<HostValidationVerdict>, verdict: HostValidationVerdict) {
    if responder.send(verdict).is_err() {
        tracing::debug!(?verdict, "cash-out flow no longer waiting for verdict");
    }
}

fn on_submit(
    state: HostValidationState,
    system_id: ValidationSystemId,
    number: ValidationNumber,
    reject: bool,
) -> (HostValidationState, SubmitStatus) {
    match state {
        HostValidationState::NoValidationPending => (state, SubmitStatus::NotInCashout),
        HostValidationState::CashoutInformationPending { data, responder } => {
            if reject {
                resolve(responder, HostValidationVerdict::Denied);
                (
                    HostValidationState::NoValidationPending,
                    SubmitStatus::Acknowledged,
                )
            } else {
                resolve(responder, HostValidationVerdict::Approved { system_id, number });
                (
                    HostValidationState::ValidationNumberPending { data },
                    SubmitStatus::Acknowledged,
                )
            }
        }
        HostValidationState::ValidationNumberPending { .. } if reject => (
            HostValidationState::NoValidationPending,
            SubmitStatus::Acknowledged,
        ),
        HostValidationState::ValidationNumberPending { .. } => {
            (state, SubmitStatus::ImproperValidationRejected)
        }
    }
}

// ─── Machine ─────────────────────────────────────────────────────────

/// The System validation cash-out handshake.
pub struct HostValidationMachine {
    state: Mutex<HostValidationState>,
    config: Arc<dyn ConfigurationProvider>,
}

impl std::fmt::Debug for HostValidationMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostValidationMachine")
            .field("state", &self.state_name())
            .finish()
    }
}

impl HostValidationMachine {
    /// Create an idle machine.
    pub fn new(config: Arc<dyn ConfigurationProvider>) -> Self {
        Self {
            state: Mutex::new(HostValidationState::NoValidationPending),
            config,
        }
    }

    /// Name of the current state.
    pub fn state_name(&self) -> &'static str {
        self.state.lock().name()
    }

    fn applies(&self) -> bool {
        self.config.validation_scheme() == ValidationScheme::System
    }

    /// Announce a cash-out that needs a host validation number.
    ///
    /// The returned receiver resolves once the host answers or the cash-out
    /// is abandoned.
    pub fn begin_cashout(
        &self,
        data: HostValidationData,
    ) -> Result<oneshot::Receiver<HostValidationVerdict>, HostValidationError> {
        let scheme = self.config.validation_scheme();
        if scheme != ValidationScheme::System {
            return Err(HostValidationError::NotSystemValidation(scheme));
        }
        let mut state = self.state.lock();
        if !matches!(*state, HostValidationState::NoValidationPending) {
            return Err(HostValidationError::CashoutInProgress);
        }
        let (responder, rx) = oneshot::channel();
        *state = HostValidationState::CashoutInformationPending { data, responder };
        tracing::debug!(
            amount = %data.amount,
            ticket_type = ?data.ticket_type,
            "cash-out awaiting host validation"
        );
        Ok(rx)
    }

    /// Long poll 0x57: report the cash-out awaiting a validation number.
    pub fn request_pending_cashout(&self) -> PendingCashout {
        if !self.applies() {
            return PendingCashout::NotWaiting;
        }
        match &*self.state.lock() {
            HostValidationState::CashoutInformationPending { data, .. } => {
                PendingCashout::Waiting(*data)
            }
            _ => PendingCashout::NotWaiting,
        }
    }

    /// Long poll 0x58: accept a validation number or a denial from the host.
    pub fn submit_validation(
        &self,
        system_id: ValidationSystemId,
        number: ValidationNumber,
        reject: bool,
    ) -> SubmitStatus {
        if !self.applies() {
            tracing::debug!("validation number ignored outside System validation");
            return SubmitStatus::Acknowledged;
        }
        let mut guard = self.state.lock();
        let before = guard.name();
        let (next, status) = on_submit(std::mem::take(&mut *guard), system_id, number, reject);
        *guard = next;
        if status == SubmitStatus::Acknowledged {
            tracing::debug!(from = before, to = guard.name(), reject, "host validation submitted");
        } else {
            tracing::warn!(state = before, ?status, "host validation submission refused");
        }
        status
    }

    /// The approved ticket has printed.
    ///
    /// Returns the cash-out that completed, or `None` when no validation
    /// number was pending.
    pub fn cashout_completed(&self) -> Option<HostValidationData> {
        let mut guard = self.state.lock();
        match std::mem::take(&mut *guard) {
            HostValidationState::ValidationNumberPending { data } => {
                tracing::debug!(
                    amount = %data.amount,
                    ticket_type = ?data.ticket_type,
                    "host-validated cash-out printed"
                );
                Some(data)
            }
            other => {
                *guard = other;
                None
            }
        }
    }

    /// Abandon any cash-out in progress.
    pub fn abandon(&self) {
        let mut guard = self.state.lock();
        if let HostValidationState::CashoutInformationPending { responder, .. } =
            std::mem::take(&mut *guard)
        {
            tracing::warn!("cash-out abandoned before host validation");
            resolve(responder, HostValidationVerdict::TimedOut);
        }
    }
}

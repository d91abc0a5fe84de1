//! # Validation Engine
//!
//! Assembles the registries, state machines and selectors over one set of
//! collaborators and routes long polls to their handlers.
//!
//! ## Scheme gating
//!
//! | Long poll | Answered under               |
//! |-----------|------------------------------|
//! | 0x4C      | Secure Enhanced              |
//! | 0x4D      | Secure Enhanced              |
//! | 0x57/0x58 | all (System-only semantics)  |
//! | 0x70/0x71 | all                          |
//! | 0x7B      | all                          |
//!
//! A suppressed poll dispatches to `Ok(None)`: the framing layer sends no
//! response.

use std::sync::Arc;

use sas_core::{
    BankBalance, ConfigurationProvider, DeviceStatus, Transaction, TransactionHistory,
    ValidationScheme,
};
use sas_state::{
    HostValidationMachine, IssuedSequence, SequenceRegistry, TicketingPolicyCoordinator,
    VoucherRedemptionMachine,
};
use sas_store::{PersistentStore, StorageError};

use crate::error::EngineError;
use crate::long_poll::{
    enhanced_validation, pending_cashout, receive_validation_number, redeem_ticket,
    set_validation_id, ticket_validation_data, validation_status, LongPollCode, LongPollResponse,
};
use crate::scheme::ValidationSchemeSelector;
use crate::selector::ValidationRecordSelector;

// ─── Builder ─────────────────────────────────────────────────────────

/// Collects the engine's collaborators.
#[derive(Default)]
pub struct ValidationEngineBuilder {
    store: Option<Arc<dyn PersistentStore>>,
    configuration: Option<Arc<dyn ConfigurationProvider>>,
    device_status: Option<Arc<dyn DeviceStatus>>,
    bank: Option<Arc<dyn BankBalance>>,
    transaction_history: Option<Arc<dyn TransactionHistory>>,
}

impl ValidationEngineBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persistent store for the registration, policy and control bits.
    pub fn store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Read-only feature configuration.
    pub fn configuration(mut self, configuration: Arc<dyn ConfigurationProvider>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Printer and note acceptor status.
    pub fn device_status(mut self, device_status: Arc<dyn DeviceStatus>) -> Self {
        self.device_status = Some(device_status);
        self
    }

    /// Credit meter balances.
    pub fn bank(mut self, bank: Arc<dyn BankBalance>) -> Self {
        self.bank = Some(bank);
        self
    }

    /// Completed transaction history.
    pub fn transaction_history(mut self, history: Arc<dyn TransactionHistory>) -> Self {
        self.transaction_history = Some(history);
        self
    }

    /// Load persisted state, start the writers and restore pending
    /// validation records.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self) -> Result<ValidationEngine, EngineError> {
        let store = self
            .store
            .ok_or(EngineError::MissingCollaborator("store"))?;
        let config = self
            .configuration
            .ok_or(EngineError::MissingCollaborator("configuration"))?;
        let device = self
            .device_status
            .ok_or(EngineError::MissingCollaborator("device_status"))?;
        let bank = self
            .bank
            .ok_or(EngineError::MissingCollaborator("bank"))?;
        let history = self
            .transaction_history
            .ok_or(EngineError::MissingCollaborator("transaction_history"))?;

        let sequence = SequenceRegistry::load(Arc::clone(&store))?;
        let policy = Arc::new(TicketingPolicyCoordinator::load(
            Arc::clone(&store),
            config.as_ref(),
        )?);
        let scheme = ValidationSchemeSelector::load(store, Arc::clone(&config), device)?;
        let engine = ValidationEngine {
            host_validation: HostValidationMachine::new(Arc::clone(&config)),
            redemption: VoucherRedemptionMachine::new(
                Arc::clone(&policy),
                bank,
                Arc::clone(&config),
            ),
            selector: ValidationRecordSelector::new(history, Arc::clone(&config)),
            sequence,
            policy,
            scheme,
            config,
        };
        let restored = engine.selector.restore();
        tracing::info!(
            scheme = %engine.config.validation_scheme(),
            bits = %engine.scheme.current(),
            restored,
            "validation engine ready"
        );
        Ok(engine)
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

/// Ticket and handpay validation engine for one EGM.
pub struct ValidationEngine {
    config: Arc<dyn ConfigurationProvider>,
    sequence: SequenceRegistry,
    policy: Arc<TicketingPolicyCoordinator>,
    scheme: ValidationSchemeSelector,
    selector: ValidationRecordSelector,
    host_validation: HostValidationMachine,
    redemption: VoucherRedemptionMachine,
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("scheme", &self.config.validation_scheme())
            .field("sequence", &self.sequence)
            .field("host_validation", &self.host_validation.state_name())
            .field("redemption", &self.redemption.state_name())
            .finish()
    }
}

impl ValidationEngine {
    /// Start assembling an engine.
    pub fn builder() -> ValidationEngineBuilder {
        ValidationEngineBuilder::new()
    }

    /// Secure Enhanced registration.
    pub fn sequence(&self) -> &SequenceRegistry {
        &self.sequence
    }

    /// Ticketing policy.
    pub fn policy(&self) -> &TicketingPolicyCoordinator {
        &self.policy
    }

    /// Host-control bits in force.
    pub fn scheme(&self) -> &ValidationSchemeSelector {
        &self.scheme
    }

    /// Pending validation records.
    pub fn selector(&self) -> &ValidationRecordSelector {
        &self.selector
    }

    /// System validation cash-out handshake.
    pub fn host_validation(&self) -> &HostValidationMachine {
        &self.host_validation
    }

    /// Ticket-in redemption.
    pub fn redemption(&self) -> &VoucherRedemptionMachine {
        &self.redemption
    }

    /// A ticket or handpay completed; queue its validation record.
    pub fn transaction_completed(&self, transaction: &Transaction) {
        self.selector.record_completed(transaction);
    }

    /// Consume the next Secure Enhanced sequence number for a new
    /// validation.
    pub fn next_validation_sequence(&self) -> Option<IssuedSequence> {
        self.sequence.advance()
    }

    /// Full validation reconfiguration: drop the registration, re-derive
    /// the control bits from configuration and rebuild the pending records.
    pub fn reset_validation(&self) {
        drop(self.sequence.reset());
        drop(self.scheme.reset().receipt);
        self.host_validation.abandon();
        self.selector.restore();
        tracing::info!(scheme = %self.config.validation_scheme(), "validation reset");
    }

    /// Wait until every write queued so far has been applied.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let sequence = self.sequence.flush();
        let policy = self.policy.flush();
        let features = self.scheme.flush();
        sequence.wait().await?;
        policy.wait().await?;
        features.wait().await
    }

    /// Answer one long poll.
    ///
    /// `payload` excludes framing. Returns `Ok(None)` when the poll is not
    /// answered under the active scheme.
    pub fn dispatch(
        &self,
        code: LongPollCode,
        payload: &[u8],
    ) -> Result<Option<LongPollResponse>, EngineError> {
        let result = self.route(code, payload);
        let outcome = match &result {
            Ok(Some(_)) => "answered",
            Ok(None) => "suppressed",
            Err(_) => "error",
        };
        metrics::counter!("sas_long_polls_total", "poll" => code.as_str(), "outcome" => outcome)
            .increment(1);
        match &result {
            Ok(_) => tracing::debug!(poll = %code, outcome, "long poll handled"),
            Err(e) => tracing::warn!(poll = %code, error = %e, "long poll failed"),
        }
        result
    }

    fn route(
        &self,
        code: LongPollCode,
        payload: &[u8],
    ) -> Result<Option<LongPollResponse>, EngineError> {
        let scheme = self.config.validation_scheme();
        let response = match code {
            LongPollCode::SetSecureEnhancedValidationId => {
                if scheme != ValidationScheme::SecureEnhanced {
                    return Ok(None);
                }
                let command = set_validation_id::SetValidationIdCommand::decode(payload)?;
                LongPollResponse::plain(set_validation_id::handle(&self.sequence, command).encode()?)
            }
            LongPollCode::SendEnhancedValidationInformation => {
                let command = enhanced_validation::EnhancedValidationCommand::decode(payload)?;
                let Some(selection) = enhanced_validation::handle(&self.selector, scheme, command)
                else {
                    return Ok(None);
                };
                LongPollResponse {
                    payload: enhanced_validation::encode(&selection.response)?,
                    implied: selection.implied,
                }
            }
            LongPollCode::SendPendingCashoutInformation => {
                LongPollResponse::plain(pending_cashout::handle(&self.host_validation).encode()?)
            }
            LongPollCode::ReceiveValidationNumber => {
                let command =
                    receive_validation_number::ReceiveValidationNumberCommand::decode(payload)?;
                LongPollResponse::plain(receive_validation_number::handle(
                    &self.host_validation,
                    command,
                ))
            }
            LongPollCode::SendTicketValidationData => LongPollResponse::plain(
                ticket_validation_data::handle(&self.redemption).encode()?,
            ),
            LongPollCode::RedeemTicket => {
                let command = redeem_ticket::RedeemTicketCommand::decode(payload)?;
                let response =
                    redeem_ticket::handle(&self.redemption, &command, self.scheme.current());
                LongPollResponse::plain(redeem_ticket::encode(&response)?)
            }
            LongPollCode::ExtendedValidationStatus => {
                let command = validation_status::ValidationStatusCommand::decode(payload)?;
                let outcome = validation_status::handle(
                    &self.scheme,
                    &self.policy,
                    self.config.asset_number(),
                    command,
                );
                if outcome.features_changed {
                    self.selector.restore();
                }
                LongPollResponse::plain(outcome.response.encode()?)
            }
        };
        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::{InMemoryBank, InMemoryHistory, StaticConfiguration, StaticDeviceStatus};
    use sas_store::MemoryStore;

    fn complete_builder() -> ValidationEngineBuilder {
        ValidationEngine::builder()
            .store(Arc::new(MemoryStore::new()))
            .configuration(Arc::new(StaticConfiguration::default()))
            .device_status(Arc::new(StaticDeviceStatus::default()))
            .bank(Arc::new(InMemoryBank::new()))
            .transaction_history(Arc::new(InMemoryHistory::new()))
    }

    #[tokio::test]
    async fn test_build_with_all_collaborators() {
        let engine = complete_builder().build().unwrap();
        assert_eq!(engine.host_validation().state_name(), "NO_VALIDATION_PENDING");
        assert!(!engine.sequence().current().configured);
    }

    #[tokio::test]
    async fn test_build_reports_missing_collaborator() {
        let err = ValidationEngine::builder()
            .store(Arc::new(MemoryStore::new()))
            .configuration(Arc::new(StaticConfiguration::default()))
            .device_status(Arc::new(StaticDeviceStatus::default()))
            .transaction_history(Arc::new(InMemoryHistory::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingCollaborator("bank")));
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        assert!(matches!(
            complete_builder().build(),
            Err(EngineError::Storage(sas_store::StorageError::NoRuntime))
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_codec_error() {
        let engine = complete_builder().build().unwrap();
        assert!(matches!(
            engine.dispatch(LongPollCode::SetSecureEnhancedValidationId, &[0x01]),
            Err(EngineError::Codec(_))
        ));
    }

    #[tokio::test]
    async fn test_next_validation_sequence_requires_registration() {
        let engine = complete_builder().build().unwrap();
        assert!(engine.next_validation_sequence().is_none());
        engine
            .dispatch(
                LongPollCode::SetSecureEnhancedValidationId,
                &[0x01, 0x00, 0x00, 0x05, 0x00, 0x00],
            )
            .unwrap();
        let issued = engine.next_validation_sequence().unwrap();
        assert_eq!(issued.sequence_number.get(), 5);
        assert_eq!(engine.sequence().current().sequence_number.get(), 6);
    }

    #[tokio::test]
    async fn test_reset_validation_clears_registration() {
        let engine = complete_builder().build().unwrap();
        engine
            .dispatch(
                LongPollCode::SetSecureEnhancedValidationId,
                &[0x01, 0x00, 0x00, 0x05, 0x00, 0x00],
            )
            .unwrap();
        engine.reset_validation();
        assert!(!engine.sequence().current().configured);
    }
}

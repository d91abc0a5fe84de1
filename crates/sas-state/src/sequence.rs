//! # Secure Enhanced Sequence Registry
//!
//! Owns the machine validation ID and validation sequence number the host
//! assigns with long poll 0x4C, and the sequence the EGM consumes each time
//! it issues a Secure Enhanced validation.
//!
//! ## Update Rules
//!
//! Checked in order:
//!
//! 1. Machine ID zero never sets data. The request is a query.
//! 2. Once configured, a request whose `(machine_id, sequence)` equals the
//!    stored pair is a resend and is ignored, unless the sequence differs
//!    from the last sequence the host sent.
//! 3. Anything else is accepted, applied in memory, and queued for
//!    persistence.
//!
//! The last-received sequence advances on every processed request, so the
//! next duplicate is recognised. Sequence numbers live modulo 2^24: `MAX`
//! followed by `0` is an ordinary forward step.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sas_core::{MachineValidationId, SequenceNumber};
use sas_store::{
    load_record, PersistedRecord, PersistentStore, SaveReceipt, StorageError, WriteQueue,
};

/// Persisted Secure Enhanced registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRegistration {
    /// Host-assigned machine validation ID.
    pub machine_validation_id: MachineValidationId,
    /// Next sequence number to issue.
    pub sequence_number: SequenceNumber,
    /// Sequence number carried by the last processed host request.
    pub last_received_sequence: SequenceNumber,
    /// Whether the host has ever assigned an ID.
    pub configured: bool,
}

impl PersistedRecord for ValidationRegistration {
    const KEY: &'static str = "sas.validation.registration";
}

/// Why an update request changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRejection {
    /// Machine ID zero is a query.
    ZeroMachineId,
    /// The request repeats the stored pair and the last received sequence.
    Duplicate,
}

/// Result of [`SequenceRegistry::propose_update`].
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The update was applied; the receipt tracks persistence.
    Accepted(SaveReceipt),
    /// Nothing changed.
    Rejected(UpdateRejection),
}

impl UpdateOutcome {
    /// Whether the update was applied.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// A sequence number consumed for a newly issued validation.
#[derive(Debug)]
pub struct IssuedSequence {
    /// Machine validation ID in force.
    pub machine_validation_id: MachineValidationId,
    /// The consumed sequence number.
    pub sequence_number: SequenceNumber,
    /// Persistence of the advanced sequence.
    pub receipt: SaveReceipt,
}

/// Registry of the Secure Enhanced machine ID and sequence.
#[derive(Debug)]
pub struct SequenceRegistry {
    state: Mutex<ValidationRegistration>,
    writer: WriteQueue<ValidationRegistration>,
}

impl SequenceRegistry {
    /// Load the registration from `store` and start its writer.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn load(store: Arc<dyn PersistentStore>) -> Result<Self, StorageError> {
        let registration = load_record::<ValidationRegistration>(store.as_ref())?;
        tracing::debug!(
            machine_id = %registration.machine_validation_id,
            sequence = %registration.sequence_number,
            configured = registration.configured,
            "loaded validation registration"
        );
        Ok(Self {
            state: Mutex::new(registration),
            writer: WriteQueue::spawn(store)?,
        })
    }

    /// The last accepted registration.
    pub fn current(&self) -> ValidationRegistration {
        *self.state.lock()
    }

    /// Apply a host request to set the machine ID and sequence.
    pub fn propose_update(
        &self,
        machine_id: MachineValidationId,
        sequence: SequenceNumber,
    ) -> UpdateOutcome {
        if machine_id.is_query() {
            metrics::counter!("sas_sequence_updates_total", "outcome" => "query").increment(1);
            return UpdateOutcome::Rejected(UpdateRejection::ZeroMachineId);
        }

        let mut state = self.state.lock();
        let same_pair =
            state.machine_validation_id == machine_id && state.sequence_number == sequence;
        let resend = state.configured && same_pair && state.last_received_sequence == sequence;
        state.last_received_sequence = sequence;

        if resend {
            tracing::debug!(
                machine_id = %machine_id,
                sequence = %sequence,
                "ignoring repeated validation id"
            );
            metrics::counter!("sas_sequence_updates_total", "outcome" => "duplicate").increment(1);
            return UpdateOutcome::Rejected(UpdateRejection::Duplicate);
        }

        let rollover = sequence.follows(state.sequence_number)
            && sequence.get() < state.sequence_number.get();
        state.machine_validation_id = machine_id;
        state.sequence_number = sequence;
        state.configured = true;
        tracing::info!(
            machine_id = %machine_id,
            sequence = %sequence,
            rollover,
            "validation id accepted"
        );
        metrics::counter!("sas_sequence_updates_total", "outcome" => "accepted").increment(1);
        UpdateOutcome::Accepted(self.writer.enqueue(*state))
    }

    /// Consume the current sequence number for a new validation.
    ///
    /// Returns `None` until the host has assigned a machine ID.
    pub fn advance(&self) -> Option<IssuedSequence> {
        let mut state = self.state.lock();
        if !state.configured {
            return None;
        }
        let issued = state.sequence_number;
        state.sequence_number = issued.next();
        Some(IssuedSequence {
            machine_validation_id: state.machine_validation_id,
            sequence_number: issued,
            receipt: self.writer.enqueue(*state),
        })
    }

    /// Restore first-boot defaults after a full validation reconfiguration.
    pub fn reset(&self) -> SaveReceipt {
        let mut state = self.state.lock();
        *state = ValidationRegistration::default();
        tracing::info!("validation registration reset");
        self.writer.enqueue(*state)
    }

    /// Queue the current registration behind any pending writes. The
    /// receipt resolves once all of them have been applied.
    pub fn flush(&self) -> SaveReceipt {
        self.writer.enqueue(*self.state.lock())
    }
}

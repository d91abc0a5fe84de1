//! # sas-state — Registries and State Machines
//!
//! Stateful core of the validation engine.
//!
//! - [`SequenceRegistry`]: Secure Enhanced machine validation ID and
//!   sequence, with rollover and resend suppression. Persisted.
//! - [`TicketingPolicyCoordinator`]: expiration defaults and the restricted
//!   pool policy. Persisted.
//! - [`HostValidationMachine`]: the System validation cash-out handshake
//!   (long polls 0x57 and 0x58).
//! - [`VoucherRedemptionMachine`]: ticket-in redemption (long polls 0x70
//!   and 0x71).
//!
//! ## Design
//!
//! Each machine holds one tagged-union state behind a `parking_lot::Mutex`.
//! Transitions take the old state by value and produce the next one, so a
//! state's data (a pending responder, a barcode) exists only while that
//! state does. Results handed across calls use `tokio::sync::oneshot`,
//! which resolves at most once.
//!
//! The registries decide whether a change is accepted; persistence is
//! queued on a per-record [`sas_store::WriteQueue`] and never blocks the
//! caller.

pub mod error;
pub mod host_validation;
pub mod policy;
pub mod redemption;
pub mod sequence;

pub use error::{HostValidationError, PolicyError, RedemptionError};
pub use host_validation::{
    CashoutType, HostValidationData, HostValidationMachine, HostValidationVerdict,
    PendingCashout, SubmitStatus,
};
pub use policy::{PolicyResolution, TicketingPolicy, TicketingPolicyCoordinator};
pub use redemption::{
    RedeemRequest, RedeemResponse, RedemptionOutcome, TicketStatus, TransferCode,
    ValidationRequest, VoucherRedemptionMachine,
};
pub use sequence::{
    IssuedSequence, SequenceRegistry, UpdateOutcome, UpdateRejection, ValidationRegistration,
};

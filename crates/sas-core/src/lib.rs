//! # sas-core — Foundational Types for the SAS Validation Engine
//!
//! This crate is the leaf of the workspace. It defines the domain primitives
//! shared by the persisted registries, the validation state machines, and the
//! long-poll handlers. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for wire primitives.** `MachineValidationId`, `SequenceNumber`,
//!    `ValidationSystemId`, `ValidationNumber`, `PoolId` all carry their wire
//!    range in their constructor. A sequence number above `0xFFFFFF` cannot be
//!    represented.
//!
//! 2. **Two amount units, one conversion.** The accounting subsystem counts in
//!    `Millicents`; the wire counts in `Cents`. The only path between them is
//!    [`Millicents::to_cents()`] / [`Cents::to_millicents()`].
//!
//! 3. **Collaborators are traits.** Transaction history, configuration, device
//!    status, and bank balance are consumed through the narrow interfaces in
//!    [`collaborators`], so the engine is deterministic given its inputs.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sas-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod barcode;
pub mod codec;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod expiration;
pub mod identity;
pub mod scheme;
pub mod transaction;

// Re-export primary types for ergonomic imports.
pub use amount::{Cents, Millicents, MILLICENTS_PER_CENT};
pub use barcode::{ValidationData, VALIDATION_DIGITS};
pub use codec::{PayloadReader, PayloadWriter};
pub use collaborators::{
    AccountType, BankBalance, ConfigurationProvider, DeviceStatus, InMemoryBank, InMemoryHistory,
    StaticDeviceStatus, TransactionHistory,
};
pub use config::{FeatureFlags, StaticConfiguration, ValidationConfig};
pub use error::{BarcodeError, CodecError, ConfigError, SasError};
pub use expiration::Expiration;
pub use identity::{
    MachineValidationId, PoolId, SequenceNumber, TransactionId, ValidationNumber,
    ValidationSystemId,
};
pub use scheme::{HostControlBits, ValidationScheme};
pub use transaction::{
    HandpayKind, HandpayTransaction, TicketKind, Transaction, TransactionKind, VoucherKind,
    VoucherOutTransaction,
};

//! Errors raised by the state machines and registries.
//!
//! Protocol rejections reported to the host travel as status codes in
//! response payloads. These types cover misuse by the EGM side: starting a
//! second redemption while one is in flight, or beginning a host-validated
//! cash-out when the handshake does not apply.

use thiserror::Error;

use sas_core::{PoolId, ValidationScheme};

/// Errors raised by the ticketing policy coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Restricted credits of another pool are still on the machine.
    #[error("restricted pool {incoming} conflicts with pool {stored} holding credits")]
    PoolMismatch {
        /// Pool currently holding restricted credits.
        stored: PoolId,
        /// Pool requested by the host.
        incoming: PoolId,
    },
}

/// Errors raised by the voucher redemption machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedemptionError {
    /// Another ticket is already being redeemed.
    #[error("a ticket redemption is already in progress")]
    Busy,
}

/// Errors raised by the host validation machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostValidationError {
    /// The host-validated cash-out handshake only runs under System validation.
    #[error("host validation requires System validation, scheme is {0}")]
    NotSystemValidation(ValidationScheme),

    /// A cash-out is already waiting for the host.
    #[error("a cash-out is already awaiting host validation")]
    CashoutInProgress,
}

//! # Long Poll Payloads
//!
//! One module per long poll the engine answers. Each holds the decoded
//! command, the response with its fixed-width encoder, and the handler that
//! maps one onto the other through the engine's components.
//!
//! Payloads exclude framing: no address, command byte, or CRC.

pub mod enhanced_validation;
pub mod pending_cashout;
pub mod receive_validation_number;
pub mod redeem_ticket;
pub mod set_validation_id;
pub mod ticket_validation_data;
pub mod validation_status;

use serde::{Deserialize, Serialize};

use crate::selector::ImpliedAck;

/// Long polls handled by the validation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongPollCode {
    /// 0x4C Set Secure Enhanced Validation ID.
    SetSecureEnhancedValidationId,
    /// 0x4D Send Enhanced Validation Information.
    SendEnhancedValidationInformation,
    /// 0x57 Send Pending Cashout Information.
    SendPendingCashoutInformation,
    /// 0x58 Receive Validation Number.
    ReceiveValidationNumber,
    /// 0x70 Send Ticket Validation Data.
    SendTicketValidationData,
    /// 0x71 Redeem Ticket.
    RedeemTicket,
    /// 0x7B Extended Validation Status.
    ExtendedValidationStatus,
}

impl LongPollCode {
    /// Decode a command byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x4C => Some(Self::SetSecureEnhancedValidationId),
            0x4D => Some(Self::SendEnhancedValidationInformation),
            0x57 => Some(Self::SendPendingCashoutInformation),
            0x58 => Some(Self::ReceiveValidationNumber),
            0x70 => Some(Self::SendTicketValidationData),
            0x71 => Some(Self::RedeemTicket),
            0x7B => Some(Self::ExtendedValidationStatus),
            _ => None,
        }
    }

    /// Command byte.
    pub fn code(self) -> u8 {
        match self {
            Self::SetSecureEnhancedValidationId => 0x4C,
            Self::SendEnhancedValidationInformation => 0x4D,
            Self::SendPendingCashoutInformation => 0x57,
            Self::ReceiveValidationNumber => 0x58,
            Self::SendTicketValidationData => 0x70,
            Self::RedeemTicket => 0x71,
            Self::ExtendedValidationStatus => 0x7B,
        }
    }

    /// Metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetSecureEnhancedValidationId => "4C",
            Self::SendEnhancedValidationInformation => "4D",
            Self::SendPendingCashoutInformation => "57",
            Self::ReceiveValidationNumber => "58",
            Self::SendTicketValidationData => "70",
            Self::RedeemTicket => "71",
            Self::ExtendedValidationStatus => "7B",
        }
    }
}

impl std::fmt::Display for LongPollCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.as_str())
    }
}

/// Encoded response for the framing layer.
#[derive(Debug)]
pub struct LongPollResponse {
    /// Response payload.
    pub payload: Vec<u8>,
    /// Hooks to fire when the host's next poll confirms or rejects this
    /// response.
    pub implied: Option<ImpliedAck>,
}

impl LongPollResponse {
    /// A response with no acknowledgment hooks.
    pub fn plain(payload: Vec<u8>) -> Self {
        Self {
            payload,
            implied: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_poll_codes() {
        for code in [0x4C, 0x4D, 0x57, 0x58, 0x70, 0x71, 0x7B] {
            let poll = LongPollCode::from_code(code).unwrap();
            assert_eq!(poll.code(), code);
        }
        assert!(LongPollCode::from_code(0x3D).is_none());
        assert_eq!(LongPollCode::RedeemTicket.to_string(), "0x71");
    }
}

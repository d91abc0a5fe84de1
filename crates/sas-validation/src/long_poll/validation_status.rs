//! 0x7B Extended Validation Status.
//!
//! Command (length-prefixed): control mask (2 binary), control status
//! (2 binary), cashable ticket expiration (2 BCD days), restricted ticket
//! expiration (2 BCD days). A zero expiration leaves the current value.
//!
//! Response (length-prefixed): asset number (4 binary), control status in
//! force (2 binary), cashable expiration (2 BCD), restricted expiration
//! (2 BCD).

use sas_core::{CodecError, HostControlBits, PayloadReader, PayloadWriter};
use sas_state::TicketingPolicyCoordinator;

use crate::scheme::ValidationSchemeSelector;

/// Decoded 0x7B command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationStatusCommand {
    /// Bits the host is setting.
    pub mask: HostControlBits,
    /// New values for the masked bits.
    pub status: HostControlBits,
    /// Cashable expiration in days; zero leaves it unchanged.
    pub cashable_expiration_days: u16,
    /// Restricted expiration in days; zero leaves it unchanged.
    pub restricted_expiration_days: u16,
}

impl ValidationStatusCommand {
    /// Decode the command payload, including its length byte.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = PayloadReader::with_length_prefix(payload)?;
        Ok(Self {
            mask: HostControlBits::from_bits_truncate(reader.binary(2)? as u16),
            status: HostControlBits::from_bits_truncate(reader.binary(2)? as u16),
            // Four BCD digits always fit.
            cashable_expiration_days: reader.bcd(2)? as u16,
            restricted_expiration_days: reader.bcd(2)? as u16,
        })
    }
}

/// 0x7B response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationStatusResponse {
    /// EGM asset number.
    pub asset_number: u32,
    /// Control bits in force.
    pub bits: HostControlBits,
    /// Cashable expiration in days.
    pub cashable_expiration_days: u16,
    /// Restricted expiration in days.
    pub restricted_expiration_days: u16,
}

impl ValidationStatusResponse {
    /// Encode the response payload.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = PayloadWriter::new();
        writer
            .binary(u64::from(self.asset_number), 4)?
            .binary(u64::from(self.bits.bits()), 2)?
            .bcd(u64::from(self.cashable_expiration_days), 2)?
            .bcd(u64::from(self.restricted_expiration_days), 2)?;
        writer.finish_with_length()
    }
}

/// Outcome of a 0x7B command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationStatusOutcome {
    /// Response to send.
    pub response: ValidationStatusResponse,
    /// Whether the control bits changed.
    pub features_changed: bool,
}

/// Apply the host's control bits and expirations.
pub fn handle(
    scheme: &ValidationSchemeSelector,
    policy: &TicketingPolicyCoordinator,
    asset_number: u32,
    command: ValidationStatusCommand,
) -> ValidationStatusOutcome {
    let change = scheme.apply(command.mask, command.status);
    let features_changed = change.changed();
    // Persistence failures are logged by the writers.
    drop(change.receipt);
    drop(policy.set_expirations(
        Some(command.cashable_expiration_days),
        Some(command.restricted_expiration_days),
    ));

    let current = policy.current();
    ValidationStatusOutcome {
        response: ValidationStatusResponse {
            asset_number,
            bits: change.bits,
            cashable_expiration_days: current.cashable_expiration_days,
            restricted_expiration_days: current.default_restricted_expiration_days,
        },
        features_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_command() {
        let command =
            ValidationStatusCommand::decode(&[8, 0x01, 0x80, 0x01, 0x00, 0x00, 0x45, 0x01, 0x20])
                .unwrap();
        assert_eq!(
            command.mask,
            HostControlBits::USE_PRINTER_AS_CASHOUT_DEVICE
                | HostControlBits::SECURE_ENHANCED_CONFIGURATION
        );
        assert_eq!(command.status, HostControlBits::USE_PRINTER_AS_CASHOUT_DEVICE);
        assert_eq!(command.cashable_expiration_days, 45);
        assert_eq!(command.restricted_expiration_days, 120);
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        assert!(matches!(
            ValidationStatusCommand::decode(&[9, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(CodecError::LengthMismatch {
                declared: 9,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_encode_response() {
        let response = ValidationStatusResponse {
            asset_number: 0x0102_0304,
            bits: HostControlBits::TICKET_REDEMPTION,
            cashable_expiration_days: 30,
            restricted_expiration_days: 9_999,
        };
        let bytes = response.encode().unwrap();
        assert_eq!(bytes[0], 10);
        assert_eq!(&bytes[1..5], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(
            &bytes[5..7],
            &HostControlBits::TICKET_REDEMPTION.bits().to_le_bytes()
        );
        assert_eq!(&bytes[7..9], &[0x00, 0x30]);
        assert_eq!(&bytes[9..11], &[0x99, 0x99]);
    }
}

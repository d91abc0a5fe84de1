//! 0x58 Receive Validation Number.
//!
//! Command: validation system ID (1 BCD) and validation number (8 BCD). A
//! system ID of zero denies the pending cash-out. Response: one status
//! byte.

use sas_core::{CodecError, PayloadReader, ValidationNumber, ValidationSystemId};
use sas_state::{HostValidationMachine, SubmitStatus};

/// Decoded 0x58 command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveValidationNumberCommand {
    /// Validation system ID; zero denies.
    pub system_id: ValidationSystemId,
    /// Validation number to print.
    pub number: ValidationNumber,
}

impl ReceiveValidationNumberCommand {
    /// Decode the command payload.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = PayloadReader::new(payload);
        let system_id = reader.bcd(1)?;
        let number = reader.bcd(8)?;
        Ok(Self {
            // Two BCD digits and sixteen BCD digits fit their ranges.
            system_id: ValidationSystemId::new(system_id as u8).unwrap_or_default(),
            number: ValidationNumber::new(number).unwrap_or_default(),
        })
    }

    /// Whether the host denies the cash-out.
    pub fn is_denial(&self) -> bool {
        self.system_id.get() == 0
    }
}

/// Wire value of a submission status.
pub fn status_code(status: SubmitStatus) -> u8 {
    match status {
        SubmitStatus::Acknowledged => 0x00,
        SubmitStatus::NotInCashout => 0x80,
        SubmitStatus::ImproperValidationRejected => 0x81,
    }
}

/// Hand the host's answer to the cash-out handshake.
pub fn handle(machine: &HostValidationMachine, command: ReceiveValidationNumberCommand) -> Vec<u8> {
    let status =
        machine.submit_validation(command.system_id, command.number, command.is_denial());
    vec![status_code(status)]
}

//! 0x4C Set Secure Enhanced Validation ID.
//!
//! Command and response carry a three-byte machine validation ID and a
//! three-byte sequence number, both binary. The response echoes the values
//! in force after the request, so a machine ID of zero reads them back.

use sas_core::{CodecError, MachineValidationId, PayloadReader, PayloadWriter, SequenceNumber};
use sas_state::{SequenceRegistry, UpdateOutcome};

const ID_BYTES: usize = 3;

/// Decoded 0x4C command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetValidationIdCommand {
    /// Requested machine validation ID; zero queries.
    pub machine_id: MachineValidationId,
    /// Requested sequence number.
    pub sequence: SequenceNumber,
}

impl SetValidationIdCommand {
    /// Decode the command payload.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = PayloadReader::new(payload);
        let machine_id = reader.binary(ID_BYTES)?;
        let sequence = reader.binary(ID_BYTES)?;
        Ok(Self {
            machine_id: MachineValidationId::new(machine_id as u32).ok_or(
                CodecError::OutOfRange {
                    field: "machine_validation_id",
                    value: machine_id,
                },
            )?,
            sequence: SequenceNumber::new(sequence as u32).ok_or(CodecError::OutOfRange {
                field: "sequence_number",
                value: sequence,
            })?,
        })
    }
}

/// 0x4C response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetValidationIdResponse {
    /// Machine validation ID in force.
    pub machine_id: MachineValidationId,
    /// Sequence number in force.
    pub sequence: SequenceNumber,
}

impl SetValidationIdResponse {
    /// Encode the response payload.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = PayloadWriter::new();
        writer
            .binary(u64::from(self.machine_id.get()), ID_BYTES)?
            .binary(u64::from(self.sequence.get()), ID_BYTES)?;
        Ok(writer.finish())
    }
}

/// Apply the request and report the registration in force.
pub fn handle(
    registry: &SequenceRegistry,
    command: SetValidationIdCommand,
) -> SetValidationIdResponse {
    if let UpdateOutcome::Rejected(reason) =
        registry.propose_update(command.machine_id, command.sequence)
    {
        tracing::debug!(?reason, "validation id unchanged");
    }
    let current = registry.current();
    SetValidationIdResponse {
        machine_id: current.machine_validation_id,
        sequence: current.sequence_number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_little_endian_fields() {
        let command =
            SetValidationIdCommand::decode(&[0x56, 0x34, 0x12, 0x03, 0x02, 0x01]).unwrap();
        assert_eq!(command.machine_id.get(), 0x12_3456);
        assert_eq!(command.sequence.get(), 0x01_0203);
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            SetValidationIdCommand::decode(&[0x01, 0x00, 0x00, 0x05]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_encode_response() {
        let response = SetValidationIdResponse {
            machine_id: MachineValidationId::new(0xABCDEF).unwrap(),
            sequence: SequenceNumber::new(1).unwrap(),
        };
        assert_eq!(
            response.encode().unwrap(),
            vec![0xEF, 0xCD, 0xAB, 0x01, 0x00, 0x00]
        );
    }
}

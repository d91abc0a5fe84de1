//! 0x70 Send Ticket Validation Data.
//!
//! Response (length-prefixed): ticket status (1), amount (5 BCD), parsing
//! code (1), validation data (9 BCD). The EGM does not know the ticket
//! amount, so it is always zero.

use sas_core::barcode::{encode_validation_data, validation_digits, VALIDATION_DATA_BYTES};
use sas_core::{Cents, CodecError, PayloadWriter};
use sas_state::{ValidationRequest, VoucherRedemptionMachine};

const VALID_DATA: u8 = 0x00;
const NO_TICKET_DATA: u8 = 0xFF;

/// 0x70 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketValidationDataResponse {
    /// A ticket is waiting for the host.
    Ticket {
        /// Parsing code of the validation data.
        parsing_code: u8,
        /// Nine BCD bytes of validation data.
        validation_data: Vec<u8>,
    },
    /// No ticket is waiting.
    NoTicketData,
}

impl TicketValidationDataResponse {
    /// Build the response for a waiting ticket.
    ///
    /// Short barcodes are zero-padded and long ones truncated to eighteen
    /// digits. Barcodes that are not numeric are reported as no ticket data.
    pub fn for_request(request: &ValidationRequest) -> Self {
        let encoded = validation_digits(&request.barcode)
            .map(|digits| encode_validation_data(&digits));
        match encoded {
            Some(Ok(validation_data)) => Self::Ticket {
                parsing_code: request.parsing_code,
                validation_data,
            },
            Some(Err(e)) => {
                tracing::warn!(barcode = %request.barcode, error = %e, "unusable ticket barcode");
                Self::NoTicketData
            }
            None => {
                tracing::warn!(barcode = %request.barcode, "ticket barcode is not numeric");
                Self::NoTicketData
            }
        }
    }

    /// Encode the response payload.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = PayloadWriter::new();
        match self {
            Self::Ticket {
                parsing_code,
                validation_data,
            } => {
                writer
                    .u8(VALID_DATA)
                    .bcd(Cents::ZERO.0, 5)?
                    .u8(*parsing_code)
                    .bytes(validation_data);
            }
            Self::NoTicketData => {
                writer
                    .u8(NO_TICKET_DATA)
                    .bcd(0, 5)?
                    .u8(0)
                    .bytes(&[0; VALIDATION_DATA_BYTES]);
            }
        }
        writer.finish_with_length()
    }
}

/// Report the validation data of the inserted ticket.
pub fn handle(machine: &VoucherRedemptionMachine) -> TicketValidationDataResponse {
    machine
        .request_validation_data()
        .map_or(TicketValidationDataResponse::NoTicketData, |request| {
            TicketValidationDataResponse::for_request(&request)
        })
}

//! 0x71 Redeem Ticket.
//!
//! Command (length-prefixed): transfer code (1), amount (5 BCD), parsing
//! code (1), validation data (9 BCD). The restricted promotional transfer
//! code appends an expiration (4 BCD) and pool ID (2 binary).
//!
//! Response (length-prefixed): machine status (1), amount (5 BCD), parsing
//! code (1), validation data (9 BCD).

use sas_core::barcode::{
    encode_validation_data, validation_digits, PARSING_CODE_BCD18, VALIDATION_DATA_BYTES,
};
use sas_core::{Cents, CodecError, Expiration, HostControlBits, PayloadReader, PayloadWriter, PoolId};
use sas_state::{RedeemRequest, RedeemResponse, TicketStatus, TransferCode, VoucherRedemptionMachine};

/// Decoded 0x71 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemTicketCommand {
    /// Raw transfer code; unknown codes are answered without a state change.
    pub transfer_code: u8,
    /// Amount the host credits.
    pub amount: Cents,
    /// Parsing code of the validation data.
    pub parsing_code: u8,
    /// Validation data as eighteen digits.
    pub barcode: String,
    /// Restricted expiration; `Default` when absent.
    pub expiration: Expiration,
    /// Restricted pool; zero when absent.
    pub pool_id: PoolId,
}

impl RedeemTicketCommand {
    /// Decode the command payload, including its length byte.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = PayloadReader::with_length_prefix(payload)?;
        let transfer_code = reader.u8()?;
        let amount = Cents(reader.bcd(5)?);
        let parsing_code = reader.u8()?;
        let barcode = reader.bcd_digits(VALIDATION_DATA_BYTES)?;
        let (expiration, pool_id) =
            if transfer_code == TransferCode::ValidRestrictedPromotionalTicket.code() {
                let expiration = Expiration::from_wire(reader.bcd(4)? as u32)?;
                let pool_id = PoolId(reader.binary(2)? as u16);
                (expiration, pool_id)
            } else {
                (Expiration::Default, PoolId::default())
            };
        Ok(Self {
            transfer_code,
            amount,
            parsing_code,
            barcode,
            expiration,
            pool_id,
        })
    }

    /// The state machine request, if the transfer code is known.
    pub fn to_request(&self) -> Option<RedeemRequest> {
        Some(RedeemRequest {
            transfer_code: TransferCode::from_code(self.transfer_code)?,
            amount: self.amount,
            barcode: self.barcode.clone(),
            pool_id: self.pool_id,
            expiration: self.expiration,
        })
    }
}

/// Encode a redeem response.
///
/// Validation data that cannot be represented is sent as zeros.
pub fn encode(response: &RedeemResponse) -> Result<Vec<u8>, CodecError> {
    let validation_data = response
        .barcode
        .as_deref()
        .and_then(validation_digits)
        .and_then(|digits| encode_validation_data(&digits).ok())
        .unwrap_or_else(|| vec![0; VALIDATION_DATA_BYTES]);
    let mut writer = PayloadWriter::new();
    writer
        .u8(response.status.code())
        .bcd(response.amount.0, 5)?
        .u8(PARSING_CODE_BCD18)
        .bytes(&validation_data);
    writer.finish_with_length()
}

/// Apply the host's redeem command under the host-control bits in force.
pub fn handle(
    machine: &VoucherRedemptionMachine,
    command: &RedeemTicketCommand,
    bits_in_force: HostControlBits,
) -> RedeemResponse {
    match command.to_request() {
        Some(request) => machine.redeem(request, bits_in_force),
        None => {
            tracing::warn!(
                transfer_code = command.transfer_code,
                "unknown ticket transfer code"
            );
            RedeemResponse {
                status: TicketStatus::NotAValidTransferFunction,
                amount: Cents::ZERO,
                barcode: None,
            }
        }
    }
}

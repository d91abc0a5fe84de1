//! 0x57 Send Pending Cashout Information.
//!
//! Response: cash-out type (1 byte) and amount in cents (5 BCD).

use sas_core::{Cents, CodecError, PayloadWriter};
use sas_state::{CashoutType, HostValidationMachine, PendingCashout};

const CASHABLE: u8 = 0x00;
const RESTRICTED: u8 = 0x01;
const NOT_WAITING: u8 = 0x80;

/// 0x57 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCashoutResponse(pub PendingCashout);

impl PendingCashoutResponse {
    /// Encode the response payload.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let (kind, amount) = match self.0 {
            PendingCashout::Waiting(data) => (
                match data.ticket_type {
                    CashoutType::Cashable => CASHABLE,
                    CashoutType::Restricted => RESTRICTED,
                },
                data.amount,
            ),
            PendingCashout::NotWaiting => (NOT_WAITING, Cents::ZERO),
        };
        let mut writer = PayloadWriter::new();
        writer.u8(kind).bcd(amount.0, 5)?;
        Ok(writer.finish())
    }
}

/// Report the cash-out awaiting a validation number.
pub fn handle(machine: &HostValidationMachine) -> PendingCashoutResponse {
    PendingCashoutResponse(machine.request_pending_cashout())
}

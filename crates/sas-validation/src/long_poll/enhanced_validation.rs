//! 0x4D Send Enhanced Validation Information.
//!
//! The command is a single function code. The response is a fixed 31-byte
//! record:
//!
//! | Field               | Bytes | Encoding |
//! |---------------------|-------|----------|
//! | validation type     | 1     | binary   |
//! | index               | 1     | binary   |
//! | date `MMDDYYYY`     | 4     | BCD      |
//! | time `HHMMSS`       | 3     | BCD      |
//! | validation number   | 8     | BCD      |
//! | amount (cents)      | 5     | BCD      |
//! | ticket number       | 2     | binary   |
//! | validation system   | 1     | BCD      |
//! | expiration          | 4     | BCD      |
//! | pool ID             | 2     | binary   |
//!
//! The query is answered only under Secure Enhanced validation.

use chrono::{Datelike, Timelike};

use sas_core::{CodecError, PayloadReader, PayloadWriter, ValidationScheme};

use crate::selector::{FunctionCode, Selection, ValidationRecordSelector, ValidationResponse};

/// Length of an encoded response.
pub const RESPONSE_LEN: usize = 31;

/// Decoded 0x4D command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhancedValidationCommand {
    /// Raw function code; unknown codes produce a failed response.
    pub function_code: u8,
}

impl EnhancedValidationCommand {
    /// Decode the command payload.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut reader = PayloadReader::new(payload);
        Ok(Self {
            function_code: reader.u8()?,
        })
    }
}

/// Encode a validation record.
pub fn encode(response: &ValidationResponse) -> Result<Vec<u8>, CodecError> {
    let (date, time) = response.occurred_at.map_or((0, 0), |at| {
        (
            u64::from(at.month()) * 1_000_000
                + u64::from(at.day()) * 10_000
                + u64::from(at.year().max(0) as u32),
            u64::from(at.hour()) * 10_000 + u64::from(at.minute()) * 100 + u64::from(at.second()),
        )
    });
    let mut writer = PayloadWriter::new();
    writer
        .u8(response.validation_type.map_or(0, |t| t.code()))
        .u8(response.index)
        .bcd(date, 4)?
        .bcd(time, 3)?
        .bcd(response.validation_number.get(), 8)?
        .bcd(response.amount.0, 5)?
        .binary(u64::from(response.ticket_number), 2)?
        .bcd(u64::from(response.system_id.get()), 1)?
        .bcd(u64::from(response.expiration.to_wire()), 4)?
        .binary(u64::from(response.pool_id.0), 2)?;
    Ok(writer.finish())
}

/// Read the oldest pending record.
///
/// Returns `None` when the active scheme does not answer this query.
pub fn handle(
    selector: &ValidationRecordSelector,
    scheme: ValidationScheme,
    command: EnhancedValidationCommand,
) -> Option<Selection> {
    if scheme != ValidationScheme::SecureEnhanced {
        tracing::debug!(%scheme, "enhanced validation query suppressed");
        return None;
    }
    let failed = || Selection {
        response: ValidationResponse::failed(),
        implied: None,
    };
    let Some(function_code) = FunctionCode::from_code(command.function_code) else {
        tracing::warn!(
            function_code = command.function_code,
            "unsupported enhanced validation function"
        );
        return Some(failed());
    };
    Some(
        selector
            .oldest_pending_kind()
            .map_or_else(failed, |kind| selector.select(function_code, kind)),
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use sas_core::{Cents, Expiration, PoolId, ValidationNumber, ValidationSystemId};

    proptest! {
        #[test]
        fn in_range_records_encode_to_fixed_length(
            number in 0u64..=ValidationNumber::MAX,
            system in 0u8..=ValidationSystemId::MAX,
            cents in 0u64..10_000_000_000,
            ticket in any::<u16>(),
            days in 0u16..=9_999,
            pool in any::<u16>(),
        ) {
            let response = ValidationResponse {
                successful: true,
                validation_type: None,
                index: 1,
                occurred_at: None,
                validation_number: ValidationNumber::new(number).unwrap(),
                system_id: ValidationSystemId::new(system).unwrap(),
                amount: Cents(cents),
                ticket_number: ticket,
                expiration: Expiration::Days(days),
                pool_id: PoolId(pool),
                transaction_id: None,
            };
            let bytes = encode(&response).unwrap();
            prop_assert_eq!(bytes.len(), RESPONSE_LEN);
            prop_assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), ticket);
            prop_assert_eq!(u16::from_le_bytes([bytes[29], bytes[30]]), pool);
        }
    }
}

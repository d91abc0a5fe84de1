//! # Barcode Subcommand
//!
//! `sasv barcode decode <BARCODE>` prints the validation system ID,
//! validation number and the nine-byte validation data field a ticket
//! barcode carries.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use sas_core::barcode::{encode_validation_data, PARSING_CODE_BCD18};
use sas_core::{ValidationData, VALIDATION_DIGITS};

use crate::to_hex;

/// Arguments for the `sasv barcode` subcommand.
#[derive(Args, Debug)]
pub struct BarcodeArgs {
    #[command(subcommand)]
    pub command: BarcodeCommand,
}

/// Barcode operations.
#[derive(Subcommand, Debug)]
pub enum BarcodeCommand {
    /// Derive validation data from a printed barcode.
    Decode {
        /// Barcode digits as printed.
        barcode: String,
    },
}

/// Execute the barcode subcommand.
pub fn run_barcode(args: &BarcodeArgs) -> Result<u8> {
    match &args.command {
        BarcodeCommand::Decode { barcode } => decode(barcode),
    }
}

fn decode(barcode: &str) -> Result<u8> {
    let data = match ValidationData::from_barcode(Some(barcode)) {
        Ok(data) => data,
        Err(e) => {
            println!("FAIL: {e}");
            return Ok(1);
        }
    };
    let validation_data = encode_validation_data(&barcode[..VALIDATION_DIGITS])?;
    let report = json!({
        "barcode": barcode,
        "system_id": data.system_id.get(),
        "validation_number": data.number.to_string(),
        "parsing_code": PARSING_CODE_BCD18,
        "validation_data": to_hex(&validation_data),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(barcode: &str) -> u8 {
        run_barcode(&BarcodeArgs {
            command: BarcodeCommand::Decode {
                barcode: barcode.to_string(),
            },
        })
        .unwrap()
    }

    #[test]
    fn decode_valid_barcode() {
        assert_eq!(run("036429188185446104"), 0);
    }

    #[test]
    fn decode_short_barcode_fails() {
        assert_eq!(run("12"), 1);
    }

    #[test]
    fn decode_non_digit_barcode_fails() {
        assert_eq!(run("03642918818544610X"), 1);
    }
}

//! # sas-cli — SAS Validation Harness
//!
//! A host-side harness around the validation engine.
//!
//! ## Subcommands
//!
//! - `barcode` — derive validation data from a ticket barcode
//! - `config` — parse and validate a YAML configuration
//! - `poll` — dispatch one long poll against an engine whose state lives
//!   in a JSON file, so successive invocations form a session
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from handlers; handlers delegate to the
//!   engine crates.
//! - Handlers return an exit code: 0 on success, 1 when the input was
//!   rejected. Operational failures are `anyhow` errors (exit code 2).

pub mod barcode;
pub mod config;
pub mod poll;

/// Encode bytes as uppercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Decode a hex string, ignoring whitespace.
pub fn from_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if !s.is_ascii() {
        anyhow::bail!("hex string contains non-ASCII characters");
    }
    if s.len() % 2 != 0 {
        anyhow::bail!("hex string has odd length: {}", s.len());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| anyhow::anyhow!("invalid hex at position {i}: {e}"))
        })
        .collect()
}

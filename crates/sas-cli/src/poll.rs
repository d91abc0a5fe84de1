//! # Poll Subcommand
//!
//! `sasv poll <CODE> [PAYLOAD] --store <PATH>` builds a validation engine
//! over a JSON state file, dispatches one long poll, and prints the
//! response payload in hex. The state file carries the Secure Enhanced
//! registration, ticketing policy and control bits between invocations.
//!
//! ```text
//! sasv poll 4C 563412100000 --store sas-state.json
//! sasv poll 4D 00 --history transactions.json --ack
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use sas_core::{
    InMemoryBank, InMemoryHistory, StaticConfiguration, StaticDeviceStatus, Transaction,
    ValidationConfig,
};
use sas_store::FileStore;
use sas_validation::{LongPollCode, ValidationEngine};

use crate::{from_hex, to_hex};

/// Arguments for the `sasv poll` subcommand.
#[derive(Args, Debug)]
pub struct PollArgs {
    /// Long poll command byte in hex (4C, 0x4D, ...).
    pub code: String,

    /// Command payload in hex, without address, command byte or CRC.
    #[arg(default_value = "")]
    pub payload: String,

    /// JSON state file; created on first use.
    #[arg(long, default_value = "sas-state.json")]
    pub store: PathBuf,

    /// YAML validation configuration; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON array of completed transactions to report.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Confirm the response as the host's next poll would.
    #[arg(long, conflicts_with = "nack")]
    pub ack: bool,

    /// Reject the response as the host's next poll would.
    #[arg(long)]
    pub nack: bool,
}

/// Execute the poll subcommand.
pub fn run_poll(args: &PollArgs) -> Result<u8> {
    let Some(code) = parse_code(&args.code) else {
        println!("FAIL: unsupported long poll {}", args.code);
        return Ok(1);
    };
    let payload = from_hex(&args.payload).context("invalid payload")?;
    let config = match &args.config {
        Some(path) => ValidationConfig::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ValidationConfig::default(),
    };
    let history = Arc::new(InMemoryHistory::new());
    if let Some(path) = &args.history {
        for transaction in load_history(path)? {
            history.record(transaction);
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(poll_once(args, code, &payload, config, history))
}

async fn poll_once(
    args: &PollArgs,
    code: LongPollCode,
    payload: &[u8],
    config: ValidationConfig,
    history: Arc<InMemoryHistory>,
) -> Result<u8> {
    let engine = ValidationEngine::builder()
        .store(Arc::new(FileStore::open(&args.store)))
        .configuration(Arc::new(StaticConfiguration::new(config)))
        .device_status(Arc::new(StaticDeviceStatus::default()))
        .bank(Arc::new(InMemoryBank::new()))
        .transaction_history(history)
        .build()
        .context("failed to build validation engine")?;

    let Some(response) = engine.dispatch(code, payload)? else {
        engine.flush().await?;
        println!("{}", json!({ "poll": code.to_string(), "answered": false }));
        return Ok(0);
    };

    let implied = match response.implied {
        Some(hook) if args.ack => {
            hook.ack();
            "acked"
        }
        Some(hook) if args.nack => {
            hook.nack();
            "nacked"
        }
        Some(_) => "pending",
        None => "none",
    };
    engine.flush().await?;
    println!(
        "{}",
        json!({
            "poll": code.to_string(),
            "answered": true,
            "payload": to_hex(&response.payload),
            "implied": implied,
        })
    );
    Ok(0)
}

/// Parse a long poll command byte such as `4D` or `0x4D`.
pub fn parse_code(s: &str) -> Option<LongPollCode> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16)
        .ok()
        .and_then(LongPollCode::from_code)
}

fn load_history(path: &Path) -> Result<Vec<Transaction>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("invalid history {}", path.display()))
}

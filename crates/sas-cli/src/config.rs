//! # Config Subcommand
//!
//! `sasv config check <PATH>` parses a YAML validation configuration,
//! applies defaults and cross-field checks, and prints the effective
//! configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use sas_core::ValidationConfig;

/// Arguments for the `sasv config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration operations.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate a configuration file and print the effective values.
    Check {
        /// YAML configuration file.
        path: PathBuf,
    },
}

/// Execute the config subcommand.
pub fn run_config(args: &ConfigArgs) -> Result<u8> {
    match &args.command {
        ConfigCommand::Check { path } => match ValidationConfig::from_path(path) {
            Ok(config) => {
                print!("{}", serde_yaml::to_string(&config)?);
                Ok(0)
            }
            Err(e) => {
                println!("FAIL: {}: {e}", path.display());
                Ok(1)
            }
        },
    }
}

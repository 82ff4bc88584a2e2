//! # CLI Interface
//!
//! Defines the command-line argument structure for `tally-node` using
//! `clap` derive. Supports four subcommands: `demo`, `init`,
//! `check-config` and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Tally asset ledger node.
///
/// Runs asset issuance and transfer flows between parties, with a notary
/// guarding against double spends.
#[derive(Parser, Debug)]
#[command(
    name = "tally-node",
    about = "Tally asset ledger node",
    version,
    propagate_version = true
)]
pub struct TallyNodeCli {
    /// Log output format.
    #[arg(long, global = true, env = "TALLY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Tally node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an in-process network: issue an asset, transfer it, then try to
    /// spend it a second time.
    Demo(DemoArgs),
    /// Initialize a data directory and generate a fresh node key.
    Init(InitArgs),
    /// Load a configuration file and report what it defines.
    CheckConfig(CheckConfigArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Path to the network configuration file (TOML).
    ///
    /// When omitted, the bundled three-bank configuration is used.
    #[arg(long, short = 'c', env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Content of the asset to issue.
    #[arg(long, default_value = "hello")]
    pub content: String,

    /// Print the Prometheus metrics after the run.
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "TALLY_DATA_DIR", default_value = ".tally")]
    pub data_dir: PathBuf,

    /// Overwrite an existing node key.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `check-config` subcommand.
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Path to the configuration file (TOML).
    #[arg(long, short = 'c', env = "TALLY_CONFIG")]
    pub config: PathBuf,
}

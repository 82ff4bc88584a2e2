// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tally Node
//!
//! Entry point for the `tally-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and runs the selected subcommand.
//!
//! The binary supports four subcommands:
//!
//! - `demo`: run issue, transfer and a refused double spend over an
//!   in-process network
//! - `init`: initialize a data directory and generate a node key
//! - `check-config`: validate a configuration file
//! - `version`: print build version information

mod cli;
mod config;
mod demo;
mod logging;
mod metrics;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tally_contracts::whitelist::IssuerWhitelist;
use tally_protocol::crypto::Keypair;
use tally_protocol::identity::IdentityService;
use tokio::signal;

use cli::{Commands, TallyNodeCli};
use config::NodeConfig;
use metrics::NodeMetrics;

/// File name of the node key inside the data directory.
const NODE_KEY_FILE: &str = "node.key";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TallyNodeCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Demo(args) => run_demo(args).await,
        Commands::Init(args) => init_node(args),
        Commands::CheckConfig(args) => check_config(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs the demo network until it completes or the process is interrupted.
async fn run_demo(args: cli::DemoArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::demo()?,
    };
    let node_metrics = NodeMetrics::new();

    tracing::info!(
        notary = %config.node.notary,
        parties = config.node.parties.len(),
        "starting demo network"
    );

    tokio::select! {
        report = demo::run(&config, &args.content, &node_metrics) => {
            let report = report?;
            tracing::info!(
                issuance = %report.issuance,
                transfer = %report.transfer,
                "demo finished"
            );
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, abandoning demo");
            return Ok(());
        }
    }

    if args.metrics {
        let text = node_metrics
            .encode()
            .context("failed to encode metrics")?;
        print!("{}", text);
    }
    Ok(())
}

/// Initializes a new node data directory and generates a node keypair.
fn init_node(args: cli::InitArgs) -> Result<()> {
    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), "initializing node");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let key_path = data_dir.join(NODE_KEY_FILE);
    if key_path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to replace it",
            key_path.display()
        );
    }

    let keypair = Keypair::generate();
    let pubkey_hex = keypair.public_key().to_hex();
    std::fs::write(&key_path, hex::encode(keypair.secret_key_bytes()))
        .with_context(|| format!("failed to write node key to {}", key_path.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!(
        public_key = %pubkey_hex,
        key_path = %key_path.display(),
        "node keypair generated"
    );

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Node key       : {}", key_path.display());
    println!("  Public key     : {}", pubkey_hex);

    Ok(())
}

/// Loads a configuration file and prints what it defines.
fn check_config(args: cli::CheckConfigArgs) -> Result<()> {
    let config = NodeConfig::load(&args.config)?;
    let whitelist = IssuerWhitelist::from_config(&config.whitelists, Arc::new(IdentityService::new()))
        .context("invalid issuer whitelist")?;
    let parties = config.party_names()?;
    let flow_config = config.flow_config();

    println!("Configuration OK: {}", args.config.display());
    println!("  Notary          : {}", config.notary_name()?);
    println!("  Session timeout : {:?}", flow_config.session_timeout);
    println!("  Time window     : {:?}", flow_config.time_window);
    println!("  Parties         : {}", parties.len());
    for name in &parties {
        let issuer = if whitelist.names().contains(name) {
            " (issuer)"
        } else {
            ""
        };
        println!("    {}{}", name, issuer);
    }
    println!("  Whitelisted     : {}", whitelist.names().len());
    for name in whitelist.names() {
        println!("    {}", name);
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("tally-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", tally_protocol::config::PROTOCOL_VERSION);
    println!("wire       {}", tally_protocol::config::WIRE_PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

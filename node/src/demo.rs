//! # Demo Network
//!
//! Runs every configured party as a node in this process and drives one
//! asset through its life:
//!
//! 1. The first party self-issues an asset.
//! 2. It transfers the asset to the second party.
//! 3. It tries to transfer the same asset again, to the third party (or the
//!    second if there are only two). The notary must refuse.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tally_contracts::flows::{issue_asset, transfer_asset, AssetHub};
use tally_contracts::network::AssetNetwork;
use tally_protocol::crypto::SecureHash;
use tally_protocol::flow::FlowError;
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::metrics::NodeMetrics;

/// What the demo run established.
#[derive(Debug)]
pub struct DemoReport {
    pub issuance: SecureHash,
    pub transfer: SecureHash,
    /// The notary's answer to the second spend.
    pub double_spend: FlowError,
    /// Unspent assets the recipient holds at the end.
    pub recipient_holdings: usize,
}

/// Counts a flow in `metrics` around its execution.
async fn tracked<T>(
    metrics: &NodeMetrics,
    flow: impl Future<Output = Result<T, FlowError>>,
) -> Result<T, FlowError> {
    metrics.flows_started_total.inc();
    let started = Instant::now();
    let outcome = flow.await;
    metrics.record_outcome(&outcome, started.elapsed().as_secs_f64());
    outcome
}

async fn wait_for_recording(hub: &AssetHub, id: &SecureHash) -> Result<()> {
    for _ in 0..200 {
        if hub.storage.contains_transaction(id) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    bail!("{} never recorded transaction {}", hub.my_identity.name, id)
}

pub async fn run(config: &NodeConfig, content: &str, metrics: &NodeMetrics) -> Result<DemoReport> {
    let parties = config.party_names()?;
    if parties.len() < 2 {
        bail!("the demo needs at least two entries in node.parties");
    }

    let network = AssetNetwork::new(
        config.notary_name()?,
        &config.whitelists,
        config.flow_config(),
    )
    .context("failed to build the issuer whitelist")?;
    let hubs: Vec<Arc<AssetHub>> = parties
        .into_iter()
        .map(|name| network.start_node(name))
        .collect();

    let issuer = &hubs[0];
    let recipient = &hubs[1];
    let third = hubs.get(2).unwrap_or(recipient);
    if !network.whitelist().contains(&issuer.my_identity) {
        warn!(issuer = %issuer.my_identity.name, "first party is not a whitelisted issuer");
    }

    let issued = tracked(
        metrics,
        issue_asset(Arc::clone(issuer), content, issuer.my_identity.clone()),
    )
    .await
    .context("issuance failed")?;
    let asset = issued
        .tx
        .out_ref(0)
        .context("issuance produced no output")?;
    info!(tx_id = %issued.id(), asset = %asset.state.data, "asset issued");
    println!("issued      {}  {}", issued.id(), asset.state.data);

    let moved = tracked(
        metrics,
        transfer_asset(
            Arc::clone(issuer),
            asset.clone(),
            recipient.my_identity.clone(),
        ),
    )
    .await
    .context("transfer failed")?;
    wait_for_recording(recipient, &moved.id()).await?;
    let holdings = recipient.storage.unspent_owned_by(&recipient.my_identity);
    println!(
        "transferred {}  {} -> {}",
        moved.id(),
        asset.reference,
        recipient.my_identity.name
    );

    let second_spend = tracked(
        metrics,
        transfer_asset(Arc::clone(issuer), asset, third.my_identity.clone()),
    )
    .await;
    let double_spend = match second_spend {
        Err(error @ FlowError::NotaryConflict { .. }) => error,
        Err(other) => {
            return Err(other).context("double spend failed for the wrong reason");
        }
        Ok(stx) => bail!("double spend {} was accepted", stx.id()),
    };
    println!("refused     {}", double_spend);

    for hub in &hubs {
        println!(
            "{:<40} transactions={} owned={}",
            hub.my_identity.name.to_string(),
            hub.storage.transaction_count(),
            hub.storage.unspent_owned_by(&hub.my_identity).len()
        );
    }

    Ok(DemoReport {
        issuance: issued.id(),
        transfer: moved.id(),
        double_spend,
        recipient_holdings: holdings.len(),
    })
}

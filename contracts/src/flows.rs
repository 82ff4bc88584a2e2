//! # Asset Flows
//!
//! The two workflows over [`AssetState`], each a [`SigningCoordinator`] on
//! the initiating node paired with a [`CounterSigner`] on the counterparty:
//!
//! | Flow | Initiator | Counterparty | Counterparty checks |
//! |------|-----------|--------------|---------------------|
//! | [`ISSUE_FLOW`] | future owner | issuer | [`IssuePolicy`] |
//! | [`TRANSFER_FLOW`] | current owner | new owner | [`TransferPolicy`] |
//!
//! A self-issue (issuer and owner are the same node) still runs the full
//! flow: the session is routed back to the node's own dispatcher.

use std::sync::Arc;

use tally_protocol::flow::{
    deny_unless, CounterSigner, FlowError, ServiceHub, SigningCoordinator, SigningPolicy,
};
use tally_protocol::identity::Party;
use tally_protocol::network::Node;
use tally_protocol::transaction::{SignedTransaction, StateAndRef, TransactionBuilder};
use tracing::info;

use crate::asset::{
    generate_create, generate_transfer, AssetCommand, AssetContract, AssetState,
    ASSET_CONTRACT_ID,
};
use crate::whitelist::IssuerWhitelist;

pub const ISSUE_FLOW: &str = "asset.issue";
pub const TRANSFER_FLOW: &str = "asset.transfer";

pub type AssetHub = ServiceHub<AssetState, AssetCommand>;
pub type AssetTransaction = SignedTransaction<AssetState, AssetCommand>;

/// Reasons a counterparty gives when refusing to sign.
pub mod reasons {
    pub const NOT_AN_ASSET: &str = "this must be an asset transaction";
    pub const RESPONDER_NOT_WHITELISTED: &str = "I must be a whitelisted node";
    pub const ISSUER_NOT_WHITELISTED: &str = "the asset must be issued by a whitelisted node";
    pub const ISSUER_NOT_RESPONDER: &str = "the issuer of an asset must be the issuing node";
    pub const OWNER_NOT_RESPONDER: &str = "the new owner of the asset must be the receiving node";
}

// ---------------------------------------------------------------------------
// Initiators
// ---------------------------------------------------------------------------

/// Asks `issuer` to issue `content` to this node.
///
/// Returns the notarised transaction, recorded by both nodes. Empty content
/// is refused before anything is assembled.
pub async fn issue_asset(
    hub: Arc<AssetHub>,
    content: &str,
    issuer: Party,
) -> Result<AssetTransaction, FlowError> {
    if content.is_empty() {
        return Err(FlowError::MalformedRequest(
            "asset content must not be empty".to_string(),
        ));
    }
    info!(issuer = %issuer.name, "requesting issuance");
    let builder = generate_create(content, &issuer, &hub.my_identity, hub.notary_identity());
    SigningCoordinator::new(hub, AssetContract, ISSUE_FLOW, issuer)
        .run(builder)
        .await
}

/// Transfers an asset this node owns to `new_owner`.
pub async fn transfer_asset(
    hub: Arc<AssetHub>,
    asset: StateAndRef<AssetState>,
    new_owner: Party,
) -> Result<AssetTransaction, FlowError> {
    if asset.state.data.owner != hub.my_identity {
        return Err(FlowError::MalformedRequest(format!(
            "asset {} is owned by {}, not by this node",
            asset.reference, asset.state.data.owner.name
        )));
    }
    info!(asset = %asset.reference, new_owner = %new_owner.name, "requesting transfer");
    let mut builder = TransactionBuilder::new(asset.state.notary.clone());
    generate_transfer(&mut builder, asset, &new_owner);
    SigningCoordinator::new(hub, AssetContract, TRANSFER_FLOW, new_owner)
        .run(builder)
        .await
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// The sole output, if the transaction has exactly one asset output.
fn sole_asset_output(stx: &AssetTransaction) -> Result<&AssetState, FlowError> {
    match stx.tx.outputs.as_slice() {
        [output] if output.contract == ASSET_CONTRACT_ID => Ok(&output.data),
        _ => Err(FlowError::AuthorizationDenied(
            reasons::NOT_AN_ASSET.to_string(),
        )),
    }
}

/// What an issuer checks before counter-signing an issuance.
pub struct IssuePolicy {
    whitelist: Arc<IssuerWhitelist>,
}

impl IssuePolicy {
    pub fn new(whitelist: Arc<IssuerWhitelist>) -> Self {
        Self { whitelist }
    }
}

impl SigningPolicy for IssuePolicy {
    type State = AssetState;
    type Command = AssetCommand;

    fn flow_name(&self) -> &'static str {
        ISSUE_FLOW
    }

    fn check(&self, hub: &AssetHub, stx: &AssetTransaction) -> Result<(), FlowError> {
        let output = sole_asset_output(stx)?;
        deny_unless(
            self.whitelist.contains(&hub.my_identity),
            reasons::RESPONDER_NOT_WHITELISTED,
        )?;
        deny_unless(
            self.whitelist.contains(&output.issuer),
            reasons::ISSUER_NOT_WHITELISTED,
        )?;
        deny_unless(output.issuer == hub.my_identity, reasons::ISSUER_NOT_RESPONDER)
    }
}

/// What a new owner checks before accepting a transfer.
pub struct TransferPolicy {
    whitelist: Arc<IssuerWhitelist>,
}

impl TransferPolicy {
    pub fn new(whitelist: Arc<IssuerWhitelist>) -> Self {
        Self { whitelist }
    }
}

impl SigningPolicy for TransferPolicy {
    type State = AssetState;
    type Command = AssetCommand;

    fn flow_name(&self) -> &'static str {
        TRANSFER_FLOW
    }

    fn check(&self, hub: &AssetHub, stx: &AssetTransaction) -> Result<(), FlowError> {
        let output = sole_asset_output(stx)?;
        deny_unless(
            self.whitelist.contains(&output.issuer),
            reasons::ISSUER_NOT_WHITELISTED,
        )?;
        deny_unless(output.owner == hub.my_identity, reasons::OWNER_NOT_RESPONDER)
    }
}

/// Registers the issue and transfer responders on `node`.
pub fn register_responders(node: &mut Node, hub: Arc<AssetHub>, whitelist: Arc<IssuerWhitelist>) {
    node.register_responder(Arc::new(CounterSigner::new(
        Arc::clone(&hub),
        IssuePolicy::new(Arc::clone(&whitelist)),
    )))
    .register_responder(Arc::new(CounterSigner::new(hub, TransferPolicy::new(whitelist))));
}

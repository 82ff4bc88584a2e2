//! Integration tests for the issue and transfer flows.
//!
//! Every test runs a small in-process network: an in-memory notary and a
//! handful of nodes answering the asset flows, with "Bank of Atul" and
//! "State Bank" whitelisted as issuers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tally_contracts::asset::{
    generate_create, generate_transfer, AssetContract, ASSET_CONTRACT_ID,
};
use tally_contracts::flows::{
    issue_asset, reasons, transfer_asset, AssetHub, AssetTransaction, ISSUE_FLOW, TRANSFER_FLOW,
};
use tally_contracts::network::AssetNetwork;
use tally_contracts::whitelist::WhitelistConfig;
use tally_protocol::config::FlowConfig;
use tally_protocol::crypto::Keypair;
use tally_protocol::flow::{FlowError, SigningCoordinator};
use tally_protocol::identity::PartyName;
use tally_protocol::notary::Notary;
use tally_protocol::transaction::{OwnableState, TimeWindow, TransactionBuilder};

const WHITELIST: &str = r#"
[[asset_issuers]]
organization = "Bank of Atul"
locality = "Delhi"
country = "IN"

[[asset_issuers]]
organization = "State Bank"
locality = "Mumbai"
country = "IN"
"#;

fn name(organisation: &str, locality: &str) -> PartyName {
    PartyName::new(organisation, locality, "IN").unwrap()
}

fn network(config: FlowConfig) -> AssetNetwork {
    let whitelist: WhitelistConfig = toml::from_str(WHITELIST).unwrap();
    AssetNetwork::new(name("Notary Service", "Pune"), &whitelist, config).unwrap()
}

fn bank(net: &AssetNetwork) -> Arc<AssetHub> {
    net.start_node(name("Bank of Atul", "Delhi"))
}

async fn eventually_recorded(hub: &AssetHub, stx: &AssetTransaction) {
    for _ in 0..100 {
        if hub.storage.contains_transaction(&stx.id()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} never recorded {}", hub.my_identity.name, stx.id());
}

// ---------------------------------------------------------------------------
// Issue and Transfer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn self_issue_then_transfer() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);
    let kotak = net.start_node(name("Kotak", "Mumbai"));

    let issued = issue_asset(Arc::clone(&bank), "hello", bank.my_identity.clone())
        .await
        .unwrap();
    issued.verify_required_signatures().unwrap();
    assert!(issued.is_signed_by(&net.notary().identity().owning_key));

    let owned = bank.storage.unspent_owned_by(&bank.my_identity);
    assert_eq!(owned.len(), 1);
    let asset = owned[0].clone();
    assert_eq!(asset.state.data.content, "hello");
    assert_eq!(asset.state.data.issuer, bank.my_identity);
    assert_eq!(asset.state.data.owner, bank.my_identity);
    assert_eq!(asset.state.contract, ASSET_CONTRACT_ID);

    let moved = transfer_asset(Arc::clone(&bank), asset.clone(), kotak.my_identity.clone())
        .await
        .unwrap();
    assert!(moved.is_signed_by(kotak.my_key()));
    assert!(bank.storage.is_consumed(&asset.reference));
    assert!(bank.storage.unspent_owned_by(&bank.my_identity).is_empty());
    assert_eq!(net.notary().consumed_by(&asset.reference), Some(moved.id()));

    eventually_recorded(&kotak, &moved).await;
    let received = kotak.storage.unspent_owned_by(&kotak.my_identity);
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].state.data,
        asset.state.data.with_new_owner(kotak.my_identity.clone())
    );
}

#[tokio::test]
async fn issue_from_another_node_is_stored_by_both() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);
    let kotak = net.start_node(name("Kotak", "Mumbai"));

    let issued = issue_asset(Arc::clone(&kotak), "bond #7", bank.my_identity.clone())
        .await
        .unwrap();

    assert!(kotak.storage.contains_transaction(&issued.id()));
    eventually_recorded(&bank, &issued).await;
    let owned = kotak.storage.unspent_owned_by(&kotak.my_identity);
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].state.data.issuer, bank.my_identity);
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn issuance_by_non_whitelisted_node_is_denied() {
    let net = network(FlowConfig::default());
    let kotak = net.start_node(name("Kotak", "Mumbai"));

    // The contract alone has no objection.
    let mut builder = generate_create(
        "hello",
        &kotak.my_identity,
        &kotak.my_identity,
        kotak.notary_identity(),
    );
    builder.set_time_window(TimeWindow::from_start_and_duration(
        Utc::now(),
        Duration::from_secs(10),
    ));
    builder.verify(&AssetContract).unwrap();

    let result = issue_asset(Arc::clone(&kotak), "hello", kotak.my_identity.clone()).await;
    assert_eq!(
        result.unwrap_err(),
        FlowError::AuthorizationDenied(reasons::RESPONDER_NOT_WHITELISTED.to_string())
    );
    assert_eq!(kotak.storage.transaction_count(), 0);
}

#[tokio::test]
async fn issuer_must_be_the_signing_node() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);
    let state_bank = net.start_node(name("State Bank", "Mumbai"));

    // Bank of Atul issues but asks State Bank to counter-sign.
    let builder = generate_create(
        "hello",
        &bank.my_identity,
        &bank.my_identity,
        bank.notary_identity(),
    );
    let result = SigningCoordinator::new(
        Arc::clone(&bank),
        AssetContract,
        ISSUE_FLOW,
        state_bank.my_identity.clone(),
    )
    .run(builder)
    .await;

    assert_eq!(
        result.unwrap_err(),
        FlowError::AuthorizationDenied(reasons::ISSUER_NOT_RESPONDER.to_string())
    );
}

#[tokio::test]
async fn transfer_counterparty_must_be_the_new_owner() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);
    let kotak = net.start_node(name("Kotak", "Mumbai"));
    let hdfc = net.start_node(name("HDFC", "Mumbai"));

    let issued = issue_asset(Arc::clone(&bank), "hello", bank.my_identity.clone())
        .await
        .unwrap();
    let asset = issued.tx.out_ref(0).unwrap();

    let mut builder = TransactionBuilder::new(asset.state.notary.clone());
    generate_transfer(&mut builder, asset.clone(), &kotak.my_identity);
    let result = SigningCoordinator::new(
        Arc::clone(&bank),
        AssetContract,
        TRANSFER_FLOW,
        hdfc.my_identity.clone(),
    )
    .run(builder)
    .await;

    assert_eq!(
        result.unwrap_err(),
        FlowError::AuthorizationDenied(reasons::OWNER_NOT_RESPONDER.to_string())
    );
    assert!(!bank.storage.is_consumed(&asset.reference));
}

#[tokio::test]
async fn transfer_of_someone_elses_asset_is_malformed() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);
    let kotak = net.start_node(name("Kotak", "Mumbai"));

    let issued = issue_asset(Arc::clone(&bank), "hello", bank.my_identity.clone())
        .await
        .unwrap();
    let asset = issued.tx.out_ref(0).unwrap();

    let result = transfer_asset(Arc::clone(&kotak), asset, kotak.my_identity.clone()).await;
    assert!(matches!(result, Err(FlowError::MalformedRequest(_))));
}

#[tokio::test]
async fn issue_of_empty_content_is_malformed() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);

    let result = issue_asset(Arc::clone(&bank), "", bank.my_identity.clone()).await;

    assert!(matches!(result, Err(FlowError::MalformedRequest(_))));
    assert_eq!(bank.storage.transaction_count(), 0);
    assert_eq!(net.notary().committed_count(), 0);
}

// ---------------------------------------------------------------------------
// Double Spend
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_of_one_asset_finalise_exactly_once() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);
    let kotak = net.start_node(name("Kotak", "Mumbai"));
    let hdfc = net.start_node(name("HDFC", "Mumbai"));

    let issued = issue_asset(Arc::clone(&bank), "hello", bank.my_identity.clone())
        .await
        .unwrap();
    let asset = issued.tx.out_ref(0).unwrap();

    let (to_kotak, to_hdfc) = futures::future::join(
        transfer_asset(Arc::clone(&bank), asset.clone(), kotak.my_identity.clone()),
        transfer_asset(Arc::clone(&bank), asset.clone(), hdfc.my_identity.clone()),
    )
    .await;

    let (winner, winning_node, loser) = match (to_kotak, to_hdfc) {
        (Ok(stx), Err(e)) => (stx, &kotak, e),
        (Err(e), Ok(stx)) => (stx, &hdfc, e),
        other => panic!("expected exactly one finalised transfer, got {:?}", other),
    };
    assert!(!loser.is_retryable());
    match loser {
        FlowError::NotaryConflict { conflicts } => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].state_ref, asset.reference);
            assert_eq!(conflicts[0].consuming_tx, winner.id());
        }
        other => panic!("expected NotaryConflict, got {:?}", other),
    }

    eventually_recorded(winning_node, &winner).await;
    let descendants = kotak.storage.unspent_owned_by(&kotak.my_identity).len()
        + hdfc.storage.unspent_owned_by(&hdfc.my_identity).len();
    assert_eq!(descendants, 1);
    assert_eq!(bank.storage.consumed_by(&asset.reference), Some(winner.id()));
}

// ---------------------------------------------------------------------------
// Session Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn silent_counterparty_times_out() {
    let net = network(FlowConfig::default().with_session_timeout(Duration::from_millis(100)));
    let bank = bank(&net);
    let silent = net.hub(name("Silent Partner", "Goa"), Keypair::generate());
    let _inbox = net.messaging().register(&silent.my_identity);

    let issued = issue_asset(Arc::clone(&bank), "hello", bank.my_identity.clone())
        .await
        .unwrap();
    let asset = issued.tx.out_ref(0).unwrap();

    let result = transfer_asset(Arc::clone(&bank), asset.clone(), silent.my_identity.clone()).await;
    match result {
        Err(e @ FlowError::SessionFailure(_)) => assert!(e.is_retryable()),
        other => panic!("expected SessionFailure, got {:?}", other),
    }
    assert!(!bank.storage.is_consumed(&asset.reference));
    assert_eq!(net.notary().consumed_by(&asset.reference), None);
}

#[tokio::test]
async fn unknown_flow_is_rejected_by_the_dispatcher() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);

    let builder = generate_create(
        "hello",
        &bank.my_identity,
        &bank.my_identity,
        bank.notary_identity(),
    );
    let result = SigningCoordinator::new(
        Arc::clone(&bank),
        AssetContract,
        "asset.unknown",
        bank.my_identity.clone(),
    )
    .run(builder)
    .await;

    match result {
        Err(FlowError::SessionFailure(reason)) => assert!(reason.contains("asset.unknown")),
        other => panic!("expected SessionFailure, got {:?}", other),
    }
    assert_eq!(bank.storage.transaction_count(), 0);
}

#[tokio::test]
async fn unregistered_counterparty_is_session_failure() {
    let net = network(FlowConfig::default());
    let bank = bank(&net);
    let ghost = net.hub(name("Ghost", "Delhi"), Keypair::generate());

    let issued = issue_asset(Arc::clone(&bank), "hello", bank.my_identity.clone())
        .await
        .unwrap();
    let result = transfer_asset(
        Arc::clone(&bank),
        issued.tx.out_ref(0).unwrap(),
        ghost.my_identity.clone(),
    )
    .await;
    assert!(matches!(result, Err(FlowError::SessionFailure(_))));
}

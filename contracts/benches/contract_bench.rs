// Asset contract benchmarks.
//
// Covers full verification of a single issuance and a single transfer, and
// how grouping scales when many independent lineages move in one
// transaction.

use std::time::Duration;

use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tally_contracts::asset::{
    generate_create, generate_transfer, AssetCommand, AssetContract, AssetState,
    ASSET_CONTRACT_ID,
};
use tally_protocol::crypto::Keypair;
use tally_protocol::identity::{Party, PartyName};
use tally_protocol::transaction::{StateAndRef, TimeWindow, TransactionBuilder};

fn party(organisation: &str) -> Party {
    Party::new(
        PartyName::new(organisation, "Delhi", "IN").expect("valid name"),
        Keypair::generate().public_key(),
    )
}

fn window() -> TimeWindow {
    TimeWindow::from_start_and_duration(Utc::now(), Duration::from_secs(10))
}

/// One issued asset per content string, all owned by the issuer.
fn issued(contents: &[String], issuer: &Party, notary: &Party) -> Vec<StateAndRef<AssetState>> {
    let mut builder = generate_create(contents[0].clone(), issuer, issuer, notary);
    for content in &contents[1..] {
        builder.add_output_state(
            AssetState::new(content.clone(), issuer.clone(), issuer.clone()),
            ASSET_CONTRACT_ID,
        );
    }
    builder.set_time_window(window());
    let wtx = builder.verify(&AssetContract).expect("valid issuance");
    (0..contents.len())
        .map(|i| wtx.out_ref(i).expect("output exists"))
        .collect()
}

fn bench_verify_create(c: &mut Criterion) {
    let issuer = party("Bank of Atul");
    let mut builder = generate_create("hello", &issuer, &issuer, &party("Notary"));
    builder.set_time_window(window());

    c.bench_function("asset/verify_create", |b| {
        b.iter(|| builder.verify(&AssetContract).expect("valid"));
    });
}

fn bench_verify_transfer(c: &mut Criterion) {
    let issuer = party("Bank of Atul");
    let notary = party("Notary");
    let asset = issued(&["hello".to_string()], &issuer, &notary).remove(0);
    let mut builder: TransactionBuilder<AssetState, AssetCommand> = TransactionBuilder::new(notary);
    generate_transfer(&mut builder, asset, &party("Kotak"));

    c.bench_function("asset/verify_transfer", |b| {
        b.iter(|| builder.verify(&AssetContract).expect("valid"));
    });
}

fn bench_verify_lineages(c: &mut Criterion) {
    let mut group = c.benchmark_group("asset/verify_transfer_lineages");
    let issuer = party("Bank of Atul");
    let notary = party("Notary");
    let new_owner = party("Kotak");

    for size in [1usize, 8, 64, 256] {
        let contents: Vec<String> = (0..size).map(|i| format!("asset #{}", i)).collect();
        let assets = issued(&contents, &issuer, &notary);

        let mut builder: TransactionBuilder<AssetState, AssetCommand> =
            TransactionBuilder::new(notary.clone());
        for asset in assets {
            generate_transfer(&mut builder, asset, &new_owner);
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &builder, |b, builder| {
            b.iter(|| builder.verify(&AssetContract).expect("valid"));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_verify_create,
    bench_verify_transfer,
    bench_verify_lineages,
);
criterion_main!(benches);

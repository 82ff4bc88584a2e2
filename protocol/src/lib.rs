// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tally Protocol Core Library
//!
//! The ledger platform underneath Tally. Parties own states; states change
//! hands only through transactions that every required signer has signed
//! and a notary has ordered. This crate knows nothing about what the states
//! mean. Domain crates bring a contract and a signing policy, and this crate
//! does the rest.
//!
//! ## Architecture
//!
//! - **crypto**: Ed25519 keys and signatures, SHA-256 content hashes.
//! - **identity**: Distinguished names, parties, the identity registry.
//! - **transaction**: States, commands, builder, signing, verification.
//! - **notary**: The uniqueness/timestamping interface and an in-memory notary.
//! - **network**: Flow sessions, message routing, the node dispatcher.
//! - **storage**: A node's recorded transactions and unspent states.
//! - **flow**: The signing coordinator and counter-signer state machines.
//! - **config**: Protocol constants and flow timing.
//!
//! ## Design Philosophy
//!
//! 1. Contracts are pure functions. No I/O, no clocks.
//! 2. One command per transaction. Ambiguity is a rejection, not a guess.
//! 3. Nothing is recorded before the notary signs.
//! 4. Every wait on a counterparty is bounded.

pub mod config;
pub mod crypto;
pub mod flow;
pub mod identity;
pub mod network;
pub mod notary;
pub mod storage;
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_utils;

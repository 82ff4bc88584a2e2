//! # Tally Asset Contracts
//!
//! The asset domain on top of the `tally-protocol` platform. Assets are
//! immutable records issued by a whitelisted party and passed from owner to
//! owner through two-party signed, notarised transactions:
//!
//! - **Asset**: the record, its contract and the transaction assemblers.
//! - **Whitelist**: the configured set of parties allowed to issue.
//! - **Flows**: issuance and transfer, with the checks each counterparty
//!   applies before signing.
//! - **Network**: an in-process network of nodes answering those flows.
//!
//! ## Design Principles
//!
//! 1. The contract is pure. Everything it needs is in the transaction.
//! 2. One command per transaction. Several asset lineages may share it.
//! 3. Authorization is the counterparty's call, not the contract's: a
//!    transaction can be valid and still refused.
//! 4. Nothing is recorded until the notary has accepted.

pub mod asset;
pub mod flows;
pub mod network;
pub mod whitelist;

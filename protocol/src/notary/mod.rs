//! # Notary
//!
//! The notary is the ledger's ordering service. It guarantees that every
//! state is consumed at most once and that transactions are committed inside
//! their time window. Everything else about a transaction (its contract
//! rules, its participants' signatures) is checked by the parties, not here.
//!
//! The node talks to its notary through the [`Notary`] trait. The in-process
//! [`InMemoryNotary`] implements the uniqueness contract with a single lock
//! around check-and-commit, which is all the tests and the demo network need.
//! A clustered notary would sit behind the same trait.

pub mod in_memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::hash::SecureHash;
use crate::identity::{Party, PartyName};
use crate::transaction::{StateRef, TimeWindow, TransactionSignature};

pub use in_memory::InMemoryNotary;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// What a party submits for notarisation.
///
/// The notary only needs the id, the consumed references and the time
/// window. It never sees state contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotarisationRequest {
    pub tx_id: SecureHash,
    pub inputs: Vec<StateRef>,
    pub time_window: Option<TimeWindow>,
    /// The notary the transaction names. Must be the one receiving it.
    pub notary: PartyName,
    pub requester: Party,
}

/// A successful notarisation: the notary's signature over the transaction id
/// and the instant it committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotarisationResponse {
    pub signature: TransactionSignature,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An input that was already consumed by another transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub state_ref: StateRef,
    pub consuming_tx: SecureHash,
}

/// Why the notary refused a transaction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotaryError {
    /// One or more inputs have been consumed by a different transaction.
    #[error("input(s) already consumed: {}", format_conflicts(.conflicts))]
    InputAlreadyConsumed { conflicts: Vec<Conflict> },

    /// The commit instant falls outside the transaction's time window.
    #[error("time window {window} does not contain notarisation time {now}")]
    TimeWindowViolated {
        window: TimeWindow,
        now: DateTime<Utc>,
    },

    /// The request itself is not acceptable.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| format!("{} consumed by {}", c.state_ref, c.consuming_tx))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Notary trait
// ---------------------------------------------------------------------------

/// Uniqueness and timestamping service.
#[async_trait]
pub trait Notary: Send + Sync {
    /// The notary's well-known identity. Transactions name it by this.
    fn identity(&self) -> &Party;

    /// Commits the request's inputs as consumed by `request.tx_id`, or
    /// explains why it cannot.
    async fn notarise(
        &self,
        request: NotarisationRequest,
    ) -> Result<NotarisationResponse, NotaryError>;
}

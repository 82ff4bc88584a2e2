//! Core type definitions for ledger transactions.
//!
//! These types form the vocabulary of every transaction: the states being
//! consumed and produced, the references that point at them, the commands
//! that say what kind of transition is happening, and the time window the
//! notary enforces.
//!
//! The platform is generic over the state type `S` and command type `C`.
//! Domain crates plug their own types in by implementing [`ContractState`]
//! and (implicitly) [`CommandData`].

use std::fmt;
use std::fmt::Debug;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::hash::SecureHash;
use crate::crypto::keys::PublicKey;
use crate::identity::Party;

// ---------------------------------------------------------------------------
// State and command traits
// ---------------------------------------------------------------------------

/// A piece of ledger data governed by a contract.
pub trait ContractState:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The parties that should store transactions touching this state.
    fn participants(&self) -> Vec<Party>;
}

/// A state with a single owner whose signature is required to consume it.
pub trait OwnableState: ContractState {
    fn owner(&self) -> &Party;

    /// Returns a copy of this state owned by `new_owner`.
    fn with_new_owner(&self, new_owner: Party) -> Self;
}

/// Marker for command payloads. Blanket-implemented for every type with the
/// right bounds.
pub trait CommandData:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> CommandData for T where
    T: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

// ---------------------------------------------------------------------------
// StateRef / TransactionState / StateAndRef
// ---------------------------------------------------------------------------

/// Points at output `index` of the transaction with id `txhash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateRef {
    pub txhash: SecureHash,
    pub index: u32,
}

impl StateRef {
    pub fn new(txhash: SecureHash, index: u32) -> Self {
        Self { txhash, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.txhash, self.index)
    }
}

/// An output state tagged with the contract that governs it and the notary
/// that will order its consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "S: Serialize", deserialize = "S: DeserializeOwned"))]
pub struct TransactionState<S> {
    pub data: S,
    pub contract: String,
    pub notary: Party,
}

/// A transaction state together with the reference that locates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "S: Serialize", deserialize = "S: DeserializeOwned"))]
pub struct StateAndRef<S> {
    pub state: TransactionState<S>,
    pub reference: StateRef,
}

impl<S> StateAndRef<S> {
    /// Shorthand for `self.state.data`.
    pub fn data(&self) -> &S {
        &self.state.data
    }
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// A half-open validity interval `[from, until)`. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn between(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
        }
    }

    pub fn from_only(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }

    pub fn until_only(until: DateTime<Utc>) -> Self {
        Self {
            from: None,
            until: Some(until),
        }
    }

    /// `[start, start + duration)`.
    pub fn from_start_and_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        let until = start
            .checked_add_signed(chrono::Duration::milliseconds(millis))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::between(start, until)
    }

    /// The upper bound, if any. Issuances require one.
    pub fn until_time(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// True when `instant` falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let after_start = self.from.map_or(true, |from| instant >= from);
        let before_end = self.until.map_or(true, |until| instant < until);
        after_start && before_end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self
            .from
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-inf".to_string());
        let until = self
            .until
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "+inf".to_string());
        write!(f, "[{}, {})", from, until)
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A command payload plus the keys whose signatures it requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "C: Serialize", deserialize = "C: DeserializeOwned"))]
pub struct Command<C> {
    pub value: C,
    pub signers: Vec<PublicKey>,
}

impl<C> Command<C> {
    pub fn new(value: C, signers: Vec<PublicKey>) -> Self {
        Self { value, signers }
    }
}

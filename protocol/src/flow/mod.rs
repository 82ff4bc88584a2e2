//! # Flow Module
//!
//! Flows are the workflows that move a transaction from "proposed by one
//! party" to "final on everyone's ledger". Each flow instance runs as its own
//! tokio task and only suspends at session boundaries.
//!
//! ## Architecture
//!
//! ```text
//! error.rs       FlowError and the mapping from lower-level errors
//! hub.rs         ServiceHub: identity, key, storage, notary, messaging
//! messages.rs    SigningMessage exchanged between the two sides
//! coordinator.rs SigningCoordinator, the initiating state machine
//! signer.rs      CounterSigner + SigningPolicy, the responding side
//! ```
//!
//! Domain crates supply a [`crate::transaction::Contract`] for the
//! coordinator and a [`SigningPolicy`] for the counter-signer. The
//! mechanics (signing, session handling, notarisation, recording) live
//! here once.

pub mod coordinator;
pub mod error;
pub mod hub;
pub mod messages;
pub mod signer;

pub use coordinator::{CoordinatorPhase, CoordinatorState, SigningCoordinator};
pub use error::FlowError;
pub use hub::ServiceHub;
pub use messages::{Rejection, SigningMessage};
pub use signer::{deny_unless, CounterSigner, ResponderState, SigningPolicy};

//! # Storage Module
//!
//! What a node remembers: every finalised transaction it took part in, and
//! an index of the states those transactions left unspent.
//!
//! ## Architecture
//!
//! ```text
//! vault.rs  NodeStorage: transaction map + unspent/consumed indices
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Idempotent recording.** A party can be both initiator and responder
//!    of the same flow (self-issuance), so the same transaction may arrive
//!    twice. Recording it again is a no-op.
//!
//! 2. **`DashMap` for transactions, `RwLock<BTreeMap>` for the unspent
//!    index.** Lookups by id are the hot path; the unspent index is scanned
//!    in key order and updated as one unit per transaction.
//!
//! 3. **Only finalised transactions.** Flows record after the notary has
//!    signed, never before.

pub mod vault;

pub use vault::NodeStorage;

//! # Transaction Module
//!
//! Construction, signing, and verification of ledger transactions. Every
//! transition of a state (issuing it, handing it to a new owner) is
//! represented as a [`WireTransaction`] and travels between parties as a
//! [`SignedTransaction`].
//!
//! ## Architecture
//!
//! ```text
//! types.rs        States, references, commands, time windows
//! builder.rs      WireTransaction and the TransactionBuilder that produces it
//! signing.rs      Signatures over transaction ids, SignedTransaction
//! verification.rs Structural checks, the Contract trait, verify_transaction
//! group.rs        Partitioning inputs/outputs into groups for contracts
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: Use [`TransactionBuilder`] to assemble inputs, outputs and a command.
//! 2. **Verify**: Run [`verify_transaction`] against the governing [`Contract`].
//! 3. **Sign**: Each required signer signs the id ([`sign_id`]).
//! 4. **Notarise**: The notary checks input uniqueness and adds its signature.
//! 5. **Record**: Every participant stores the final transaction.
//!
//! ## Design Decisions
//!
//! - Transaction ids are `double_sha256` of the `bincode` encoding of the
//!   body, excluding signatures, so the id is stable across signing.
//! - Exactly one command per transaction. The platform allows more on the
//!   wire; contracts reject anything else.

pub mod builder;
pub mod group;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{TransactionBuilder, WireTransaction};
pub use group::{group_states, InOutGroup};
pub use signing::{sign_id, SignedTransaction, TransactionSignature};
pub use types::{
    Command, CommandData, ContractState, OwnableState, StateAndRef, StateRef, TimeWindow,
    TransactionState,
};
pub use verification::{
    require_that, verify_transaction, Contract, ContractViolation, TransactionError,
};

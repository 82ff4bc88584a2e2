//! # Cryptographic Primitives
//!
//! Everything security-related in the ledger flows through here: party keys,
//! transaction signatures, and the content hashes that name transactions.
//!
//! - **Ed25519** for signatures (`ed25519-dalek`).
//! - **SHA-256** for transaction ids (`sha2`), applied twice.
//!
//! Everything here is a thin, type-safe wrapper around audited
//! implementations.

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, sha256, SecureHash};
pub use keys::{KeyError, Keypair, PublicKey, Signature};

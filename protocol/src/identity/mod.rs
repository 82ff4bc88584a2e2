//! # Identity Module
//!
//! Well-known identities on the ledger. Every participant (parties and
//! notaries alike) is a [`Party`]: an X.500-style distinguished name bound to
//! an Ed25519 owning key.
//!
//! The identity stack is layered:
//!
//! 1. **Keypair**: Raw Ed25519 key material, see [`crate::crypto::keys`].
//! 2. **PartyName**: `CN=…, O=…, L=…, C=…`. This is what configuration files
//!    and operators refer to.
//! 3. **Party**: name plus owning key. This is what states, commands and
//!    signatures refer to.
//! 4. **IdentityService**: the node's registry of well-known parties, used
//!    to resolve configured names into keys.

pub mod party;
pub mod registry;

pub use party::{IdentityError, Party, PartyName};
pub use registry::IdentityService;

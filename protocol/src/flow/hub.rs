//! The service hub: everything a flow running on a node may touch.

use std::fmt;
use std::sync::Arc;

use crate::config::FlowConfig;
use crate::crypto::hash::SecureHash;
use crate::crypto::keys::{Keypair, PublicKey};
use crate::identity::{IdentityService, Party};
use crate::network::MessagingService;
use crate::notary::Notary;
use crate::storage::NodeStorage;
use crate::transaction::{sign_id, TransactionSignature};

/// Per-node services handed to every flow.
///
/// The node's keypair is private to the hub. Flows ask the hub to sign
/// rather than holding key material themselves.
pub struct ServiceHub<S, C> {
    pub my_identity: Party,
    keypair: Keypair,
    pub identity_service: Arc<IdentityService>,
    pub storage: Arc<NodeStorage<S, C>>,
    pub notary: Arc<dyn Notary>,
    pub messaging: Arc<MessagingService>,
    pub config: FlowConfig,
}

impl<S, C> fmt::Debug for ServiceHub<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHub")
            .field("my_identity", &self.my_identity.name)
            .field("notary", &self.notary.identity().name)
            .field("config", &self.config)
            .finish()
    }
}

impl<S, C> ServiceHub<S, C> {
    /// `keypair` must own `my_identity`.
    pub fn new(
        my_identity: Party,
        keypair: Keypair,
        identity_service: Arc<IdentityService>,
        storage: Arc<NodeStorage<S, C>>,
        notary: Arc<dyn Notary>,
        messaging: Arc<MessagingService>,
        config: FlowConfig,
    ) -> Self {
        Self {
            my_identity,
            keypair,
            identity_service,
            storage,
            notary,
            messaging,
            config,
        }
    }

    pub fn my_key(&self) -> &PublicKey {
        &self.my_identity.owning_key
    }

    /// The notary this node submits to.
    pub fn notary_identity(&self) -> &Party {
        self.notary.identity()
    }

    /// Signs a transaction id with the node's key.
    pub fn sign(&self, id: &SecureHash) -> TransactionSignature {
        sign_id(&self.keypair, id)
    }
}

//! In-process asset network: one notary, one message router, one identity
//! service and any number of nodes answering the asset flows.

use std::sync::Arc;

use tally_protocol::config::FlowConfig;
use tally_protocol::crypto::Keypair;
use tally_protocol::identity::{IdentityService, Party, PartyName};
use tally_protocol::network::{MessagingService, Node};
use tally_protocol::notary::{InMemoryNotary, Notary};
use tally_protocol::storage::NodeStorage;
use tracing::info;

use crate::flows::{register_responders, AssetHub};
use crate::whitelist::{IssuerWhitelist, WhitelistConfig, WhitelistError};

#[derive(Debug)]
pub struct AssetNetwork {
    notary: Arc<InMemoryNotary>,
    messaging: Arc<MessagingService>,
    identities: Arc<IdentityService>,
    whitelist: Arc<IssuerWhitelist>,
    config: FlowConfig,
}

impl AssetNetwork {
    /// Creates the notary under `notary_name` with a fresh key.
    pub fn new(
        notary_name: PartyName,
        whitelist: &WhitelistConfig,
        config: FlowConfig,
    ) -> Result<Self, WhitelistError> {
        let identities = Arc::new(IdentityService::new());
        let whitelist = Arc::new(IssuerWhitelist::from_config(
            whitelist,
            Arc::clone(&identities),
        )?);

        let notary_key = Keypair::generate();
        let notary_party = Party::new(notary_name, notary_key.public_key());
        identities.register(notary_party.clone());
        info!(notary = %notary_party.name, "notary started");

        Ok(Self {
            notary: Arc::new(InMemoryNotary::new(notary_party, notary_key)),
            messaging: Arc::new(MessagingService::new()),
            identities,
            whitelist,
            config,
        })
    }

    pub fn notary(&self) -> &Arc<InMemoryNotary> {
        &self.notary
    }

    pub fn messaging(&self) -> &Arc<MessagingService> {
        &self.messaging
    }

    pub fn identities(&self) -> &Arc<IdentityService> {
        &self.identities
    }

    pub fn whitelist(&self) -> &Arc<IssuerWhitelist> {
        &self.whitelist
    }

    /// A registered party's services without a dispatcher behind its inbox.
    /// Sessions opened to it are never answered.
    pub fn hub(&self, name: PartyName, keypair: Keypair) -> Arc<AssetHub> {
        let party = Party::new(name, keypair.public_key());
        self.identities.register(party.clone());
        Arc::new(AssetHub::new(
            party,
            keypair,
            Arc::clone(&self.identities),
            Arc::new(NodeStorage::new()),
            Arc::clone(&self.notary) as Arc<dyn Notary>,
            Arc::clone(&self.messaging),
            self.config,
        ))
    }

    /// Starts a node answering the asset flows under `name` with a fresh key.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start_node(&self, name: PartyName) -> Arc<AssetHub> {
        self.start_node_with_key(name, Keypair::generate())
    }

    pub fn start_node_with_key(&self, name: PartyName, keypair: Keypair) -> Arc<AssetHub> {
        let hub = self.hub(name, keypair);
        let mut node = Node::new(hub.my_identity.clone());
        register_responders(&mut node, Arc::clone(&hub), Arc::clone(&self.whitelist));
        node.spawn(self.messaging.register(&hub.my_identity));
        info!(party = %hub.my_identity.name, "node started");
        hub
    }
}

//! # Identity Service
//!
//! The node's registry of well-known parties. Configuration refers to
//! parties by name; states and commands refer to them by key. This service
//! maps between the two.

use dashmap::DashMap;
use tracing::debug;

use super::party::{Party, PartyName};
use crate::crypto::keys::PublicKey;

/// Concurrent name/key registry of well-known parties.
#[derive(Debug, Default)]
pub struct IdentityService {
    by_name: DashMap<PartyName, Party>,
    by_key: DashMap<PublicKey, Party>,
}

impl IdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a party. Re-registering a name replaces the earlier entry.
    pub fn register(&self, party: Party) {
        debug!(party = %party.name, "registering well-known party");
        if let Some(previous) = self.by_name.insert(party.name.clone(), party.clone()) {
            if previous.owning_key != party.owning_key {
                self.by_key.remove(&previous.owning_key);
            }
        }
        self.by_key.insert(party.owning_key.clone(), party);
    }

    /// Looks up a party by its distinguished name.
    pub fn well_known_party_from_name(&self, name: &PartyName) -> Option<Party> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Looks up a party by its owning key.
    pub fn party_from_key(&self, key: &PublicKey) -> Option<Party> {
        self.by_key.get(key).map(|entry| entry.value().clone())
    }

    /// Number of registered parties.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;

    fn party(org: &str) -> Party {
        Party::new(
            PartyName::new(org, "London", "GB").unwrap(),
            Keypair::generate().public_key(),
        )
    }

    #[test]
    fn test_lookup_by_name_and_key() {
        let service = IdentityService::new();
        let alice = party("Alice Corp");
        service.register(alice.clone());

        assert_eq!(service.well_known_party_from_name(&alice.name), Some(alice.clone()));
        assert_eq!(service.party_from_key(&alice.owning_key), Some(alice));
        assert_eq!(service.len(), 1);
    }

    #[test]
    fn test_unknown_party() {
        let service = IdentityService::new();
        let name = PartyName::new("Nobody", "Nowhere", "ZZ").unwrap();
        assert!(service.well_known_party_from_name(&name).is_none());
        assert!(service.is_empty());
    }

    #[test]
    fn test_reregister_replaces_key() {
        let service = IdentityService::new();
        let old = party("Rotating Ltd");
        let new = Party::new(old.name.clone(), Keypair::generate().public_key());
        service.register(old.clone());
        service.register(new.clone());

        assert_eq!(service.well_known_party_from_name(&old.name), Some(new.clone()));
        assert!(service.party_from_key(&old.owning_key).is_none());
        assert_eq!(service.party_from_key(&new.owning_key), Some(new));
    }
}

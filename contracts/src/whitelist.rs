//! # Issuer Whitelist
//!
//! The set of parties allowed to issue new assets. Built once at startup
//! from configuration and shared by `Arc` into the responders that consult
//! it. Entries are names, resolved to parties through the identity service
//! on every lookup, so a party that registers after startup is honoured.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tally_protocol::identity::{IdentityError, IdentityService, Party, PartyName};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WhitelistError {
    /// A configured entry does not form a valid party name.
    #[error("invalid whitelist entry #{index}: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: IdentityError,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One `[[whitelists.asset_issuers]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub organization: String,
    pub locality: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
}

impl WhitelistEntry {
    pub fn to_party_name(&self) -> Result<PartyName, IdentityError> {
        let name = PartyName::new(&self.organization, &self.locality, &self.country)?;
        Ok(match &self.common_name {
            Some(common_name) => name.with_common_name(common_name),
            None => name,
        })
    }
}

/// The `[whitelists]` section of a node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub asset_issuers: Vec<WhitelistEntry>,
}

// ---------------------------------------------------------------------------
// IssuerWhitelist
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct IssuerWhitelist {
    names: Vec<PartyName>,
    identities: Arc<IdentityService>,
}

impl IssuerWhitelist {
    pub fn new(names: Vec<PartyName>, identities: Arc<IdentityService>) -> Self {
        Self { names, identities }
    }

    /// Validates every configured entry.
    pub fn from_config(
        config: &WhitelistConfig,
        identities: Arc<IdentityService>,
    ) -> Result<Self, WhitelistError> {
        let names = config
            .asset_issuers
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .to_party_name()
                    .map_err(|source| WhitelistError::InvalidEntry { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(names, identities))
    }

    /// True when `party` is the well-known party registered under one of the
    /// whitelisted names. A name with no registered party matches nobody.
    pub fn contains(&self, party: &Party) -> bool {
        self.names.iter().any(|name| {
            self.identities
                .well_known_party_from_name(name)
                .is_some_and(|known| &known == party)
        })
    }

    pub fn names(&self) -> &[PartyName] {
        &self.names
    }

    /// Whitelisted names the identity service does not know yet.
    pub fn unresolved(&self) -> Vec<&PartyName> {
        self.names
            .iter()
            .filter(|name| self.identities.well_known_party_from_name(name).is_none())
            .collect()
    }
}

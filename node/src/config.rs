//! # Node Configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [node]
//! notary = "O=Turicum Notary Service, L=Zurich, C=CH"
//! session_timeout_secs = 30
//! time_window_secs = 10
//!
//! [[node.parties]]
//! name = "O=Bank of Atul, L=Delhi, C=IN"
//!
//! [[whitelists.asset_issuers]]
//! organization = "Bank of Atul"
//! locality = "Delhi"
//! country = "IN"
//! ```
//!
//! Party names are validated when the file is loaded, not when first used.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tally_contracts::whitelist::WhitelistConfig;
use tally_protocol::config::{FlowConfig, SESSION_TIMEOUT, TIME_WINDOW};
use tally_protocol::identity::PartyName;

/// The demo network shipped with the binary.
pub const DEMO_CONFIG: &str = include_str!("../config/demo.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node: NodeSection,
    #[serde(default)]
    pub whitelists: WhitelistConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSection {
    /// Distinguished name of the notary.
    pub notary: String,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    #[serde(default = "default_time_window_secs")]
    pub time_window_secs: u64,
    #[serde(default)]
    pub parties: Vec<PartyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyEntry {
    pub name: String,
}

fn default_session_timeout_secs() -> u64 {
    SESSION_TIMEOUT.as_secs()
}

fn default_time_window_secs() -> u64 {
    TIME_WINDOW.as_secs()
}

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: NodeConfig = toml::from_str(text).context("failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// The bundled demo configuration.
    pub fn demo() -> Result<Self> {
        Self::from_toml_str(DEMO_CONFIG).context("bundled demo config is invalid")
    }

    fn validate(&self) -> Result<()> {
        self.notary_name()?;
        self.party_names()?;
        for (index, entry) in self.whitelists.asset_issuers.iter().enumerate() {
            entry
                .to_party_name()
                .with_context(|| format!("whitelists.asset_issuers[{}] is invalid", index))?;
        }
        if self.node.session_timeout_secs == 0 {
            bail!("node.session_timeout_secs must be positive");
        }
        if self.node.time_window_secs == 0 {
            bail!("node.time_window_secs must be positive");
        }
        Ok(())
    }

    pub fn notary_name(&self) -> Result<PartyName> {
        self.node
            .notary
            .parse()
            .with_context(|| format!("node.notary '{}' is not a valid party name", self.node.notary))
    }

    /// Party names in configuration order. Duplicates are rejected.
    pub fn party_names(&self) -> Result<Vec<PartyName>> {
        let mut names: Vec<PartyName> = Vec::with_capacity(self.node.parties.len());
        for (index, entry) in self.node.parties.iter().enumerate() {
            let name: PartyName = entry
                .name
                .parse()
                .with_context(|| format!("node.parties[{}] '{}' is invalid", index, entry.name))?;
            if names.contains(&name) {
                bail!("node.parties[{}] '{}' is listed twice", index, entry.name);
            }
            names.push(name);
        }
        Ok(names)
    }

    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig::default()
            .with_session_timeout(Duration::from_secs(self.node.session_timeout_secs))
            .with_time_window(Duration::from_secs(self.node.time_window_secs))
    }
}

//! # Parties and Distinguished Names
//!
//! A [`PartyName`] is rendered and parsed in the familiar X.500 form:
//!
//! ```text
//! CN=Settlement Desk, O=Bank of Atul, L=Delhi, C=IN
//! ```
//!
//! The common name is optional. Organisation and locality must be non-empty
//! and the country is a two-letter upper-case code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::keys::PublicKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building or parsing identities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// An attribute is missing or empty.
    #[error("missing attribute {0} in party name")]
    MissingAttribute(&'static str),

    /// The country attribute is not a two-letter upper-case code.
    #[error("invalid country code '{0}': expected two upper-case letters")]
    InvalidCountry(String),

    /// A component of the name could not be parsed.
    #[error("invalid party name component '{0}'")]
    InvalidComponent(String),

    /// The same attribute appeared twice.
    #[error("duplicate attribute {0} in party name")]
    DuplicateAttribute(String),
}

// ---------------------------------------------------------------------------
// PartyName
// ---------------------------------------------------------------------------

/// An X.500-style distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyName {
    pub common_name: Option<String>,
    pub organisation: String,
    pub locality: String,
    pub country: String,
}

impl PartyName {
    /// Builds and validates a name without a common name.
    pub fn new(
        organisation: impl Into<String>,
        locality: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let name = Self {
            common_name: None,
            organisation: organisation.into(),
            locality: locality.into(),
            country: country.into(),
        };
        name.validate()?;
        Ok(name)
    }

    /// Returns a copy carrying the given common name.
    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = Some(common_name.into());
        self
    }

    /// Checks the attribute constraints.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.organisation.trim().is_empty() {
            return Err(IdentityError::MissingAttribute("O"));
        }
        if self.locality.trim().is_empty() {
            return Err(IdentityError::MissingAttribute("L"));
        }
        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(IdentityError::InvalidCountry(self.country.clone()));
        }
        if let Some(cn) = &self.common_name {
            if cn.trim().is_empty() {
                return Err(IdentityError::MissingAttribute("CN"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cn) = &self.common_name {
            write!(f, "CN={}, ", cn)?;
        }
        write!(
            f,
            "O={}, L={}, C={}",
            self.organisation, self.locality, self.country
        )
    }
}

impl FromStr for PartyName {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut common_name = None;
        let mut organisation = None;
        let mut locality = None;
        let mut country = None;

        for component in s.split(',') {
            let component = component.trim();
            let (key, value) = component
                .split_once('=')
                .ok_or_else(|| IdentityError::InvalidComponent(component.to_string()))?;
            let slot = match key.trim() {
                "CN" => &mut common_name,
                "O" => &mut organisation,
                "L" => &mut locality,
                "C" => &mut country,
                other => return Err(IdentityError::InvalidComponent(other.to_string())),
            };
            if slot.is_some() {
                return Err(IdentityError::DuplicateAttribute(key.trim().to_string()));
            }
            *slot = Some(value.trim().to_string());
        }

        let name = Self {
            common_name,
            organisation: organisation.ok_or(IdentityError::MissingAttribute("O"))?,
            locality: locality.ok_or(IdentityError::MissingAttribute("L"))?,
            country: country.ok_or(IdentityError::MissingAttribute("C"))?,
        };
        name.validate()?;
        Ok(name)
    }
}

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

/// A well-known identity: a distinguished name and the key that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Party {
    pub name: PartyName,
    pub owning_key: PublicKey,
}

impl Party {
    pub fn new(name: PartyName, owning_key: PublicKey) -> Self {
        Self { name, owning_key }
    }

    /// The placeholder identity used to erase ownership from a state before
    /// comparing it. Its key is all zeroes, so it can never sign anything.
    pub fn null() -> Self {
        Self {
            name: PartyName {
                common_name: None,
                organisation: "Null".to_string(),
                locality: "Null".to_string(),
                country: "ZZ".to_string(),
            },
            owning_key: PublicKey::null(),
        }
    }

    /// True for [`Party::null`].
    pub fn is_null(&self) -> bool {
        self.owning_key == PublicKey::null()
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

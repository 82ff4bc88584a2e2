//! Messages exchanged between a signing coordinator and a counter-signer.
//!
//! ```text
//! initiator                         responder
//!     | -- Proposal(stx) ------------> |
//!     | <------------ Signature(sig) -- |   or Rejected(rejection)
//!     | -- Finalised(stx) -----------> |   or Aborted(reason)
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::FlowError;
use crate::transaction::{ContractViolation, SignedTransaction, TransactionSignature};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, C: Serialize",
    deserialize = "S: DeserializeOwned, C: DeserializeOwned"
))]
pub enum SigningMessage<S, C> {
    /// A transaction signed by the initiator, asking for a counter-signature.
    Proposal(SignedTransaction<S, C>),
    /// The responder's signature over the proposal's id.
    Signature(TransactionSignature),
    /// The responder will not sign.
    Rejected(Rejection),
    /// The notarised transaction, for the responder to record.
    Finalised(SignedTransaction<S, C>),
    /// The initiator gave up after the responder signed.
    Aborted(String),
}

impl<S, C> SigningMessage<S, C> {
    /// Variant name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SigningMessage::Proposal(_) => "proposal",
            SigningMessage::Signature(_) => "signature",
            SigningMessage::Rejected(_) => "rejected",
            SigningMessage::Finalised(_) => "finalised",
            SigningMessage::Aborted(_) => "aborted",
        }
    }
}

/// Why a responder refused, with the kind of failure it saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    Unauthorized(String),
    Malformed(String),
    /// Carries the violated rule.
    ContractViolation(String),
}

impl From<&FlowError> for Rejection {
    fn from(error: &FlowError) -> Self {
        match error {
            FlowError::AuthorizationDenied(reason) => Rejection::Unauthorized(reason.clone()),
            FlowError::MalformedRequest(reason) => Rejection::Malformed(reason.clone()),
            FlowError::ContractViolation(violation) => {
                Rejection::ContractViolation(violation.rule.clone())
            }
            other => Rejection::Unauthorized(other.to_string()),
        }
    }
}

impl From<Rejection> for FlowError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthorized(reason) => FlowError::AuthorizationDenied(reason),
            Rejection::Malformed(reason) => FlowError::MalformedRequest(reason),
            Rejection::ContractViolation(rule) => {
                FlowError::ContractViolation(ContractViolation::new(rule))
            }
        }
    }
}

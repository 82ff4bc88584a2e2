//! Flow error kinds.
//!
//! Every module below the flow layer has its own error enum. This is where
//! they are sorted into the handful of outcomes a flow's caller cares
//! about. Only session failures are worth retrying. Everything else is a
//! verdict.

use thiserror::Error;

use crate::network::SessionError;
use crate::notary::{Conflict, NotaryError};
use crate::transaction::{ContractViolation, TransactionError};

/// Why a flow did not reach finality.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    /// The proposed transaction breaks a contract rule. Carries the rule.
    #[error(transparent)]
    ContractViolation(ContractViolation),

    /// The counterparty refused to sign, or a required signature is absent
    /// or invalid.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The notary saw an input consumed by another transaction.
    #[error("notary conflict: {}", format_conflicts(.conflicts))]
    NotaryConflict { conflicts: Vec<Conflict> },

    /// The notary refused for a reason other than a conflict.
    #[error("notary rejected transaction: {0}")]
    NotaryRejected(String),

    /// The session broke, timed out, or was refused.
    #[error("session failure: {0}")]
    SessionFailure(String),

    /// The request could not be understood or makes no sense.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl FlowError {
    /// True only for transient transport failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::SessionFailure(_))
    }
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.state_ref.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ContractViolation> for FlowError {
    fn from(violation: ContractViolation) -> Self {
        FlowError::ContractViolation(violation)
    }
}

impl From<TransactionError> for FlowError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Contract(violation) => FlowError::ContractViolation(violation),
            TransactionError::InvalidSignature { .. } | TransactionError::SignaturesMissing { .. } => {
                FlowError::AuthorizationDenied(err.to_string())
            }
            other => FlowError::MalformedRequest(other.to_string()),
        }
    }
}

impl From<NotaryError> for FlowError {
    fn from(err: NotaryError) -> Self {
        match err {
            NotaryError::InputAlreadyConsumed { conflicts } => FlowError::NotaryConflict { conflicts },
            other => FlowError::NotaryRejected(other.to_string()),
        }
    }
}

impl From<SessionError> for FlowError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Serialization(reason) => FlowError::MalformedRequest(reason),
            SessionError::Rejected(reason) => {
                FlowError::SessionFailure(format!("counterparty rejected session: {}", reason))
            }
            other => FlowError::SessionFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::SecureHash;
    use crate::transaction::StateRef;
    use std::time::Duration;

    #[test]
    fn test_contract_violation_is_verbatim() {
        let err: FlowError = ContractViolation::new("issuances must be timestamped").into();
        assert_eq!(err.to_string(), "failed requirement: issuances must be timestamped");
    }

    #[test]
    fn test_only_session_failures_retry() {
        assert!(FlowError::SessionFailure("timeout".into()).is_retryable());
        assert!(!FlowError::AuthorizationDenied("no".into()).is_retryable());
        assert!(!FlowError::NotaryConflict { conflicts: vec![] }.is_retryable());
        assert!(!FlowError::MalformedRequest("bad".into()).is_retryable());
    }

    #[test]
    fn test_notary_error_mapping() {
        let conflict = Conflict {
            state_ref: StateRef::new(SecureHash::zero(), 0),
            consuming_tx: SecureHash::zero(),
        };
        let err: FlowError = NotaryError::InputAlreadyConsumed {
            conflicts: vec![conflict.clone()],
        }
        .into();
        assert_eq!(err, FlowError::NotaryConflict { conflicts: vec![conflict] });

        let err: FlowError = NotaryError::MalformedTransaction("x".into()).into();
        assert!(matches!(err, FlowError::NotaryRejected(_)));
    }

    #[test]
    fn test_session_error_mapping() {
        let err: FlowError = SessionError::Timeout(Duration::from_secs(1)).into();
        assert!(matches!(err, FlowError::SessionFailure(_)));
        let err: FlowError = SessionError::Serialization("eof".into()).into();
        assert_eq!(err, FlowError::MalformedRequest("eof".into()));
        let err: FlowError = SessionError::Rejected("no responder".into()).into();
        assert!(err.to_string().contains("no responder"));
    }

    #[test]
    fn test_transaction_error_mapping() {
        let err: FlowError = TransactionError::SignaturesMissing { missing: vec![] }.into();
        assert!(matches!(err, FlowError::AuthorizationDenied(_)));
        let err: FlowError = TransactionError::Empty.into();
        assert!(matches!(err, FlowError::MalformedRequest(_)));
    }
}

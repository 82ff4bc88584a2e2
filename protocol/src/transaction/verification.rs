//! Transaction verification: structural checks and contract validation.
//!
//! Every proposed transaction must pass [`verify_transaction`] before a
//! party signs it. The structural checks are ordered from cheapest to most
//! expensive and run before the contract, so a contract can assume it is
//! looking at a well-formed transaction governed by itself.

use thiserror::Error;

use super::builder::WireTransaction;
use super::types::{CommandData, ContractState};
use crate::config::{MAX_TX_INPUTS, MAX_TX_OUTPUTS};
use crate::crypto::hash::SecureHash;
use crate::crypto::keys::PublicKey;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A contract rule that did not hold. Carries the rule text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed requirement: {rule}")]
pub struct ContractViolation {
    pub rule: String,
}

impl ContractViolation {
    pub fn new(rule: impl Into<String>) -> Self {
        Self { rule: rule.into() }
    }
}

/// Fails with `rule` when `condition` is false.
///
/// Contracts are written as a sequence of these, so the first violated rule
/// is the one reported.
pub fn require_that(condition: bool, rule: &str) -> Result<(), ContractViolation> {
    if condition {
        Ok(())
    } else {
        Err(ContractViolation::new(rule))
    }
}

/// Errors that can occur during transaction verification.
///
/// Each variant maps to a specific validation rule. Contract rule failures
/// are wrapped as [`TransactionError::Contract`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransactionError {
    /// The transaction id does not match the double-SHA-256 of its body.
    #[error("transaction ID mismatch: expected {expected}, got {actual}")]
    IdMismatch {
        expected: SecureHash,
        actual: SecureHash,
    },

    /// The body could not be encoded to canonical bytes.
    #[error("failed to encode transaction body: {0}")]
    Encoding(String),

    /// Neither inputs nor outputs.
    #[error("transaction has no inputs and no outputs")]
    Empty,

    #[error("too many inputs: {count} (max {max})")]
    TooManyInputs { count: usize, max: usize },

    #[error("too many outputs: {count} (max {max})")]
    TooManyOutputs { count: usize, max: usize },

    /// A state is governed by a different contract than the one verifying.
    #[error("state is governed by contract '{found}', expected '{expected}'")]
    WrongContract { expected: String, found: String },

    /// A state names a different notary than the transaction.
    #[error("state notary {found} does not match transaction notary {expected}")]
    NotaryMismatch { expected: String, found: String },

    /// A signature does not verify against its claimed key.
    #[error("invalid signature by {signer}")]
    InvalidSignature { signer: PublicKey },

    /// Required signers that have not signed.
    #[error("missing signatures from {} required signer(s)", .missing.len())]
    SignaturesMissing { missing: Vec<PublicKey> },

    /// A contract rule failed.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The validity rules for one kind of state.
///
/// Implementations must be pure: no I/O, no clocks, no randomness. The same
/// transaction always yields the same verdict.
pub trait Contract: Send + Sync + 'static {
    type State: ContractState;
    type Command: CommandData;

    /// The id stamped on every output this contract governs.
    fn contract_id(&self) -> &'static str;

    fn verify(
        &self,
        tx: &WireTransaction<Self::State, Self::Command>,
    ) -> Result<(), ContractViolation>;
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a transaction for structural correctness, then runs `contract`.
///
/// The checks, in order:
///
/// 1. **Id**: must equal the double-SHA-256 of the body.
/// 2. **Non-empty**: at least one input or output.
/// 3. **Limits**: at most [`MAX_TX_INPUTS`] inputs and [`MAX_TX_OUTPUTS`] outputs.
/// 4. **Contract tag**: every input and output is governed by `contract`.
/// 5. **Notary**: every input and output names the transaction's notary.
/// 6. **Contract rules**: `contract.verify(tx)`.
///
/// Signatures are not checked here. See
/// [`super::signing::SignedTransaction::verify_signatures_except`].
///
/// # Errors
///
/// Returns the first failing check as a [`TransactionError`].
pub fn verify_transaction<K: Contract>(
    tx: &WireTransaction<K::State, K::Command>,
    contract: &K,
) -> Result<(), TransactionError> {
    // 1. Id integrity.
    tx.check_integrity()?;

    // 2. Something must happen.
    if tx.inputs.is_empty() && tx.outputs.is_empty() {
        return Err(TransactionError::Empty);
    }

    // 3. Size limits.
    if tx.inputs.len() > MAX_TX_INPUTS {
        return Err(TransactionError::TooManyInputs {
            count: tx.inputs.len(),
            max: MAX_TX_INPUTS,
        });
    }
    if tx.outputs.len() > MAX_TX_OUTPUTS {
        return Err(TransactionError::TooManyOutputs {
            count: tx.outputs.len(),
            max: MAX_TX_OUTPUTS,
        });
    }

    // 4 + 5. Contract tag and notary on every state.
    let expected_contract = contract.contract_id();
    let states = tx
        .inputs
        .iter()
        .map(|input| &input.state)
        .chain(tx.outputs.iter());
    for state in states {
        if state.contract != expected_contract {
            return Err(TransactionError::WrongContract {
                expected: expected_contract.to_string(),
                found: state.contract.clone(),
            });
        }
        if state.notary != tx.notary {
            return Err(TransactionError::NotaryMismatch {
                expected: tx.notary.name.to_string(),
                found: state.notary.name.to_string(),
            });
        }
    }

    // 6. Domain rules.
    contract.verify(tx)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        dummy_party, DummyCommand, DummyContract, DummyState, DUMMY_CONTRACT_ID,
    };
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::{StateAndRef, StateRef, TransactionState};

    fn issue_builder() -> TransactionBuilder<DummyState, DummyCommand> {
        let owner = dummy_party("Owner Ltd");
        let mut builder = TransactionBuilder::new(dummy_party("Notary Service"));
        builder
            .add_output_state(DummyState::new(1, owner.clone()), DUMMY_CONTRACT_ID)
            .add_command(DummyCommand::Create, vec![owner.owning_key]);
        builder
    }

    #[test]
    fn test_valid_transaction_passes() {
        let wtx = issue_builder().to_wire_transaction().unwrap();
        verify_transaction(&wtx, &DummyContract).unwrap();
    }

    #[test]
    fn test_contract_violation_display() {
        let violation = ContractViolation::new("the state is propagated");
        assert_eq!(
            violation.to_string(),
            "failed requirement: the state is propagated"
        );
    }

    #[test]
    fn test_require_that() {
        assert!(require_that(true, "never shown").is_ok());
        assert_eq!(
            require_that(false, "shown").unwrap_err().rule,
            "shown".to_string()
        );
    }

    #[test]
    fn test_tampered_id_rejected_first() {
        let mut wtx = issue_builder().to_wire_transaction().unwrap();
        wtx.id = SecureHash::zero();
        match verify_transaction(&wtx, &DummyContract) {
            Err(TransactionError::IdMismatch { .. }) => {}
            other => panic!("expected IdMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_transaction_rejected() {
        let mut builder: TransactionBuilder<DummyState, DummyCommand> =
            TransactionBuilder::new(dummy_party("Notary Service"));
        builder.add_command(DummyCommand::Create, vec![]);
        let wtx = builder.to_wire_transaction().unwrap();
        assert_eq!(
            verify_transaction(&wtx, &DummyContract),
            Err(TransactionError::Empty)
        );
    }

    #[test]
    fn test_too_many_outputs_rejected() {
        let owner = dummy_party("Owner Ltd");
        let mut builder = TransactionBuilder::new(dummy_party("Notary Service"));
        for i in 0..=MAX_TX_OUTPUTS {
            builder.add_output_state(DummyState::new(i as u32, owner.clone()), DUMMY_CONTRACT_ID);
        }
        builder.add_command(DummyCommand::Create, vec![owner.owning_key]);
        let wtx = builder.to_wire_transaction().unwrap();
        match verify_transaction(&wtx, &DummyContract) {
            Err(TransactionError::TooManyOutputs { count, max }) => {
                assert_eq!(count, MAX_TX_OUTPUTS + 1);
                assert_eq!(max, MAX_TX_OUTPUTS);
            }
            other => panic!("expected TooManyOutputs, got {:?}", other),
        }
    }

    #[test]
    fn test_foreign_contract_rejected() {
        let mut builder = issue_builder();
        builder.add_output_state(DummyState::new(2, dummy_party("X")), "someone.else");
        let wtx = builder.to_wire_transaction().unwrap();
        match verify_transaction(&wtx, &DummyContract) {
            Err(TransactionError::WrongContract { found, .. }) => assert_eq!(found, "someone.else"),
            other => panic!("expected WrongContract, got {:?}", other),
        }
    }

    #[test]
    fn test_input_with_other_notary_rejected() {
        let owner = dummy_party("Owner Ltd");
        let mut builder = issue_builder();
        builder.add_input_state(StateAndRef {
            state: TransactionState {
                data: DummyState::new(9, owner),
                contract: DUMMY_CONTRACT_ID.to_string(),
                notary: dummy_party("Other Notary"),
            },
            reference: StateRef::new(SecureHash::double_sha256(b"prev"), 0),
        });
        let wtx = builder.to_wire_transaction().unwrap();
        match verify_transaction(&wtx, &DummyContract) {
            Err(TransactionError::NotaryMismatch { .. }) => {}
            other => panic!("expected NotaryMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_contract_failure_is_wrapped() {
        let mut builder = issue_builder();
        builder.add_command(DummyCommand::Move, vec![]);
        let wtx = builder.to_wire_transaction().unwrap();
        match verify_transaction(&wtx, &DummyContract) {
            Err(TransactionError::Contract(violation)) => {
                assert_eq!(violation.rule, "exactly one command is required");
            }
            other => panic!("expected contract violation, got {:?}", other),
        }
    }

    #[test]
    fn test_verification_is_repeatable() {
        let mut builder = issue_builder();
        builder.add_command(DummyCommand::Move, vec![]);
        let wtx = builder.to_wire_transaction().unwrap();
        assert_eq!(
            verify_transaction(&wtx, &DummyContract),
            verify_transaction(&wtx, &DummyContract)
        );
    }
}

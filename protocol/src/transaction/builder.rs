//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] collects inputs, outputs, commands and a time
//! window, then freezes them into a [`WireTransaction`] whose id is derived
//! from its contents.
//!
//! The builder does not sign. That happens in [`super::signing`]. This
//! separation keeps construction testable without key material.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::types::{Command, StateAndRef, StateRef, TimeWindow, TransactionState};
use super::verification::{verify_transaction, Contract, TransactionError};
use crate::crypto::hash::SecureHash;
use crate::crypto::keys::PublicKey;
use crate::identity::Party;

// ---------------------------------------------------------------------------
// WireTransaction
// ---------------------------------------------------------------------------

/// An unsigned, frozen transaction.
///
/// The `id` is the double-SHA-256 of the canonical `bincode` encoding of
/// every field *except* `id` itself. Signatures live outside the wire
/// transaction (see [`super::signing::SignedTransaction`]), so the id is
/// stable across signing and every signer signs the same bytes.
///
/// Inputs carry the resolved state data they consume, so a counterparty can
/// check a proposal without fetching its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, C: Serialize",
    deserialize = "S: DeserializeOwned, C: DeserializeOwned"
))]
pub struct WireTransaction<S, C> {
    pub id: SecureHash,
    pub inputs: Vec<StateAndRef<S>>,
    pub outputs: Vec<TransactionState<S>>,
    pub commands: Vec<Command<C>>,
    pub notary: Party,
    pub time_window: Option<TimeWindow>,
}

/// Borrowed view of the hashed fields, in canonical order.
#[derive(Serialize)]
#[serde(bound(serialize = "S: Serialize, C: Serialize"))]
struct TransactionBody<'a, S, C> {
    inputs: &'a [StateAndRef<S>],
    outputs: &'a [TransactionState<S>],
    commands: &'a [Command<C>],
    notary: &'a Party,
    time_window: &'a Option<TimeWindow>,
}

impl<S: Serialize, C: Serialize> WireTransaction<S, C> {
    /// Canonical bytes used for id computation.
    pub fn body_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        encode_body(
            &self.inputs,
            &self.outputs,
            &self.commands,
            &self.notary,
            &self.time_window,
        )
    }

    /// Recomputes the id from the current field values.
    pub fn compute_id(&self) -> Result<SecureHash, TransactionError> {
        Ok(SecureHash::double_sha256(&self.body_bytes()?))
    }

    /// Errors with [`TransactionError::IdMismatch`] if the stored id does not
    /// match the contents.
    pub fn check_integrity(&self) -> Result<(), TransactionError> {
        let actual = self.compute_id()?;
        if actual != self.id {
            return Err(TransactionError::IdMismatch {
                expected: self.id,
                actual,
            });
        }
        Ok(())
    }
}

impl<S: Clone, C> WireTransaction<S, C> {
    /// The `StateAndRef` for output `index`, once this transaction is recorded.
    pub fn out_ref(&self, index: usize) -> Option<StateAndRef<S>> {
        let state = self.outputs.get(index)?.clone();
        let index = u32::try_from(index).ok()?;
        Some(StateAndRef {
            state,
            reference: StateRef::new(self.id, index),
        })
    }

    /// References to every consumed state.
    pub fn input_refs(&self) -> Vec<StateRef> {
        self.inputs.iter().map(|input| input.reference).collect()
    }

    pub fn input_states(&self) -> impl Iterator<Item = &S> {
        self.inputs.iter().map(|input| &input.state.data)
    }

    pub fn output_states(&self) -> impl Iterator<Item = &S> {
        self.outputs.iter().map(|output| &output.data)
    }

    /// Union of every command's signers, de-duplicated, in first-seen order.
    pub fn required_signing_keys(&self) -> Vec<PublicKey> {
        let mut keys: Vec<PublicKey> = Vec::new();
        for key in self.commands.iter().flat_map(|cmd| cmd.signers.iter()) {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }
}

fn encode_body<S: Serialize, C: Serialize>(
    inputs: &[StateAndRef<S>],
    outputs: &[TransactionState<S>],
    commands: &[Command<C>],
    notary: &Party,
    time_window: &Option<TimeWindow>,
) -> Result<Vec<u8>, TransactionError> {
    let body = TransactionBody {
        inputs,
        outputs,
        commands,
        notary,
        time_window,
    };
    bincode::serialize(&body).map_err(|e| TransactionError::Encoding(e.to_string()))
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Mutable builder for proposed transactions.
///
/// # Usage
///
/// ```rust,ignore
/// let mut builder = TransactionBuilder::new(notary.clone());
/// builder
///     .add_output_state(state, "tally.asset")
///     .add_command(AssetCommand::Create, vec![issuer.owning_key.clone()])
///     .set_time_window(TimeWindow::from_start_and_duration(Utc::now(), TIME_WINDOW));
/// let wtx = builder.to_wire_transaction()?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder<S, C> {
    notary: Party,
    inputs: Vec<StateAndRef<S>>,
    outputs: Vec<TransactionState<S>>,
    commands: Vec<Command<C>>,
    time_window: Option<TimeWindow>,
}

impl<S, C> TransactionBuilder<S, C>
where
    S: Clone + Serialize,
    C: Clone + Serialize,
{
    /// Creates an empty builder bound to `notary`.
    pub fn new(notary: Party) -> Self {
        Self {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            time_window: None,
        }
    }

    /// Appends a state to consume.
    pub fn add_input_state(&mut self, input: StateAndRef<S>) -> &mut Self {
        self.inputs.push(input);
        self
    }

    /// Appends an output governed by `contract_id`, bound to this builder's
    /// notary.
    pub fn add_output_state(&mut self, data: S, contract_id: &str) -> &mut Self {
        self.outputs.push(TransactionState {
            data,
            contract: contract_id.to_string(),
            notary: self.notary.clone(),
        });
        self
    }

    pub fn add_command(&mut self, value: C, signers: Vec<PublicKey>) -> &mut Self {
        self.commands.push(Command::new(value, signers));
        self
    }

    /// Adds `signer` to the existing command equal to `value`, or appends a
    /// new command if there is none. A signer is listed once.
    pub fn add_command_signer(&mut self, value: C, signer: PublicKey) -> &mut Self
    where
        C: PartialEq,
    {
        match self.commands.iter_mut().find(|command| command.value == value) {
            Some(command) => {
                if !command.signers.contains(&signer) {
                    command.signers.push(signer);
                }
            }
            None => self.commands.push(Command::new(value, vec![signer])),
        }
        self
    }

    pub fn set_time_window(&mut self, window: TimeWindow) -> &mut Self {
        self.time_window = Some(window);
        self
    }

    pub fn notary(&self) -> &Party {
        &self.notary
    }

    pub fn inputs(&self) -> &[StateAndRef<S>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransactionState<S>] {
        &self.outputs
    }

    pub fn commands(&self) -> &[Command<C>] {
        &self.commands
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    /// Freezes the current contents into a [`WireTransaction`] with its id
    /// computed.
    pub fn to_wire_transaction(&self) -> Result<WireTransaction<S, C>, TransactionError> {
        let body = encode_body(
            &self.inputs,
            &self.outputs,
            &self.commands,
            &self.notary,
            &self.time_window,
        )?;
        Ok(WireTransaction {
            id: SecureHash::double_sha256(&body),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
            notary: self.notary.clone(),
            time_window: self.time_window,
        })
    }

    /// Freezes the builder and runs full verification against `contract`.
    pub fn verify<K>(&self, contract: &K) -> Result<WireTransaction<S, C>, TransactionError>
    where
        K: Contract<State = S, Command = C>,
    {
        let wtx = self.to_wire_transaction()?;
        verify_transaction(&wtx, contract)?;
        Ok(wtx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{dummy_party, DummyCommand, DummyContract, DummyState, DUMMY_CONTRACT_ID};
    use chrono::Utc;
    use std::time::Duration;

    fn builder_with_output() -> TransactionBuilder<DummyState, DummyCommand> {
        let notary = dummy_party("Notary Service");
        let owner = dummy_party("Owner Ltd");
        let mut builder = TransactionBuilder::new(notary);
        builder
            .add_output_state(DummyState::new(7, owner.clone()), DUMMY_CONTRACT_ID)
            .add_command(DummyCommand::Create, vec![owner.owning_key.clone()]);
        builder
    }

    #[test]
    fn test_add_command_signer_merges_into_matching_command() {
        let mut builder = builder_with_output();
        let first = dummy_party("First Ltd").owning_key;
        let second = dummy_party("Second Ltd").owning_key;
        builder
            .add_command_signer(DummyCommand::Move, first.clone())
            .add_command_signer(DummyCommand::Move, second.clone())
            .add_command_signer(DummyCommand::Move, first.clone());

        assert_eq!(builder.commands().len(), 2);
        assert_eq!(builder.commands()[1].value, DummyCommand::Move);
        assert_eq!(builder.commands()[1].signers, vec![first, second]);
    }

    #[test]
    fn test_id_is_deterministic() {
        let builder = builder_with_output();
        let a = builder.to_wire_transaction().unwrap();
        let b = builder.to_wire_transaction().unwrap();
        assert_eq!(a.id, b.id);
        a.check_integrity().unwrap();
    }

    #[test]
    fn test_id_changes_with_contents() {
        let mut builder = builder_with_output();
        let before = builder.to_wire_transaction().unwrap().id;
        builder.set_time_window(TimeWindow::from_start_and_duration(
            Utc::now(),
            Duration::from_secs(10),
        ));
        let after = builder.to_wire_transaction().unwrap().id;
        assert_ne!(before, after);
    }

    #[test]
    fn test_tampered_transaction_fails_integrity() {
        let mut wtx = builder_with_output().to_wire_transaction().unwrap();
        wtx.outputs[0].data.magic = 8;
        match wtx.check_integrity() {
            Err(TransactionError::IdMismatch { .. }) => {}
            other => panic!("expected IdMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_outputs_bound_to_builder_notary() {
        let builder = builder_with_output();
        let wtx = builder.to_wire_transaction().unwrap();
        assert_eq!(wtx.outputs[0].notary, *builder.notary());
        assert_eq!(wtx.outputs[0].contract, DUMMY_CONTRACT_ID);
    }

    #[test]
    fn test_out_ref_points_at_output() {
        let wtx = builder_with_output().to_wire_transaction().unwrap();
        let out = wtx.out_ref(0).unwrap();
        assert_eq!(out.reference, StateRef::new(wtx.id, 0));
        assert_eq!(out.state, wtx.outputs[0]);
        assert!(wtx.out_ref(1).is_none());
    }

    #[test]
    fn test_required_signing_keys_deduplicated() {
        let owner = dummy_party("Owner Ltd");
        let other = dummy_party("Other Ltd");
        let mut builder: TransactionBuilder<DummyState, DummyCommand> =
            TransactionBuilder::new(dummy_party("Notary Service"));
        builder
            .add_command(
                DummyCommand::Create,
                vec![owner.owning_key.clone(), other.owning_key.clone()],
            )
            .add_command(DummyCommand::Move, vec![owner.owning_key.clone()]);
        let keys = builder.to_wire_transaction().unwrap().required_signing_keys();
        assert_eq!(keys, vec![owner.owning_key, other.owning_key]);
    }

    #[test]
    fn test_verify_runs_contract() {
        let builder = builder_with_output();
        assert!(builder.verify(&DummyContract).is_ok());

        let mut bad = builder_with_output();
        bad.add_command(DummyCommand::Move, vec![]);
        assert!(bad.verify(&DummyContract).is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_id() {
        let wtx = builder_with_output().to_wire_transaction().unwrap();
        let json = serde_json::to_vec(&wtx).unwrap();
        let back: WireTransaction<DummyState, DummyCommand> = serde_json::from_slice(&json).unwrap();
        back.check_integrity().unwrap();
        assert_eq!(back, wtx);
    }
}

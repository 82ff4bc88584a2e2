//! Shared fixtures for the platform's unit tests: a minimal ownable state,
//! a two-command contract over it, and party helpers.

use serde::{Deserialize, Serialize};

use crate::crypto::keys::Keypair;
use crate::identity::{Party, PartyName};
use crate::transaction::{
    require_that, Contract, ContractState, ContractViolation, OwnableState, WireTransaction,
};

pub const DUMMY_CONTRACT_ID: &str = "tally.test.dummy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyState {
    pub magic: u32,
    pub owner: Party,
}

impl DummyState {
    pub fn new(magic: u32, owner: Party) -> Self {
        Self { magic, owner }
    }
}

impl ContractState for DummyState {
    fn participants(&self) -> Vec<Party> {
        vec![self.owner.clone()]
    }
}

impl OwnableState for DummyState {
    fn owner(&self) -> &Party {
        &self.owner
    }

    fn with_new_owner(&self, new_owner: Party) -> Self {
        Self {
            magic: self.magic,
            owner: new_owner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DummyCommand {
    Create,
    Move,
}

/// Creates consume nothing; moves consume something. Exactly one command.
pub struct DummyContract;

impl Contract for DummyContract {
    type State = DummyState;
    type Command = DummyCommand;

    fn contract_id(&self) -> &'static str {
        DUMMY_CONTRACT_ID
    }

    fn verify(&self, tx: &WireTransaction<DummyState, DummyCommand>) -> Result<(), ContractViolation> {
        require_that(tx.commands.len() == 1, "exactly one command is required")?;
        match tx.commands[0].value {
            DummyCommand::Create => require_that(tx.inputs.is_empty(), "creates consume nothing"),
            DummyCommand::Move => require_that(!tx.inputs.is_empty(), "moves consume something"),
        }
    }
}

/// A party with a fresh random key.
pub fn dummy_party(organisation: &str) -> Party {
    dummy_party_with_key(organisation).0
}

/// A party together with the keypair that owns it.
pub fn dummy_party_with_key(organisation: &str) -> (Party, Keypair) {
    let keypair = Keypair::generate();
    let name = PartyName {
        common_name: None,
        organisation: organisation.to_string(),
        locality: "London".to_string(),
        country: "GB".to_string(),
    };
    (Party::new(name, keypair.public_key()), keypair)
}

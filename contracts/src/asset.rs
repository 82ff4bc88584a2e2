//! # Asset Contract
//!
//! An asset is an immutable record of `content` issued by one party and
//! owned by another. Assets form a linear version chain: a transfer consumes
//! exactly one version and produces exactly one new version that differs
//! only in its owner.
//!
//! ## Rules
//!
//! The contract groups a transaction's inputs and outputs by the asset with
//! its owner erased, so several independent lineages may share one
//! transaction. Every transaction carries exactly one [`AssetCommand`]:
//!
//! - **Create**: the transaction has a time window with an upper bound. Each
//!   group produces exactly one asset, consumes nothing, is signed by the
//!   issuer and carries non-empty content.
//! - **Transfer**: each group consumes exactly one asset, produces exactly
//!   one, and is signed by the consumed asset's owner.
//!
//! The first violated rule is reported and the whole transaction is
//! rejected.

use std::fmt;

use serde::{Deserialize, Serialize};
use tally_protocol::identity::Party;
use tally_protocol::transaction::{
    group_states, require_that, Command, Contract, ContractState, ContractViolation,
    OwnableState, StateAndRef, TransactionBuilder, WireTransaction,
};

/// Identifier stamped on every asset output.
pub const ASSET_CONTRACT_ID: &str = "tally.asset";

/// Rule texts reported in [`ContractViolation::rule`].
pub mod rules {
    pub const SINGLE_COMMAND: &str = "exactly one asset command is required";
    pub const TIMESTAMPED: &str = "issuances must be timestamped";
    pub const ONE_ISSUED: &str = "an issuance produces exactly one asset";
    pub const ISSUER_SIGNS: &str = "output states are issued by a command signer";
    pub const HAS_CONTENT: &str = "output contains content";
    pub const NO_REISSUE: &str = "cannot reissue an existing lineage";
    pub const ONE_CONSUMED: &str = "a transfer consumes exactly one asset";
    pub const OWNER_SIGNS: &str = "the transaction must be signed by the owner";
    pub const PROPAGATED: &str = "the state must be propagated";
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One version of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetState {
    /// Opaque payload. Never empty on issuance.
    pub content: String,
    pub issuer: Party,
    pub owner: Party,
}

impl AssetState {
    pub fn new(content: impl Into<String>, issuer: Party, owner: Party) -> Self {
        Self {
            content: content.into(),
            issuer,
            owner,
        }
    }

    /// The grouping key: this asset with the null party as owner.
    pub fn without_owner(&self) -> AssetState {
        self.with_new_owner(Party::null())
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' issued by {} owned by {}",
            self.content, self.issuer.name.organisation, self.owner.name.organisation
        )
    }
}

impl ContractState for AssetState {
    fn participants(&self) -> Vec<Party> {
        vec![self.owner.clone(), self.issuer.clone()]
    }
}

impl OwnableState for AssetState {
    fn owner(&self) -> &Party {
        &self.owner
    }

    fn with_new_owner(&self, new_owner: Party) -> Self {
        Self {
            content: self.content.clone(),
            issuer: self.issuer.clone(),
            owner: new_owner,
        }
    }
}

/// The two asset transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetCommand {
    Create,
    Transfer,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Validity rules for [`AssetState`] transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetContract;

impl AssetContract {
    fn verify_create(
        tx: &WireTransaction<AssetState, AssetCommand>,
        command: &Command<AssetCommand>,
    ) -> Result<(), ContractViolation> {
        require_that(
            tx.time_window.and_then(|window| window.until_time()).is_some(),
            rules::TIMESTAMPED,
        )?;
        for group in group_states(tx, AssetState::without_owner) {
            require_that(group.outputs.len() == 1, rules::ONE_ISSUED)?;
            let output = &group.outputs[0];
            require_that(
                command.signers.contains(&output.issuer.owning_key),
                rules::ISSUER_SIGNS,
            )?;
            require_that(!output.content.is_empty(), rules::HAS_CONTENT)?;
            require_that(group.inputs.is_empty(), rules::NO_REISSUE)?;
        }
        Ok(())
    }

    fn verify_transfer(
        tx: &WireTransaction<AssetState, AssetCommand>,
        command: &Command<AssetCommand>,
    ) -> Result<(), ContractViolation> {
        for group in group_states(tx, AssetState::without_owner) {
            require_that(group.inputs.len() == 1, rules::ONE_CONSUMED)?;
            require_that(
                command.signers.contains(&group.inputs[0].owner.owning_key),
                rules::OWNER_SIGNS,
            )?;
            require_that(group.outputs.len() == 1, rules::PROPAGATED)?;
        }
        Ok(())
    }
}

impl Contract for AssetContract {
    type State = AssetState;
    type Command = AssetCommand;

    fn contract_id(&self) -> &'static str {
        ASSET_CONTRACT_ID
    }

    fn verify(
        &self,
        tx: &WireTransaction<AssetState, AssetCommand>,
    ) -> Result<(), ContractViolation> {
        let command = match tx.commands.as_slice() {
            [command] => command,
            _ => return Err(ContractViolation::new(rules::SINGLE_COMMAND)),
        };
        match command.value {
            AssetCommand::Create => Self::verify_create(tx, command),
            AssetCommand::Transfer => Self::verify_transfer(tx, command),
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// A creation of `content` by `issuer` for `owner`, signed by the issuer.
///
/// No validation happens here.
pub fn generate_create(
    content: impl Into<String>,
    issuer: &Party,
    owner: &Party,
    notary: &Party,
) -> TransactionBuilder<AssetState, AssetCommand> {
    let mut builder = TransactionBuilder::new(notary.clone());
    builder
        .add_output_state(
            AssetState::new(content, issuer.clone(), owner.clone()),
            ASSET_CONTRACT_ID,
        )
        .add_command(AssetCommand::Create, vec![issuer.owning_key.clone()]);
    builder
}

/// Adds the transfer of `asset` to `new_owner`, signed by its current owner.
///
/// Repeated calls on one builder share a single `Transfer` command, so
/// several lineages can move in one transaction.
pub fn generate_transfer(
    builder: &mut TransactionBuilder<AssetState, AssetCommand>,
    asset: StateAndRef<AssetState>,
    new_owner: &Party,
) {
    let output = asset.state.data.with_new_owner(new_owner.clone());
    let signer = asset.state.data.owner.owning_key.clone();
    builder
        .add_input_state(asset)
        .add_output_state(output, ASSET_CONTRACT_ID)
        .add_command_signer(AssetCommand::Transfer, signer);
}

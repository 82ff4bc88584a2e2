//! In-memory transaction and state storage for a node.

use std::collections::BTreeMap;
use std::fmt;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::crypto::hash::SecureHash;
use crate::identity::Party;
use crate::transaction::{
    CommandData, ContractState, OwnableState, SignedTransaction, StateAndRef, StateRef,
};

/// A node's view of the ledger.
pub struct NodeStorage<S, C> {
    /// Finalised transactions by id.
    transactions: DashMap<SecureHash, SignedTransaction<S, C>>,

    /// Outputs not yet consumed by any recorded transaction.
    unspent: RwLock<BTreeMap<StateRef, StateAndRef<S>>>,

    /// Consumed refs and the transaction that consumed them.
    consumed: DashMap<StateRef, SecureHash>,
}

impl<S, C> fmt::Debug for NodeStorage<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeStorage")
            .field("transactions", &self.transactions.len())
            .field("unspent", &self.unspent.read().len())
            .field("consumed", &self.consumed.len())
            .finish()
    }
}

impl<S, C> Default for NodeStorage<S, C> {
    fn default() -> Self {
        Self {
            transactions: DashMap::new(),
            unspent: RwLock::new(BTreeMap::new()),
            consumed: DashMap::new(),
        }
    }
}

impl<S: ContractState, C: CommandData> NodeStorage<S, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finalised transaction.
    ///
    /// Marks its inputs consumed and adds its outputs to the unspent index.
    /// Returns `false` if the transaction was already recorded, in which
    /// case nothing changes.
    pub fn record_transaction(&self, stx: &SignedTransaction<S, C>) -> bool {
        let id = stx.id();
        match self.transactions.entry(id) {
            Entry::Occupied(_) => {
                debug!(tx_id = %id, "transaction already recorded");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(stx.clone());
            }
        }

        let mut unspent = self.unspent.write();
        for input in stx.tx.input_refs() {
            unspent.remove(&input);
            self.consumed.insert(input, id);
        }
        for index in 0..stx.tx.outputs.len() {
            if let Some(out) = stx.tx.out_ref(index) {
                if !self.consumed.contains_key(&out.reference) {
                    unspent.insert(out.reference, out);
                }
            }
        }

        debug!(
            tx_id = %id,
            inputs = stx.tx.inputs.len(),
            outputs = stx.tx.outputs.len(),
            "transaction recorded"
        );
        true
    }

    pub fn get_transaction(&self, id: &SecureHash) -> Option<SignedTransaction<S, C>> {
        self.transactions.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains_transaction(&self, id: &SecureHash) -> bool {
        self.transactions.contains_key(id)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Every unspent state, in `StateRef` order.
    pub fn unspent_states(&self) -> Vec<StateAndRef<S>> {
        self.unspent.read().values().cloned().collect()
    }

    pub fn get_unspent(&self, state_ref: &StateRef) -> Option<StateAndRef<S>> {
        self.unspent.read().get(state_ref).cloned()
    }

    /// The transaction that consumed `state_ref`, if this node saw it.
    pub fn consumed_by(&self, state_ref: &StateRef) -> Option<SecureHash> {
        self.consumed.get(state_ref).map(|entry| *entry.value())
    }

    pub fn is_consumed(&self, state_ref: &StateRef) -> bool {
        self.consumed.contains_key(state_ref)
    }
}

impl<S: OwnableState, C: CommandData> NodeStorage<S, C> {
    /// Unspent states currently owned by `owner`.
    pub fn unspent_owned_by(&self, owner: &Party) -> Vec<StateAndRef<S>> {
        self.unspent
            .read()
            .values()
            .filter(|sar| sar.state.data.owner() == owner)
            .cloned()
            .collect()
    }
}

//! Grouping of a transaction's states by a caller-supplied key.
//!
//! Contracts that govern fungible or versioned states do not validate a
//! transaction as one blob. They split it into groups of inputs and outputs
//! that belong together, then check each group on its own. What "belongs
//! together" is decided by the key function, typically the state with its
//! owner erased.

use super::builder::WireTransaction;

/// Inputs and outputs sharing one grouping key.
#[derive(Debug, Clone, PartialEq)]
pub struct InOutGroup<S, K> {
    pub inputs: Vec<S>,
    pub outputs: Vec<S>,
    pub grouping_key: K,
}

/// Partitions the transaction's input and output states by `key_fn`.
///
/// Keys are compared with `PartialEq`. Groups appear in the order their key
/// is first seen, scanning inputs before outputs.
pub fn group_states<S, C, K, F>(tx: &WireTransaction<S, C>, key_fn: F) -> Vec<InOutGroup<S, K>>
where
    S: Clone,
    K: PartialEq,
    F: Fn(&S) -> K,
{
    let mut groups: Vec<InOutGroup<S, K>> = Vec::new();

    for (state, is_input) in tx
        .inputs
        .iter()
        .map(|input| (&input.state.data, true))
        .chain(tx.outputs.iter().map(|output| (&output.data, false)))
    {
        let key = key_fn(state);
        let index = match groups.iter().position(|group| group.grouping_key == key) {
            Some(index) => index,
            None => {
                groups.push(InOutGroup {
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                    grouping_key: key,
                });
                groups.len() - 1
            }
        };
        if is_input {
            groups[index].inputs.push(state.clone());
        } else {
            groups[index].outputs.push(state.clone());
        }
    }

    groups
}

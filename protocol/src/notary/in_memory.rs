//! Single-process uniqueness notary.
//!
//! The commit log maps each consumed [`StateRef`] to the transaction that
//! consumed it. The conflict check and the commit happen under one
//! `parking_lot::Mutex`, so of two racing transactions spending the same
//! input exactly one is accepted.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{Conflict, NotarisationRequest, NotarisationResponse, Notary, NotaryError};
use crate::crypto::hash::SecureHash;
use crate::crypto::keys::Keypair;
use crate::identity::Party;
use crate::transaction::{sign_id, StateRef};

/// In-memory notary backed by a consumed-inputs map.
pub struct InMemoryNotary {
    identity: Party,
    keypair: Keypair,
    committed: Mutex<HashMap<StateRef, SecureHash>>,
}

impl fmt::Debug for InMemoryNotary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryNotary")
            .field("identity", &self.identity.name)
            .field("committed", &self.committed.lock().len())
            .finish()
    }
}

impl InMemoryNotary {
    /// `keypair` must own `identity`.
    pub fn new(identity: Party, keypair: Keypair) -> Self {
        Self {
            identity,
            keypair,
            committed: Mutex::new(HashMap::new()),
        }
    }

    /// The transaction that consumed `state_ref`, if any.
    pub fn consumed_by(&self, state_ref: &StateRef) -> Option<SecureHash> {
        self.committed.lock().get(state_ref).copied()
    }

    /// Number of inputs committed so far.
    pub fn committed_count(&self) -> usize {
        self.committed.lock().len()
    }

    /// Notarises as of `now`.
    ///
    /// The checks, in order:
    ///
    /// 1. **Addressee**: the request must name this notary.
    /// 2. **Content**: inputs or a time window, otherwise there is nothing
    ///    to notarise.
    /// 3. **Duplicates**: no input listed twice.
    /// 4. **Time window**: `now` must fall inside it, if present.
    /// 5. **Uniqueness**: no input consumed by a different transaction.
    ///
    /// Re-notarising a transaction that was already committed succeeds and
    /// returns a fresh signature.
    pub fn notarise_at(
        &self,
        request: &NotarisationRequest,
        now: DateTime<Utc>,
    ) -> Result<NotarisationResponse, NotaryError> {
        // 1. Addressee.
        if request.notary != self.identity.name {
            return Err(NotaryError::MalformedTransaction(format!(
                "transaction names notary {}, not {}",
                request.notary, self.identity.name
            )));
        }

        // 2. Something to notarise.
        if request.inputs.is_empty() && request.time_window.is_none() {
            return Err(NotaryError::MalformedTransaction(
                "transaction has neither inputs nor a time window".to_string(),
            ));
        }

        // 3. Duplicate inputs.
        let mut seen = HashSet::with_capacity(request.inputs.len());
        for input in &request.inputs {
            if !seen.insert(input) {
                return Err(NotaryError::MalformedTransaction(format!(
                    "input {} listed more than once",
                    input
                )));
            }
        }

        // 4. Time window.
        if let Some(window) = request.time_window {
            if !window.contains(now) {
                warn!(tx_id = %request.tx_id, %window, "time window violated");
                return Err(NotaryError::TimeWindowViolated { window, now });
            }
        }

        // 5. Check and commit under one lock.
        {
            let mut committed = self.committed.lock();
            let conflicts: Vec<Conflict> = request
                .inputs
                .iter()
                .filter_map(|input| match committed.get(input) {
                    Some(consumer) if *consumer != request.tx_id => Some(Conflict {
                        state_ref: *input,
                        consuming_tx: *consumer,
                    }),
                    _ => None,
                })
                .collect();

            if !conflicts.is_empty() {
                warn!(
                    tx_id = %request.tx_id,
                    conflicts = conflicts.len(),
                    "rejecting double spend"
                );
                return Err(NotaryError::InputAlreadyConsumed { conflicts });
            }

            for input in &request.inputs {
                committed.insert(*input, request.tx_id);
            }
        }

        info!(
            tx_id = %request.tx_id,
            inputs = request.inputs.len(),
            requester = %request.requester,
            "notarised transaction"
        );
        debug!(tx_id = %request.tx_id, at = %now, "notary signature issued");

        Ok(NotarisationResponse {
            signature: sign_id(&self.keypair, &request.tx_id),
            timestamp: now,
        })
    }
}

#[async_trait]
impl Notary for InMemoryNotary {
    fn identity(&self) -> &Party {
        &self.identity
    }

    async fn notarise(
        &self,
        request: NotarisationRequest,
    ) -> Result<NotarisationResponse, NotaryError> {
        self.notarise_at(&request, Utc::now())
    }
}

//! # Signing Coordinator
//!
//! The initiating side of a two-party signing flow. One coordinator drives
//! one proposed transaction from assembly to finality:
//!
//! ```text
//! Assembling ──> LocallyVerified ──> AwaitingCounterSignature ──> Notarizing ──> Final
//!      │                │                      │                      │
//!      └────────────────┴──────────> Aborted <─┴──────────────────────┘
//! ```
//!
//! - **Assembling**: stamp the time window and run the contract.
//! - **LocallyVerified**: sign, open a session to the counterparty, send
//!   the proposal.
//! - **AwaitingCounterSignature**: wait (bounded) for the counterparty's
//!   signature and check the signature set is complete.
//! - **Notarizing**: submit to the notary, attach its signature, record
//!   locally, and hand the final transaction to the counterparty.
//!
//! Aborting is terminal. If a session is open, the counterparty is told why
//! (best effort). Nothing is recorded unless the notary accepted.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::error::FlowError;
use super::hub::ServiceHub;
use super::messages::SigningMessage;
use crate::identity::Party;
use crate::network::FlowSession;
use crate::notary::NotarisationRequest;
use crate::transaction::{
    Contract, SignedTransaction, TimeWindow, TransactionBuilder, WireTransaction,
};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Where a coordinator is, with the data it carries into the next step.
#[derive(Debug)]
pub enum CoordinatorState<S, C> {
    Assembling(TransactionBuilder<S, C>),
    LocallyVerified(WireTransaction<S, C>),
    AwaitingCounterSignature {
        stx: SignedTransaction<S, C>,
        session: FlowSession,
    },
    Notarizing {
        stx: SignedTransaction<S, C>,
        session: FlowSession,
    },
    Final(SignedTransaction<S, C>),
    Aborted {
        error: FlowError,
        session: Option<FlowSession>,
    },
}

/// Data-free tag of a [`CoordinatorState`], for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Assembling,
    LocallyVerified,
    AwaitingCounterSignature,
    Notarizing,
    Final,
    Aborted,
}

impl fmt::Display for CoordinatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assembling => "assembling",
            Self::LocallyVerified => "locally-verified",
            Self::AwaitingCounterSignature => "awaiting-counter-signature",
            Self::Notarizing => "notarizing",
            Self::Final => "final",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

impl<S, C> CoordinatorState<S, C> {
    pub fn phase(&self) -> CoordinatorPhase {
        match self {
            Self::Assembling(_) => CoordinatorPhase::Assembling,
            Self::LocallyVerified(_) => CoordinatorPhase::LocallyVerified,
            Self::AwaitingCounterSignature { .. } => CoordinatorPhase::AwaitingCounterSignature,
            Self::Notarizing { .. } => CoordinatorPhase::Notarizing,
            Self::Final(_) => CoordinatorPhase::Final,
            Self::Aborted { .. } => CoordinatorPhase::Aborted,
        }
    }

    fn abort(error: FlowError, session: Option<FlowSession>) -> Self {
        Self::Aborted { error, session }
    }
}

// ---------------------------------------------------------------------------
// SigningCoordinator
// ---------------------------------------------------------------------------

/// Drives one proposed transaction to finality with one counterparty.
pub struct SigningCoordinator<K: Contract> {
    hub: Arc<ServiceHub<K::State, K::Command>>,
    contract: K,
    flow_name: &'static str,
    counterparty: Party,
}

type State<K> = CoordinatorState<<K as Contract>::State, <K as Contract>::Command>;

impl<K: Contract> SigningCoordinator<K> {
    /// `flow_name` selects the responder on the counterparty's node.
    pub fn new(
        hub: Arc<ServiceHub<K::State, K::Command>>,
        contract: K,
        flow_name: &'static str,
        counterparty: Party,
    ) -> Self {
        Self {
            hub,
            contract,
            flow_name,
            counterparty,
        }
    }

    /// Runs the flow to completion.
    ///
    /// Returns the notarised transaction, already recorded in this node's
    /// storage, or the reason the flow aborted.
    pub async fn run(
        self,
        builder: TransactionBuilder<K::State, K::Command>,
    ) -> Result<SignedTransaction<K::State, K::Command>, FlowError> {
        info!(
            flow = self.flow_name,
            me = %self.hub.my_identity.name,
            counterparty = %self.counterparty.name,
            "starting signing flow"
        );

        let mut state: State<K> = CoordinatorState::Assembling(builder);
        loop {
            let from = state.phase();
            state = match state {
                CoordinatorState::Assembling(builder) => self.verify_locally(builder),
                CoordinatorState::LocallyVerified(wtx) => self.request_signature(wtx).await,
                CoordinatorState::AwaitingCounterSignature { stx, session } => {
                    self.await_signature(stx, session).await
                }
                CoordinatorState::Notarizing { stx, session } => self.notarise(stx, session).await,
                CoordinatorState::Final(stx) => {
                    info!(flow = self.flow_name, tx_id = %stx.id(), "flow finalised");
                    return Ok(stx);
                }
                CoordinatorState::Aborted { error, session } => {
                    self.abort(&error, session).await;
                    return Err(error);
                }
            };
            debug!(flow = self.flow_name, %from, to = %state.phase(), "coordinator transition");
        }
    }

    fn verify_locally(&self, mut builder: TransactionBuilder<K::State, K::Command>) -> State<K> {
        builder.set_time_window(TimeWindow::from_start_and_duration(
            Utc::now(),
            self.hub.config.time_window,
        ));
        match builder.verify(&self.contract) {
            Ok(wtx) => CoordinatorState::LocallyVerified(wtx),
            Err(e) => {
                warn!(flow = self.flow_name, error = %e, "local verification failed");
                CoordinatorState::abort(e.into(), None)
            }
        }
    }

    async fn request_signature(&self, wtx: WireTransaction<K::State, K::Command>) -> State<K> {
        let id = wtx.id;
        let stx = SignedTransaction::new(wtx, vec![self.hub.sign(&id)]);

        let session = match self
            .hub
            .messaging
            .initiate(
                &self.hub.my_identity,
                &self.counterparty,
                self.flow_name,
                self.hub.config.session_timeout,
            )
            .await
        {
            Ok(session) => session,
            Err(e) => return CoordinatorState::abort(e.into(), None),
        };

        if let Err(e) = session.send(&SigningMessage::Proposal(stx.clone())).await {
            return CoordinatorState::abort(e.into(), None);
        }
        debug!(flow = self.flow_name, tx_id = %id, "proposal sent");
        CoordinatorState::AwaitingCounterSignature { stx, session }
    }

    async fn await_signature(
        &self,
        stx: SignedTransaction<K::State, K::Command>,
        mut session: FlowSession,
    ) -> State<K> {
        let message = session
            .receive::<SigningMessage<K::State, K::Command>>()
            .await;
        match message {
            Ok(SigningMessage::Signature(sig)) => {
                if sig.by != self.counterparty.owning_key || !sig.verify(&stx.id()) {
                    let error = FlowError::AuthorizationDenied(format!(
                        "invalid counter-signature from {}",
                        self.counterparty.name
                    ));
                    return CoordinatorState::abort(error, Some(session));
                }
                let stx = stx.with_additional_signature(sig);
                match stx.verify_required_signatures() {
                    Ok(()) => CoordinatorState::Notarizing { stx, session },
                    Err(e) => CoordinatorState::abort(e.into(), Some(session)),
                }
            }
            Ok(SigningMessage::Rejected(rejection)) => {
                let error = FlowError::from(rejection);
                warn!(flow = self.flow_name, %error, "counterparty refused to sign");
                CoordinatorState::abort(error, None)
            }
            Ok(other) => {
                let error = FlowError::SessionFailure(format!(
                    "unexpected {} message while awaiting signature",
                    other.kind()
                ));
                CoordinatorState::abort(error, Some(session))
            }
            Err(e) => CoordinatorState::abort(e.into(), Some(session)),
        }
    }

    async fn notarise(
        &self,
        stx: SignedTransaction<K::State, K::Command>,
        session: FlowSession,
    ) -> State<K> {
        let request = NotarisationRequest {
            tx_id: stx.id(),
            inputs: stx.tx.input_refs(),
            time_window: stx.tx.time_window,
            notary: stx.tx.notary.name.clone(),
            requester: self.hub.my_identity.clone(),
        };

        let response = match self.hub.notary.notarise(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(flow = self.flow_name, tx_id = %stx.id(), error = %e, "notarisation failed");
                return CoordinatorState::abort(e.into(), Some(session));
            }
        };

        if response.signature.by != stx.tx.notary.owning_key || !response.signature.verify(&stx.id())
        {
            let error =
                FlowError::NotaryRejected("notary signature does not verify".to_string());
            return CoordinatorState::abort(error, Some(session));
        }

        let stx = stx.with_additional_signature(response.signature);
        self.hub.storage.record_transaction(&stx);

        if let Err(e) = session.send(&SigningMessage::Finalised(stx.clone())).await {
            warn!(
                flow = self.flow_name,
                tx_id = %stx.id(),
                error = %e,
                "could not deliver final transaction to counterparty"
            );
        }
        CoordinatorState::Final(stx)
    }

    async fn abort(&self, error: &FlowError, session: Option<FlowSession>) {
        warn!(flow = self.flow_name, error = %error, "flow aborted");
        if let Some(session) = session {
            let notice: SigningMessage<K::State, K::Command> =
                SigningMessage::Aborted(error.to_string());
            if let Err(e) = session.send(&notice).await {
                debug!(flow = self.flow_name, error = %e, "abort notice not delivered");
            }
        }
    }
}

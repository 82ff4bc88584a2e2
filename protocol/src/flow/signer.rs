//! # Counter-signer
//!
//! The responding side of a two-party signing flow. Triggered by an
//! inbound session, it reviews the proposal and either signs it or sends
//! back the reason it will not:
//!
//! ```text
//! Reviewing ──> Signed ──> (await finality, record)
//!     │
//!     └──────> Rejected
//! ```
//!
//! Review is generic: the proposal must be intact, its signatures valid,
//! and every required signer other than us must already have signed. The
//! domain-specific acceptance checks come from a [`SigningPolicy`]. The
//! counter-signer does not re-run the contract. That is the initiator's
//! job before it proposes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::error::FlowError;
use super::hub::ServiceHub;
use super::messages::{Rejection, SigningMessage};
use crate::network::{FlowSession, Responder};
use crate::transaction::{CommandData, ContractState, SignedTransaction};

/// Domain acceptance rules applied before counter-signing.
pub trait SigningPolicy: Send + Sync + 'static {
    type State: ContractState;
    type Command: CommandData;

    /// The flow name this policy answers.
    fn flow_name(&self) -> &'static str;

    /// Returns the first failed check, normally as
    /// [`FlowError::AuthorizationDenied`].
    fn check(
        &self,
        hub: &ServiceHub<Self::State, Self::Command>,
        stx: &SignedTransaction<Self::State, Self::Command>,
    ) -> Result<(), FlowError>;
}

/// Fails with [`FlowError::AuthorizationDenied`] carrying `reason` when
/// `condition` is false.
pub fn deny_unless(condition: bool, reason: &str) -> Result<(), FlowError> {
    if condition {
        Ok(())
    } else {
        Err(FlowError::AuthorizationDenied(reason.to_string()))
    }
}

/// Where a counter-signer is in its review.
#[derive(Debug)]
pub enum ResponderState<S, C> {
    Reviewing(SignedTransaction<S, C>),
    Signed(SignedTransaction<S, C>),
    Rejected(FlowError),
}

/// A responder that counter-signs proposals accepted by `P`.
pub struct CounterSigner<P: SigningPolicy> {
    hub: Arc<ServiceHub<P::State, P::Command>>,
    policy: P,
}

impl<P: SigningPolicy> CounterSigner<P> {
    pub fn new(hub: Arc<ServiceHub<P::State, P::Command>>, policy: P) -> Self {
        Self { hub, policy }
    }

    fn review(&self, stx: &SignedTransaction<P::State, P::Command>) -> Result<(), FlowError> {
        stx.check_integrity()?;
        stx.verify_signatures_except(std::slice::from_ref(self.hub.my_key()))?;
        self.policy.check(&self.hub, stx)
    }

    async fn await_finality(
        &self,
        session: &mut FlowSession,
        proposed: &SignedTransaction<P::State, P::Command>,
    ) -> Result<SignedTransaction<P::State, P::Command>, FlowError> {
        match session
            .receive::<SigningMessage<P::State, P::Command>>()
            .await?
        {
            SigningMessage::Finalised(ftx) => {
                if ftx.id() != proposed.id() {
                    return Err(FlowError::MalformedRequest(
                        "finalised transaction does not match the proposal".to_string(),
                    ));
                }
                ftx.check_integrity()?;
                ftx.verify_required_signatures()?;
                if !ftx.is_signed_by(&ftx.tx.notary.owning_key) {
                    return Err(FlowError::AuthorizationDenied(
                        "finalised transaction is missing the notary signature".to_string(),
                    ));
                }
                Ok(ftx)
            }
            SigningMessage::Aborted(reason) => Err(FlowError::SessionFailure(format!(
                "initiator aborted: {}",
                reason
            ))),
            other => Err(FlowError::SessionFailure(format!(
                "unexpected {} message while awaiting finality",
                other.kind()
            ))),
        }
    }

    async fn send_rejection(&self, session: &FlowSession, error: &FlowError) {
        let message: SigningMessage<P::State, P::Command> =
            SigningMessage::Rejected(Rejection::from(error));
        if let Err(e) = session.send(&message).await {
            debug!(flow = self.policy.flow_name(), error = %e, "rejection not delivered");
        }
    }
}

#[async_trait]
impl<P: SigningPolicy> Responder for CounterSigner<P> {
    fn flow_name(&self) -> &'static str {
        self.policy.flow_name()
    }

    async fn respond(&self, mut session: FlowSession) -> Result<(), FlowError> {
        let flow = self.policy.flow_name();
        let proposal = match session
            .receive::<SigningMessage<P::State, P::Command>>()
            .await
        {
            Ok(SigningMessage::Proposal(stx)) => stx,
            Ok(SigningMessage::Aborted(reason)) => {
                return Err(FlowError::SessionFailure(format!(
                    "initiator aborted: {}",
                    reason
                )));
            }
            Ok(other) => {
                let error =
                    FlowError::MalformedRequest(format!("expected a proposal, got {}", other.kind()));
                self.send_rejection(&session, &error).await;
                return Err(error);
            }
            Err(e) => {
                let error: FlowError = e.into();
                if matches!(error, FlowError::MalformedRequest(_)) {
                    self.send_rejection(&session, &error).await;
                }
                return Err(error);
            }
        };

        let mut state = ResponderState::Reviewing(proposal);
        loop {
            state = match state {
                ResponderState::Reviewing(stx) => match self.review(&stx) {
                    Ok(()) => ResponderState::Signed(stx),
                    Err(e) => ResponderState::Rejected(e),
                },
                ResponderState::Signed(stx) => {
                    let sig = self.hub.sign(&stx.id());
                    let reply: SigningMessage<P::State, P::Command> = SigningMessage::Signature(sig);
                    session.send(&reply).await?;
                    debug!(flow, tx_id = %stx.id(), "counter-signature sent");

                    let ftx = self.await_finality(&mut session, &stx).await?;
                    let newly_recorded = self.hub.storage.record_transaction(&ftx);
                    info!(
                        flow,
                        tx_id = %ftx.id(),
                        me = %self.hub.my_identity.name,
                        newly_recorded,
                        "recorded finalised transaction"
                    );
                    return Ok(());
                }
                ResponderState::Rejected(error) => {
                    warn!(
                        flow,
                        from = %session.counterparty().name,
                        error = %error,
                        "refusing to sign"
                    );
                    self.send_rejection(&session, &error).await;
                    return Err(error);
                }
            };
        }
    }
}

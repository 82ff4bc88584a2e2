//! # Node Dispatcher
//!
//! A `Node` owns a party's inbox and turns inbound sessions into responder
//! flows. Responders are registered per flow name before the node starts.
//! Each accepted session runs in its own tokio task, so one slow
//! counterparty never holds up another.
//!
//! ```text
//! new() -> register_responder()* -> spawn(inbox) -> [dispatching] -> inbox closed
//! ```
//!
//! A session for a flow name with no registered responder is refused with
//! a reject frame, which the initiator sees as [`SessionError::Rejected`].
//!
//! [`SessionError::Rejected`]: super::session::SessionError::Rejected

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messaging::InboundSession;
use super::session::FlowSession;
use crate::flow::FlowError;
use crate::identity::Party;

/// The responding half of a flow.
#[async_trait]
pub trait Responder: Send + Sync + 'static {
    /// The flow name this responder answers.
    fn flow_name(&self) -> &'static str;

    /// Runs the responder over `session` until it completes or fails.
    async fn respond(&self, session: FlowSession) -> Result<(), FlowError>;
}

/// Dispatches inbound sessions to registered responders.
pub struct Node {
    identity: Party,
    responders: HashMap<&'static str, Arc<dyn Responder>>,
}

impl Node {
    pub fn new(identity: Party) -> Self {
        Self {
            identity,
            responders: HashMap::new(),
        }
    }

    pub fn identity(&self) -> &Party {
        &self.identity
    }

    /// Registers `responder` under its flow name, replacing any earlier one.
    pub fn register_responder(&mut self, responder: Arc<dyn Responder>) -> &mut Self {
        debug!(party = %self.identity.name, flow = responder.flow_name(), "responder registered");
        self.responders.insert(responder.flow_name(), responder);
        self
    }

    /// Flow names this node answers.
    pub fn flow_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.responders.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Starts dispatching sessions from `inbox`. The task ends when every
    /// sender of the inbox is gone.
    pub fn spawn(self, inbox: mpsc::Receiver<InboundSession>) -> JoinHandle<()> {
        tokio::spawn(self.run(inbox))
    }

    async fn run(self, mut inbox: mpsc::Receiver<InboundSession>) {
        info!(party = %self.identity.name, flows = ?self.flow_names(), "node dispatcher started");

        while let Some(InboundSession { flow_name, session }) = inbox.recv().await {
            let Some(responder) = self.responders.get(flow_name.as_str()).cloned() else {
                warn!(
                    party = %self.identity.name,
                    flow = %flow_name,
                    from = %session.counterparty().name,
                    "no responder registered, rejecting session"
                );
                let reason = format!("no responder registered for flow '{}'", flow_name);
                if let Err(e) = session.reject(&reason).await {
                    debug!(error = %e, "could not deliver session rejection");
                }
                continue;
            };

            let party = self.identity.name.clone();
            tokio::spawn(async move {
                let session_id = session.id();
                let from = session.counterparty().name.clone();
                match responder.respond(session).await {
                    Ok(()) => {
                        debug!(%party, flow = %flow_name, session = %session_id, "responder finished");
                    }
                    Err(e) => {
                        warn!(
                            %party,
                            flow = %flow_name,
                            session = %session_id,
                            %from,
                            error = %e,
                            "responder failed"
                        );
                    }
                }
            });
        }

        info!(party = %self.identity.name, "node dispatcher stopped");
    }
}

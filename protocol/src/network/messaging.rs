//! In-process message routing between nodes.
//!
//! Each node registers an inbox under its party name. Initiating a flow
//! creates a fresh [`FlowSession`] pair, keeps the initiator's end, and
//! delivers the responder's end to the target node's inbox tagged with the
//! flow name. The node's dispatcher (see [`super::node`]) takes it from
//! there.

use std::fmt;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use super::session::{FlowSession, SessionError};
use crate::config::INBOX_CHANNEL_CAPACITY;
use crate::identity::{Party, PartyName};

/// A session opened by a remote party, waiting for a responder.
#[derive(Debug)]
pub struct InboundSession {
    pub flow_name: String,
    pub session: FlowSession,
}

/// Routes new sessions to registered inboxes.
#[derive(Default)]
pub struct MessagingService {
    inboxes: DashMap<PartyName, mpsc::Sender<InboundSession>>,
}

impl fmt::Debug for MessagingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagingService")
            .field("inboxes", &self.inboxes.len())
            .finish()
    }
}

impl MessagingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an inbox for `party` and returns its receiving end.
    /// Registering again replaces the previous inbox.
    pub fn register(&self, party: &Party) -> mpsc::Receiver<InboundSession> {
        let (tx, rx) = mpsc::channel(INBOX_CHANNEL_CAPACITY);
        self.inboxes.insert(party.name.clone(), tx);
        debug!(party = %party.name, "inbox registered");
        rx
    }

    /// Removes `name`'s inbox. Sessions already delivered are unaffected.
    pub fn unregister(&self, name: &PartyName) {
        self.inboxes.remove(name);
    }

    pub fn is_registered(&self, name: &PartyName) -> bool {
        self.inboxes.contains_key(name)
    }

    /// Opens a session from `from` to `to` for `flow_name`.
    ///
    /// Returns the initiator's end once the responder's end has been queued
    /// in `to`'s inbox. Queueing waits at most `timeout`. Whether anyone
    /// answers is discovered on the first receive.
    pub async fn initiate(
        &self,
        from: &Party,
        to: &Party,
        flow_name: &str,
        timeout: Duration,
    ) -> Result<FlowSession, SessionError> {
        let inbox = self
            .inboxes
            .get(&to.name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::UnknownParty(to.name.clone()))?;

        let (initiator_end, responder_end) = FlowSession::pair(from.clone(), to.clone(), timeout);
        let session_id = initiator_end.id();

        let delivery = inbox.send(InboundSession {
            flow_name: flow_name.to_string(),
            session: responder_end,
        });
        match tokio::time::timeout(timeout, delivery).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Err(SessionError::Closed),
            Err(_) => return Err(SessionError::Timeout(timeout)),
        }

        debug!(
            session = %session_id,
            flow = flow_name,
            from = %from.name,
            to = %to.name,
            "session initiated"
        );
        Ok(initiator_end)
    }
}

//! Point-to-point flow sessions.
//!
//! A [`FlowSession`] is one end of a reliable, ordered, bidirectional pipe
//! between two parties running a flow. In-process the pipe is a pair of
//! `tokio::sync::mpsc` channels carrying JSON frames. Every receive is
//! bounded by the session timeout, so a silent counterparty surfaces as
//! [`SessionError::Timeout`] instead of hanging the flow forever.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

use crate::config::{SESSION_CHANNEL_CAPACITY, WIRE_PROTOCOL_VERSION};
use crate::identity::{Party, PartyName};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transport-level session failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The other end hung up.
    #[error("session closed by counterparty")]
    Closed,

    /// Nothing arrived within the session timeout.
    #[error("no message from counterparty within {0:?}")]
    Timeout(Duration),

    /// A frame could not be encoded or decoded.
    #[error("message serialization failed: {0}")]
    Serialization(String),

    /// No inbox is registered for the named party.
    #[error("unknown party {0}")]
    UnknownParty(PartyName),

    /// The counterparty's node refused the session.
    #[error("session rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Wire frames
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    version: u16,
    body: FrameBody,
}

#[derive(Debug, Serialize, Deserialize)]
enum FrameBody {
    Payload(serde_json::Value),
    Reject(String),
}

// ---------------------------------------------------------------------------
// FlowSession
// ---------------------------------------------------------------------------

/// One end of a flow session.
#[derive(Debug)]
pub struct FlowSession {
    id: Uuid,
    counterparty: Party,
    outbound: mpsc::Sender<Vec<u8>>,
    inbound: mpsc::Receiver<Vec<u8>>,
    timeout: Duration,
}

impl FlowSession {
    /// Creates both ends of a session between `initiator` and `responder`.
    ///
    /// Returns `(initiator_end, responder_end)`. Each end's counterparty is
    /// the other party.
    pub fn pair(initiator: Party, responder: Party, timeout: Duration) -> (Self, Self) {
        let id = Uuid::new_v4();
        let (to_responder, from_initiator) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let (to_initiator, from_responder) = mpsc::channel(SESSION_CHANNEL_CAPACITY);

        let initiator_end = Self {
            id,
            counterparty: responder,
            outbound: to_responder,
            inbound: from_responder,
            timeout,
        };
        let responder_end = Self {
            id,
            counterparty: initiator,
            outbound: to_initiator,
            inbound: from_initiator,
            timeout,
        };
        (initiator_end, responder_end)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The party at the other end.
    pub fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Sends a message to the counterparty.
    pub async fn send<T: Serialize>(&self, message: &T) -> Result<(), SessionError> {
        let value =
            serde_json::to_value(message).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.send_frame(FrameBody::Payload(value)).await
    }

    /// Refuses the session with `reason`. The counterparty's next receive
    /// fails with [`SessionError::Rejected`].
    pub async fn reject(&self, reason: &str) -> Result<(), SessionError> {
        self.send_frame(FrameBody::Reject(reason.to_string())).await
    }

    /// Receives the next message, waiting at most the session timeout.
    pub async fn receive<T: DeserializeOwned>(&mut self) -> Result<T, SessionError> {
        let bytes = match tokio::time::timeout(self.timeout, self.inbound.recv()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Err(SessionError::Closed),
            Err(_) => return Err(SessionError::Timeout(self.timeout)),
        };
        trace!(session = %self.id, bytes = bytes.len(), "frame received");

        let frame: Frame =
            serde_json::from_slice(&bytes).map_err(|e| SessionError::Serialization(e.to_string()))?;
        if frame.version != WIRE_PROTOCOL_VERSION {
            return Err(SessionError::Serialization(format!(
                "unsupported wire version {} (expected {})",
                frame.version, WIRE_PROTOCOL_VERSION
            )));
        }
        match frame.body {
            FrameBody::Payload(value) => {
                serde_json::from_value(value).map_err(|e| SessionError::Serialization(e.to_string()))
            }
            FrameBody::Reject(reason) => Err(SessionError::Rejected(reason)),
        }
    }

    async fn send_frame(&self, body: FrameBody) -> Result<(), SessionError> {
        let frame = Frame {
            version: WIRE_PROTOCOL_VERSION,
            body,
        };
        let bytes =
            serde_json::to_vec(&frame).map_err(|e| SessionError::Serialization(e.to_string()))?;
        trace!(session = %self.id, bytes = bytes.len(), "frame sent");
        self.outbound
            .send(bytes)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Pushes raw bytes onto the outbound channel, bypassing framing.
    #[cfg(test)]
    pub(crate) async fn send_raw(&self, bytes: Vec<u8>) -> Result<(), SessionError> {
        self.outbound
            .send(bytes)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dummy_party;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Ping {
        Ping(u32),
        Pong(u32),
    }

    fn pair(timeout: Duration) -> (FlowSession, FlowSession) {
        FlowSession::pair(dummy_party("Alice Corp"), dummy_party("Bob Corp"), timeout)
    }

    #[tokio::test]
    async fn test_messages_flow_both_ways_in_order() {
        let (mut a, mut b) = pair(Duration::from_secs(1));
        a.send(&Ping::Ping(1)).await.unwrap();
        a.send(&Ping::Ping(2)).await.unwrap();
        assert_eq!(b.receive::<Ping>().await.unwrap(), Ping::Ping(1));
        assert_eq!(b.receive::<Ping>().await.unwrap(), Ping::Ping(2));

        b.send(&Ping::Pong(3)).await.unwrap();
        assert_eq!(a.receive::<Ping>().await.unwrap(), Ping::Pong(3));
        assert_eq!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_counterparties_are_swapped() {
        let alice = dummy_party("Alice Corp");
        let bob = dummy_party("Bob Corp");
        let (a, b) = FlowSession::pair(alice.clone(), bob.clone(), Duration::from_secs(1));
        assert_eq!(a.counterparty(), &bob);
        assert_eq!(b.counterparty(), &alice);
    }

    #[tokio::test]
    async fn test_receive_times_out() {
        let (mut a, _b) = pair(Duration::from_millis(50));
        match a.receive::<Ping>().await {
            Err(SessionError::Timeout(d)) => assert_eq!(d, Duration::from_millis(50)),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_counterparty_closes_session() {
        let (mut a, b) = pair(Duration::from_secs(1));
        drop(b);
        assert_eq!(a.receive::<Ping>().await, Err(SessionError::Closed));
        assert_eq!(a.send(&Ping::Ping(1)).await, Err(SessionError::Closed));
    }

    #[tokio::test]
    async fn test_reject_surfaces_reason() {
        let (mut a, b) = pair(Duration::from_secs(1));
        b.reject("no responder for flow").await.unwrap();
        assert_eq!(
            a.receive::<Ping>().await,
            Err(SessionError::Rejected("no responder for flow".to_string()))
        );
    }

    #[tokio::test]
    async fn test_garbage_is_a_serialization_error() {
        let (a, mut b) = pair(Duration::from_secs(1));
        a.send_raw(b"not json".to_vec()).await.unwrap();
        assert!(matches!(
            b.receive::<Ping>().await,
            Err(SessionError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_message_type_is_a_serialization_error() {
        let (a, mut b) = pair(Duration::from_secs(1));
        a.send(&"a string").await.unwrap();
        assert!(matches!(
            b.receive::<Ping>().await,
            Err(SessionError::Serialization(_))
        ));
    }
}

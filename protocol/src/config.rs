//! # Protocol Configuration & Constants
//!
//! Every magic number in Tally lives here. If you're hardcoding a constant
//! somewhere else, move it here and give it a name.
//!
//! Runtime-tunable values (timeouts, window lengths) are collected into
//! [`FlowConfig`], which the node builds once at startup from its config file
//! and hands to every flow through the service hub.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the ledger protocol.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Wire format version for session messages. Separate from the crate
/// version because message layout changes don't always mean rule changes.
pub const WIRE_PROTOCOL_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 for every party and notary signature.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Signing key length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Transaction ids are double SHA-256 of the canonical body bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// Length of the validity window attached to every proposed transaction.
/// The coordinator stamps `[now, now + TIME_WINDOW)` before local
/// verification, and the notary refuses to commit outside of it.
pub const TIME_WINDOW: Duration = Duration::from_secs(10);

/// How long a flow waits on a counterparty before giving up on the session.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Transaction Limits
// ---------------------------------------------------------------------------

/// Maximum number of inputs per transaction. Keeps verification bounded.
pub const MAX_TX_INPUTS: usize = 256;

/// Maximum number of outputs per transaction.
pub const MAX_TX_OUTPUTS: usize = 256;

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

/// Buffered messages per session direction. A signing exchange never has
/// more than two messages in flight, so this is mostly headroom.
pub const SESSION_CHANNEL_CAPACITY: usize = 16;

/// Pending inbound sessions a node will queue before initiators block.
pub const INBOX_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// FlowConfig
// ---------------------------------------------------------------------------

/// Runtime knobs for signing flows.
///
/// Both values are policy, not protocol: a deployment talking to slow
/// counterparties may stretch the session timeout, and tests shrink it to
/// keep failure cases fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Bounded wait applied to every session receive.
    pub session_timeout: Duration,
    /// Length of the time window stamped on proposals.
    pub time_window: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            session_timeout: SESSION_TIMEOUT,
            time_window: TIME_WINDOW,
        }
    }
}

impl FlowConfig {
    /// Returns a copy with a different session timeout.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Returns a copy with a different time window length.
    pub fn with_time_window(mut self, window: Duration) -> Self {
        self.time_window = window;
        self
    }
}

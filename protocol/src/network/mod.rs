//! # Network Module
//!
//! Session transport between parties. Flows talk to their counterparties
//! over [`FlowSession`]s; the [`MessagingService`] routes newly opened
//! sessions to the target party's inbox, and each party's [`Node`]
//! dispatcher starts the responder registered for the requested flow.
//!
//! ## Architecture
//!
//! ```text
//! session.rs    FlowSession: ordered, framed, timeout-bounded message pipe
//! messaging.rs  MessagingService: party name → inbox routing
//! node.rs       Node dispatcher and the Responder trait
//! ```
//!
//! ## Design Decisions
//!
//! - Everything is in-process over `tokio::sync::mpsc`. Frames are JSON so
//!   that a socket transport could carry the same bytes unchanged.
//! - Every frame carries [`crate::config::WIRE_PROTOCOL_VERSION`]. A frame
//!   with any other version is a serialization error, not a silent
//!   misread.
//! - Receives are always bounded. The bound comes from
//!   [`crate::config::FlowConfig::session_timeout`].

pub mod messaging;
pub mod node;
pub mod session;

pub use messaging::{InboundSession, MessagingService};
pub use node::{Node, Responder};
pub use session::{FlowSession, SessionError};

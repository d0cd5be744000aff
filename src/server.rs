//! TCP chat server.
//!
//! This module provides the network layer that accepts clients, tracks who is
//! online and fans chat lines out to everyone.
//!
//! ## Architecture
//!
//! ```text
//! +--------+
//! | Server |  <- Accepts TCP connections
//! +--------+
//!      |
//!      v
//! +---------+     +------------+
//! | Session | --> | Connection |  <- Line reader + writer task
//! +---------+     +------------+
//!      |
//!      v
//! +----------+     +-----------+
//! | Registry | <-- | broadcast |  <- Snapshot, unlock, enqueue per recipient
//! +----------+     +-----------+
//! ```
//!
//! ## Terminology
//!
//! - **Server**: TCP listener that spawns sessions
//! - **Session**: Per-client state machine (awaiting name, active, terminated)
//! - **Connection**: Framed read half plus an outbox drained by a writer task
//! - **Registry**: Sessions that have joined, guarded by a reader/writer lock
//! - **broadcast**: Delivery of one message to every registered session

pub mod broadcast;
pub mod connection;
pub mod listener;
pub mod registry;
pub mod session;

pub use broadcast::broadcast;
pub use listener::Server;
pub use registry::Registry;
pub use session::{Session, SessionId, SessionState};

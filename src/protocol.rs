//! Line-oriented chat protocol.
//!
//! Clients and the server exchange free text, carried as raw bytes. Every client line ends with
//! `\n`; the first one names the client, later ones are chat messages or a
//! quit command.
//!
//! ## Architecture
//!
//! ```text
//! +----------+                             +----------+
//! |  Client  |  --- line (ClientLine) -->  |  Server  |
//! | (nc/tcp) |  <-- ServerMessage     ---  |(chatcast)|
//! +----------+                             +----------+
//!               ^                      ^
//!               |      LineCodec       |
//!               +----------------------+
//! ```
//!
//! ## Terminology
//!
//! - **ClientLine**: Classification of a line from a named client (quit or text)
//! - **ServerMessage**: Prompts and broadcast lines sent to clients
//! - **Codec**: `\n` framing for the client-to-server direction

pub mod backend;
pub mod codec;
pub mod frontend;

pub use backend::{DEFAULT_USERNAME, ServerMessage};
pub use codec::LineCodec;
pub use frontend::ClientLine;

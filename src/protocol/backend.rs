use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

/// Name given to a client whose first line is empty.
pub const DEFAULT_USERNAME: &str = "Anonymous";

/// Messages sent by the backend (server) to clients.
///
/// Usernames and chat text are the raw bytes the client sent, written back
/// unchanged. Prompts are written without a trailing newline so the client's cursor
/// stays on the prompt line. Everything else is a `\n`-terminated line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Sent once right after a connection is accepted.
    NamePrompt,
    /// Private prompt sent to a session after it joined.
    UserPrompt { username: Bytes },
    /// Broadcast when a session joins.
    Joined { username: Bytes },
    /// Broadcast when a session leaves.
    Left { username: Bytes },
    /// A chat line from `username`.
    Chat { username: Bytes, text: Bytes },
}

impl ServerMessage {
    /// Serializes the message into its wire form.
    ///
    /// Broadcasts encode once and share the resulting `Bytes` with every
    /// recipient.
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::new();
        match self {
            ServerMessage::NamePrompt => dst.put_slice(b"type your name: "),
            ServerMessage::UserPrompt { username } => {
                dst.put_u8(b'[');
                dst.put_slice(username);
                dst.put_slice(b"]> ");
            }
            ServerMessage::Joined { username } => {
                dst.put_slice(b">>> ");
                dst.put_slice(username);
                dst.put_slice(b" joined the chat\n");
            }
            ServerMessage::Left { username } => {
                dst.put_slice(b">>> ");
                dst.put_slice(username);
                dst.put_slice(b" left the chat\n");
            }
            ServerMessage::Chat { username, text } => {
                dst.put_slice(username);
                dst.put_slice(b": ");
                dst.put_slice(text);
                dst.put_u8(b'\n');
            }
        }
        dst.freeze()
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.encode()))
    }
}

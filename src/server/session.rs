use std::fmt;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};

use crate::protocol::{ClientLine, DEFAULT_USERNAME, ServerMessage};
use crate::server::broadcast::broadcast;
use crate::server::connection::{Connection, Outbox};
use crate::server::registry::Registry;

/// Identifier assigned to each accepted connection. Unique per server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for the first line.
    AwaitingName,
    /// Named and registered; lines are chat messages.
    Active,
    /// Quit, disconnected or failed. Terminal.
    Terminated,
}

/// Server-side state of one connected client.
///
/// A session is shared between its own read loop, the [`Registry`] (while
/// joined) and any broadcast that upgraded a snapshot handle to it. It is
/// dropped when the last of those lets go, which also stops its writer task.
///
/// NOTE: Failures are never retried. Any read or write error, as well as EOF,
/// ends the session through the same [`leave`](Session::leave) path.
pub struct Session {
    id: SessionId,
    /// Set exactly once, when the first line arrives. Raw bytes as sent.
    username: OnceLock<Bytes>,
    state: Mutex<SessionState>,
    outbox: Outbox,
    /// Cancelled by the writer task when a write to this client fails.
    write_failed: CancellationToken,
    registry: Arc<Registry>,
}

impl Session {
    fn new(
        id: SessionId,
        registry: Arc<Registry>,
        outbox: Outbox,
        write_failed: CancellationToken,
    ) -> Self {
        Self {
            id,
            username: OnceLock::new(),
            state: Mutex::new(SessionState::AwaitingName),
            outbox,
            write_failed,
            registry,
        }
    }

    /// Starts a session on `stream`: sends the name prompt and spawns the read
    /// loop. The returned handle completes once the session has terminated.
    pub fn start<S>(stream: S, id: SessionId, registry: Arc<Registry>) -> JoinHandle<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let span = info_span!("session", %id);
        let _entered = span.enter();

        let write_failed = CancellationToken::new();
        let (connection, outbox) = Connection::open(stream, write_failed.clone());
        let session = Arc::new(Session::new(id, registry, outbox, write_failed));

        session.send(&ServerMessage::NamePrompt);
        tokio::spawn(session.run(connection).in_current_span())
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The name this session chose, once it has sent its first line.
    pub fn username(&self) -> Option<&[u8]> {
        self.username.get().map(|name| &name[..])
    }

    fn username_bytes(&self) -> Bytes {
        self.username.get().cloned().unwrap_or_default()
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Returns `true` while the session is active and a registry member.
    pub fn is_joined(&self) -> bool {
        self.state() == SessionState::Active && self.registry.contains(self.id)
    }

    /// Returns `false` once the connection's writer has stopped.
    pub(crate) fn is_live(&self) -> bool {
        !self.write_failed.is_cancelled() && !self.outbox.is_closed()
    }

    /// Enqueues pre-encoded bytes for this client without waiting.
    pub(crate) fn deliver(&self, bytes: Bytes) -> bool {
        self.outbox.send(bytes)
    }

    /// Sends a message to this client only. Best effort.
    fn send(&self, message: &ServerMessage) {
        if !self.deliver(message.encode()) {
            debug!("Dropped private message, writer is gone");
        }
    }

    async fn run<S>(self: Arc<Self>, mut connection: Connection<S>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        loop {
            let line = match connection.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Client closed the connection");
                    break;
                }
                Err(e) => {
                    debug!("Session ended: {}", e);
                    break;
                }
            };

            if self.handle_line(line) {
                break;
            }
        }

        self.leave();
    }

    /// Handles one line from the client.
    /// Returns true if the session should terminate.
    fn handle_line(self: &Arc<Self>, line: Bytes) -> bool {
        match self.state() {
            SessionState::AwaitingName => {
                self.join(line);
                false
            }
            SessionState::Active => match ClientLine::parse(line) {
                ClientLine::Quit => true,
                ClientLine::Text(text) => {
                    broadcast(
                        &self.registry,
                        &ServerMessage::Chat {
                            username: self.username_bytes(),
                            text,
                        },
                    );
                    false
                }
            },
            SessionState::Terminated => true,
        }
    }

    /// Takes `name` as this session's username and joins the chat.
    ///
    /// The session is registered before the join announcement goes out, so it
    /// receives its own announcement. Returns `false` if the session already
    /// had a name or has terminated.
    fn join(self: &Arc<Self>, name: Bytes) -> bool {
        let username = if name.is_empty() {
            Bytes::from_static(DEFAULT_USERNAME.as_bytes())
        } else {
            name
        };

        {
            let mut state = self.state.lock();
            if *state != SessionState::AwaitingName {
                return false;
            }
            if self.username.set(username).is_err() {
                return false;
            }
            *state = SessionState::Active;
            self.registry.insert(self.clone());
        }

        let username = self.username_bytes();
        info!(
            username = %String::from_utf8_lossy(&username),
            online = self.registry.len(),
            "Joined the chat"
        );

        broadcast(
            &self.registry,
            &ServerMessage::Joined {
                username: username.clone(),
            },
        );
        self.send(&ServerMessage::UserPrompt { username });
        true
    }

    /// Terminates the session.
    ///
    /// An active session is removed from the registry and then announced as
    /// gone, so it does not receive its own leave message. Only the first call
    /// does anything; later calls, and calls on a session that never named
    /// itself, return `false`.
    pub fn leave(&self) -> bool {
        {
            let mut state = self.state.lock();
            let previous = std::mem::replace(&mut *state, SessionState::Terminated);
            if previous != SessionState::Active {
                return false;
            }
            self.registry.remove(self.id);
        }

        let username = self.username_bytes();
        info!(
            username = %String::from_utf8_lossy(&username),
            online = self.registry.len(),
            "Left the chat"
        );

        broadcast(&self.registry, &ServerMessage::Left { username });
        true
    }
}

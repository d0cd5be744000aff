use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::server::session::{Session, SessionId};

/// The set of sessions that have joined the chat.
///
/// Owns a strong handle to every member. Broadcasts never hold the lock while
/// writing: they take a [`snapshot`](Registry::snapshot) of weak handles and
/// release the lock before touching any connection.
///
/// Lock order: a session's state lock may be held while calling `insert` or
/// `remove`, never the other way round.
pub struct Registry {
    // id -> joined session
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a session that just named itself.
    ///
    /// Each session joins at most once; inserting the same id twice replaces
    /// the previous handle.
    pub fn insert(&self, session: Arc<Session>) {
        self.sessions.write().insert(session.id(), session);
    }

    /// Removes a session. Returns `false` if it was not a member.
    pub fn remove(&self, id: SessionId) -> bool {
        self.sessions.write().remove(&id).is_some()
    }

    /// Copies the current membership as weak handles.
    ///
    /// Later inserts and removes do not affect the returned list. A handle may
    /// fail to upgrade if its session was torn down in the meantime.
    pub fn snapshot(&self) -> Vec<Weak<Session>> {
        self.sessions.read().values().map(Arc::downgrade).collect()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Usernames of all members, sorted. Bytes that are not UTF-8 are
    /// replaced for display.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sessions
            .read()
            .values()
            .filter_map(|s| {
                s.username()
                    .map(|name| String::from_utf8_lossy(name).into_owned())
            })
            .collect();
        names.sort();
        names
    }
}

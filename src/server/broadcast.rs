use tracing::trace;

use crate::protocol::ServerMessage;
use crate::server::registry::Registry;

/// Sends `message` to every session in the registry.
///
/// The registry lock is held only while copying the member list. The message
/// is encoded once and handed to each recipient's outbox, which never waits,
/// so a stalled client cannot hold up anyone else. Members that went away
/// after the snapshot are skipped, and a recipient whose write later fails
/// ends its own session. Nothing is reported back to the caller.
///
/// Returns the number of sessions the message was handed to.
pub fn broadcast(registry: &Registry, message: &ServerMessage) -> usize {
    let targets = registry.snapshot();
    let bytes = message.encode();

    let mut delivered = 0;
    for target in targets {
        let Some(session) = target.upgrade() else {
            trace!("Skipping session torn down since the snapshot");
            continue;
        };
        if !session.is_live() {
            trace!(id = %session.id(), "Skipping session with a dead connection");
            continue;
        }
        if session.deliver(bytes.clone()) {
            delivered += 1;
        }
    }
    delivered
}

//! Session table: which connected player gets pushes through which channel.

use std::collections::HashMap;

use mastermind_protocol::{PlayerId, ServerPush};
use tokio::sync::mpsc;

/// Channel feeding one connection's writer task.
pub type Outbound = mpsc::UnboundedSender<ServerPush>;

/// Maps each connected player to its outbound channel.
///
/// Owned by the hub. A player is registered when its connection is
/// accepted and removed when the connection ends; room membership is
/// tracked separately by the registry.
#[derive(Debug, Default)]
pub(crate) struct SessionTable {
    outbound: HashMap<PlayerId, Outbound>,
}

impl SessionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a connected player. Replaces any previous channel.
    pub(crate) fn register(&mut self, player_id: PlayerId, outbound: Outbound) {
        if self.outbound.insert(player_id, outbound).is_some() {
            tracing::warn!(%player_id, "player re-registered, old channel dropped");
        }
        tracing::debug!(%player_id, connected = self.outbound.len(), "session opened");
    }

    /// Forgets a player. Dropping the channel lets its writer task finish.
    pub(crate) fn remove(&mut self, player_id: PlayerId) -> bool {
        let removed = self.outbound.remove(&player_id).is_some();
        if removed {
            tracing::debug!(%player_id, connected = self.outbound.len(), "session closed");
        }
        removed
    }

    /// Queues a push for one player. Silently drops it when the player is
    /// not connected (or its writer is already gone).
    pub(crate) fn send(&self, player_id: PlayerId, push: ServerPush) -> bool {
        match self.outbound.get(&player_id) {
            Some(tx) => tx.send(push).is_ok(),
            None => false,
        }
    }

    pub(crate) fn is_connected(&self, player_id: PlayerId) -> bool {
        self.outbound.contains_key(&player_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.outbound.len()
    }
}

//! Process-wide registry of live connections and their room memberships.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use surrealdb::RecordId;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::realtime::messages::ServerMessage;

/// Identifier for one live connection, unique for the process lifetime.
pub type ConnectionId = u64;

/// A named realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// One per principal; carries that principal's notifications.
    Personal(String),
    /// One per tenant; carries tenant-wide broadcast events.
    Community(String),
    /// One per issue; carries live comment and status updates.
    Issue(String),
}

impl Room {
    pub fn personal(principal_id: &RecordId) -> Self {
        Self::Personal(principal_id.to_string())
    }

    pub fn community(tenant_id: &RecordId) -> Self {
        Self::Community(tenant_id.to_string())
    }

    pub fn issue(issue_id: &str) -> Self {
        Self::Issue(issue_id.to_string())
    }
}

#[derive(Default)]
struct RegistryInner {
    senders: HashMap<ConnectionId, UnboundedSender<ServerMessage>>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<Room>>,
}

/// Tracks which live connections belong to which rooms.
///
/// This is deliberately an explicit object owned by the transport layer and
/// handed by `Arc` to whoever fans out events — never an implicit global.
/// Membership is ephemeral and never persisted; on disconnect every
/// membership for that connection vanishes, and a reconnecting client must
/// rejoin explicitly.
///
/// Each connection gets its own unbounded channel, so within one room,
/// delivery to a given connection preserves publish order; across rooms
/// nothing is ordered. Sends to a closing connection are dropped silently
/// (best-effort, at-most-once).
#[derive(Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new connection, returning its id and the receiving end of
    /// its outbound channel. The connection belongs to no rooms yet.
    pub async fn register(&self) -> (ConnectionId, UnboundedReceiver<ServerMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.inner.write().await;
        inner.senders.insert(id, tx);
        inner.memberships.insert(id, HashSet::new());

        debug!("connection {id} registered");
        (id, rx)
    }

    /// Join a connection to a room. Unknown connections are ignored;
    /// joining the same room twice is a no-op.
    pub async fn join(&self, connection: ConnectionId, room: Room) {
        let mut inner = self.inner.write().await;
        if !inner.senders.contains_key(&connection) {
            return;
        }

        debug!("connection {connection} joined {room:?}");
        inner.rooms.entry(room.clone()).or_default().insert(connection);
        inner
            .memberships
            .entry(connection)
            .or_default()
            .insert(room);
    }

    /// Drop a connection and every membership it holds.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().await;
        inner.senders.remove(&connection);

        if let Some(rooms) = inner.memberships.remove(&connection) {
            for room in rooms {
                if let Some(members) = inner.rooms.get_mut(&room) {
                    members.remove(&connection);
                    if members.is_empty() {
                        inner.rooms.remove(&room);
                    }
                }
            }
        }

        debug!("connection {connection} disconnected");
    }

    /// Deliver an event to every connection currently joined to a room,
    /// at most once per connection. Returns the number of connections the
    /// event was handed to. Send failures (connection mid-teardown) are
    /// ignored.
    pub async fn publish(&self, room: &Room, message: ServerMessage) -> usize {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for connection in members {
            if let Some(sender) = inner.senders.get(connection) {
                if sender.send(message.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.senders.len()
    }

    /// Number of connections currently joined to a room.
    pub async fn room_size(&self, room: &Room) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(room)
            .map(|members| members.len())
            .unwrap_or(0)
    }
}

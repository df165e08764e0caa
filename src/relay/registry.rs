use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// What the relay knows about one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    /// Room the connection currently belongs to, if it has joined one.
    pub current_room: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Registry of every connection currently attached to the relay.
///
/// Owned exclusively by the router task, so plain maps are enough; all
/// mutation happens on one thread. Operations on unknown connection ids
/// are harmless no-ops because disconnects race with in-flight frames.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, ConnectionRecord>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry {
            connections: HashMap::new(),
        }
    }

    /// Adds a connection with no room. Registering an id twice keeps the
    /// existing record, room membership included.
    pub fn register(&mut self, connection_id: &str) {
        self.connections
            .entry(connection_id.to_string())
            .or_insert_with(|| ConnectionRecord {
                current_room: None,
                connected_at: Utc::now(),
            });
    }

    pub fn is_registered(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Points the connection at a room. Unknown ids are ignored.
    pub fn set_room(&mut self, connection_id: &str, room_id: &str) {
        match self.connections.get_mut(connection_id) {
            Some(record) => record.current_room = Some(room_id.to_string()),
            None => debug!(
                connection_id = %connection_id,
                room_id = %room_id,
                "Cannot set room for unknown connection"
            ),
        }
    }

    /// Room the connection is currently in, if any.
    pub fn room_of(&self, connection_id: &str) -> Option<String> {
        self.connections
            .get(connection_id)
            .and_then(|record| record.current_room.clone())
    }

    /// Removes the connection and returns its final record, or `None` if
    /// the id was never registered or already removed.
    pub fn unregister(&mut self, connection_id: &str) -> Option<ConnectionRecord> {
        self.connections.remove(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

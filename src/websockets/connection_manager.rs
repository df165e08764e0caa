use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::relay::{PeerSender, RelayFrame};

/// Maps live connection ids to their outbound message channels.
///
/// The lock is std, not tokio: the relay task calls `send` from
/// synchronous code and nothing is held across an await. Sending down a
/// closed channel just drops the message; the connection task noticing
/// the closed socket is responsible for cleanup.
pub struct ConnectionManager {
    // connection_id -> sender
    connections: RwLock<HashMap<String, mpsc::UnboundedSender<String>>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().unwrap();
        connections.insert(connection_id, sender);
    }

    pub fn remove_connection(&self, connection_id: &str) {
        let mut connections = self.connections.write().unwrap();
        connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().unwrap().len()
    }
}

impl PeerSender for ConnectionManager {
    fn send(&self, connection_id: &str, frame: &RelayFrame) {
        let message = match serde_json::to_string(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Failed to serialize relay frame");
                return;
            }
        };

        let connections = self.connections.read().unwrap();
        match connections.get(connection_id) {
            Some(sender) => {
                if sender.send(message).is_err() {
                    debug!(
                        connection_id = %connection_id,
                        "Peer channel closed, dropping frame"
                    );
                }
            }
            None => debug!(
                connection_id = %connection_id,
                "No connection for peer, dropping frame"
            ),
        }
    }
}

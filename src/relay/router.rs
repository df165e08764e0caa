use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::events::{RelayEventKind, RelayFrame};
use super::registry::ConnectionRegistry;
use super::rooms::RoomDirectory;

/// Outbound side of the relay. The router fans frames out through this
/// without waiting for delivery; a failed or slow peer must never stall
/// the others, so implementations drop on error rather than report it.
pub trait PeerSender: Send + Sync {
    fn send(&self, connection_id: &str, frame: &RelayFrame);
}

/// Routes client frames between connections sharing a room.
///
/// The router owns both the connection registry and the room directory
/// and is driven by a single task, so every frame is handled to
/// completion before the next one starts. That alone guarantees a
/// connection is never in two rooms and that frames from one sender
/// reach each peer in send order.
pub struct EventRouter {
    connections: ConnectionRegistry,
    rooms: RoomDirectory,
    transport: Arc<dyn PeerSender>,
}

impl EventRouter {
    pub fn new(transport: Arc<dyn PeerSender>) -> Self {
        EventRouter {
            connections: ConnectionRegistry::new(),
            rooms: RoomDirectory::new(),
            transport,
        }
    }

    /// Registers a freshly attached connection. It belongs to no room
    /// until its first join frame arrives.
    pub fn connection_opened(&mut self, connection_id: &str) {
        self.connections.register(connection_id);
        debug!(
            connection_id = %connection_id,
            connection_count = self.connections.connection_count(),
            "Connection attached to relay"
        );
    }

    /// Handles one inbound frame from a connection.
    pub fn handle_frame(&mut self, connection_id: &str, frame: RelayFrame) {
        match frame.event {
            RelayEventKind::Join => self.handle_join(connection_id, frame),
            kind if kind.passes_through() => self.relay_to_room(connection_id, frame),
            kind => debug!(
                connection_id = %connection_id,
                event = kind.event_name(),
                "Frame kind is neither join nor a delta, dropping"
            ),
        }
    }

    /// Removes a disconnected connection from its room and the registry.
    /// A second disconnect for the same id is a no-op.
    pub fn connection_closed(&mut self, connection_id: &str) {
        let record = match self.connections.unregister(connection_id) {
            Some(record) => record,
            None => {
                debug!(connection_id = %connection_id, "Disconnect for unknown connection, ignoring");
                return;
            }
        };

        if let Some(room_id) = &record.current_room {
            let result = self.rooms.leave(room_id, connection_id);
            debug!(
                connection_id = %connection_id,
                room_id = %room_id,
                result = ?result,
                "Removed disconnected connection from its room"
            );
        }

        info!(
            connection_id = %connection_id,
            connected_secs = (Utc::now() - record.connected_at).num_seconds(),
            connection_count = self.connections.connection_count(),
            "Connection detached from relay"
        );
    }

    fn handle_join(&mut self, connection_id: &str, frame: RelayFrame) {
        let room_id = match frame.payload.as_str() {
            Some(room_id) => room_id.to_string(),
            None => {
                debug!(
                    connection_id = %connection_id,
                    "Join payload is not a document id string, dropping"
                );
                return;
            }
        };

        if !self.connections.is_registered(connection_id) {
            debug!(
                connection_id = %connection_id,
                room_id = %room_id,
                "Join from a connection that already detached, dropping"
            );
            return;
        }

        if let Some(previous) = self.connections.room_of(connection_id) {
            if previous == room_id {
                debug!(
                    connection_id = %connection_id,
                    room_id = %room_id,
                    "Connection already in this room, join is a no-op"
                );
                return;
            }
            let result = self.rooms.leave(&previous, connection_id);
            debug!(
                connection_id = %connection_id,
                room_id = %previous,
                result = ?result,
                "Left previous room before joining a new one"
            );
        }

        let members = self.rooms.join(&room_id, connection_id);
        self.connections.set_room(connection_id, &room_id);
        info!(
            connection_id = %connection_id,
            room_id = %room_id,
            member_count = members.len(),
            "Connection joined room"
        );
    }

    /// Fans a delta out to everyone in the sender's room except the
    /// sender. A connection that has not joined a room yet gets its
    /// deltas silently dropped.
    fn relay_to_room(&self, connection_id: &str, frame: RelayFrame) {
        let room_id = match self.connections.room_of(connection_id) {
            Some(room_id) => room_id,
            None => {
                debug!(
                    connection_id = %connection_id,
                    event = frame.event.event_name(),
                    "Delta from a connection outside any room, dropping"
                );
                return;
            }
        };

        let peers = self.rooms.members_except(&room_id, connection_id);
        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            event = frame.event.event_name(),
            peer_count = peers.len(),
            "Relaying delta to room peers"
        );

        for peer in &peers {
            self.transport.send(peer, &frame);
        }
    }

    pub fn room_of(&self, connection_id: &str) -> Option<String> {
        self.connections.room_of(connection_id)
    }

    pub fn is_room_member(&self, room_id: &str, connection_id: &str) -> bool {
        self.rooms.is_member(room_id, connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.connection_count()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }
}

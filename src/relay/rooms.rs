use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Outcome of removing a connection from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveResult {
    /// Connection removed, other members remain.
    Left { remaining: usize },
    /// Connection removed and the emptied room was deleted.
    RoomDeleted,
    /// The connection was not a member of the room.
    NotAMember,
    /// No room with that id exists.
    RoomNotFound,
}

/// Room directory mapping document ids to the connections editing them.
///
/// Rooms are created implicitly on first join and deleted as soon as the
/// last member leaves, so an empty room is never observable. Like the
/// connection registry, this is owned by the router task alone.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, HashSet<String>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        RoomDirectory {
            rooms: HashMap::new(),
        }
    }

    /// Adds the connection to the room, creating the room if needed.
    /// Joining a room twice leaves a single membership. Returns the
    /// updated member set.
    pub fn join(&mut self, room_id: &str, connection_id: &str) -> HashSet<String> {
        let members = self.rooms.entry(room_id.to_string()).or_default();
        members.insert(connection_id.to_string());
        members.clone()
    }

    /// Removes the connection from the room, deleting the room when it
    /// becomes empty.
    pub fn leave(&mut self, room_id: &str, connection_id: &str) -> LeaveResult {
        let members = match self.rooms.get_mut(room_id) {
            Some(members) => members,
            None => {
                debug!(room_id = %room_id, "Leave for nonexistent room");
                return LeaveResult::RoomNotFound;
            }
        };

        if !members.remove(connection_id) {
            debug!(
                room_id = %room_id,
                connection_id = %connection_id,
                "Leave for connection that is not a member"
            );
            return LeaveResult::NotAMember;
        }

        if members.is_empty() {
            self.rooms.remove(room_id);
            LeaveResult::RoomDeleted
        } else {
            LeaveResult::Left {
                remaining: members.len(),
            }
        }
    }

    /// Members of the room other than the given connection. An unknown
    /// room yields an empty list.
    pub fn members_except(&self, room_id: &str, connection_id: &str) -> Vec<String> {
        match self.rooms.get(room_id) {
            Some(members) => members
                .iter()
                .filter(|member| member.as_str() != connection_id)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_member(&self, room_id: &str, connection_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .map(|members| members.contains(connection_id))
            .unwrap_or(false)
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map(HashSet::len).unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

//! Room Directory
//!
//! Static catalog of the chat rooms this client offers.

use super::value_object::RoomId;

const UNKNOWN_ROOM_NAME: &str = "Unknown Room";
const UNKNOWN_ROOM_DESCRIPTION: &str = "Chat room";

/// Room ID that views open by default
pub const DEFAULT_ROOM_ID: &str = "general";

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const ROOMS: [RoomEntry; 3] = [
    RoomEntry {
        id: "general",
        name: "General",
        description: "General discussion",
    },
    RoomEntry {
        id: "random",
        name: "Random",
        description: "Random conversations",
    },
    RoomEntry {
        id: "tech",
        name: "Tech Talk",
        description: "Technology discussions",
    },
];

/// Room catalog lookups
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomDirectory;

impl RoomDirectory {
    /// All rooms in catalog order
    pub fn rooms(&self) -> &'static [RoomEntry] {
        &ROOMS
    }

    pub fn lookup(&self, room_id: &RoomId) -> Option<&'static RoomEntry> {
        ROOMS.iter().find(|entry| entry.id == room_id.as_str())
    }

    /// Display name, falling back to "Unknown Room"
    pub fn name_for(&self, room_id: &RoomId) -> &'static str {
        self.lookup(room_id)
            .map_or(UNKNOWN_ROOM_NAME, |entry| entry.name)
    }

    /// Description, falling back to "Chat room"
    pub fn description_for(&self, room_id: &RoomId) -> &'static str {
        self.lookup(room_id)
            .map_or(UNKNOWN_ROOM_DESCRIPTION, |entry| entry.description)
    }

    pub fn default_room(&self) -> RoomId {
        RoomId(DEFAULT_ROOM_ID.to_string())
    }
}

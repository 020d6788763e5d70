//! Conversion logic between DTOs and domain entities.

use serde_json::Value;

use crate::domain::{
    Message, PresenceRecord, RegisteredUser, SessionUser, Timestamp, entity::ChatRoom,
    value_object::RoomId,
};

use super::schema::{MessageRecord, PresenceRecordDto, RegisteredUserDto, RoomRecord, SessionUserDto};

// ========================================
// DTO → Domain Entity
// ========================================

impl RoomRecord {
    pub fn into_room(self, id: RoomId) -> ChatRoom {
        ChatRoom {
            id,
            name: self.name,
            description: self.description,
            created_at: Timestamp::new(self.created_at),
        }
    }
}

impl MessageRecord {
    /// The stored `id` wins; the key is used when the record has none
    pub fn into_message(self, key: &str) -> Message {
        Message {
            id: self.id.unwrap_or_else(|| key.to_string()),
            user: self.user,
            text: self.text,
            timestamp: Timestamp::new(self.timestamp),
            status: self.status,
        }
    }
}

impl From<PresenceRecordDto> for PresenceRecord {
    fn from(dto: PresenceRecordDto) -> Self {
        Self {
            username: dto.username,
            email: dto.email,
            last_seen: Timestamp::new(dto.last_seen),
            status: dto.status,
        }
    }
}

impl From<SessionUserDto> for SessionUser {
    fn from(dto: SessionUserDto) -> Self {
        SessionUser::new(dto.username, dto.email)
    }
}

impl From<RegisteredUserDto> for RegisteredUser {
    fn from(dto: RegisteredUserDto) -> Self {
        Self {
            username: dto.username.filter(|name| !name.trim().is_empty()),
            email: dto.email,
            registered_at: Timestamp::new(dto.registered_at),
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatRoom> for RoomRecord {
    fn from(room: &ChatRoom) -> Self {
        Self {
            name: room.name.clone(),
            description: room.description.clone(),
            created_at: room.created_at.value(),
            messages: Default::default(),
        }
    }
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            id: Some(message.id.clone()),
            user: message.user.clone(),
            text: message.text.clone(),
            timestamp: message.timestamp.value(),
            status: message.status,
        }
    }
}

impl From<&PresenceRecord> for PresenceRecordDto {
    fn from(record: &PresenceRecord) -> Self {
        Self {
            username: record.username.clone(),
            email: record.email.clone(),
            last_seen: record.last_seen.value(),
            status: record.status,
        }
    }
}

impl From<&SessionUser> for SessionUserDto {
    fn from(user: &SessionUser) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&RegisteredUser> for RegisteredUserDto {
    fn from(user: &RegisteredUser) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            registered_at: user.registered_at.value(),
        }
    }
}

// ========================================
// Snapshots
// ========================================

/// Decode the value at `chatRooms/{roomId}/messages` into messages sorted by
/// ascending timestamp.
///
/// A missing collection yields an empty list. Records that do not decode are
/// skipped. Ties keep key order, which is creation order for pushed keys.
pub fn messages_from_snapshot(snapshot: Option<Value>) -> Vec<Message> {
    let Some(Value::Object(entries)) = snapshot else {
        return Vec::new();
    };

    let mut messages: Vec<Message> = entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<MessageRecord>(value) {
            Ok(record) => Some(record.into_message(&key)),
            Err(e) => {
                tracing::warn!("Skipping malformed message '{}': {}", key, e);
                None
            }
        })
        .collect();

    messages.sort_by_key(|message| message.timestamp);
    messages
}

/// Decode the value at `onlineUsers` into presence records (store key order)
pub fn presence_from_snapshot(snapshot: Option<Value>) -> Vec<PresenceRecord> {
    let Some(Value::Object(entries)) = snapshot else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(
            |(key, value)| match serde_json::from_value::<PresenceRecordDto>(value) {
                Ok(dto) => Some(dto.into()),
                Err(e) => {
                    tracing::warn!("Skipping malformed presence record '{}': {}", key, e);
                    None
                }
            },
        )
        .collect()
}

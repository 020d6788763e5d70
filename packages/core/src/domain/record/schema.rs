//! JSON records as they are stored.
//!
//! Field names follow the camelCase convention of the hosted database
//! (`createdAt`, `lastSeen`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::entity::{MessageStatus, PresenceStatus};

/// Record at `chatRooms/{roomId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub name: String,
    pub description: String,
    pub created_at: i64,
    /// Always written empty on creation; never read back through this record
    #[serde(default, skip_deserializing)]
    pub messages: Map<String, Value>,
}

/// Record at `chatRooms/{roomId}/messages/{messageId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user: String,
    pub text: String,
    pub timestamp: i64,
    #[serde(default = "default_message_status")]
    pub status: MessageStatus,
}

fn default_message_status() -> MessageStatus {
    MessageStatus::Sent
}

/// Record at `onlineUsers/{userKey}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecordDto {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub last_seen: i64,
    pub status: PresenceStatus,
}

/// `currentUser` entry in local storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUserDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub email: String,
}

/// Element of the `users` list in local storage
///
/// Unknown fields written by other clients are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUserDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub registered_at: i64,
}

//! Domain entities

use serde::{Deserialize, Serialize};

use super::value_object::{RoomId, Timestamp};

/// A persistent chat room
///
/// Created lazily on first access and never deleted. Only its message
/// collection changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoom {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
}

/// Where a message lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Persisted in the store and visible to everyone in the room
    Sent,
    /// Held only in this client's view after a failed write
    Local,
    /// Synthetic client-side message, never persisted
    Demo,
}

impl MessageStatus {
    /// Whether the message exists only in the local view
    pub fn is_client_only(&self) -> bool {
        matches!(self, MessageStatus::Local | MessageStatus::Demo)
    }
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub user: String,
    pub text: String,
    pub timestamp: Timestamp,
    pub status: MessageStatus,
}

impl Message {
    /// Build a client-only message with the given status
    pub fn client_only(
        id: String,
        user: impl Into<String>,
        text: impl Into<String>,
        timestamp: Timestamp,
        status: MessageStatus,
    ) -> Self {
        debug_assert!(status.is_client_only());
        Self {
            id,
            user: user.into(),
            text: text.into(),
            timestamp,
            status,
        }
    }
}

/// Online/offline state of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Presence entry of a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRecord {
    pub username: String,
    pub email: String,
    pub last_seen: Timestamp,
    pub status: PresenceStatus,
}

impl PresenceRecord {
    pub fn is_online(&self) -> bool {
        self.status == PresenceStatus::Online
    }
}

/// The logged-in user of this client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub username: Option<String>,
    pub email: String,
}

impl SessionUser {
    pub fn new(username: Option<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.filter(|name| !name.trim().is_empty()),
            email: email.into(),
        }
    }

    /// Name shown next to messages: username, then email, then "Anonymous"
    pub fn display_name(&self) -> &str {
        match self.username.as_deref() {
            Some(username) => username,
            None if !self.email.trim().is_empty() => &self.email,
            None => "Anonymous",
        }
    }
}

/// A user known to this browser profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub username: Option<String>,
    pub email: String,
    pub registered_at: Timestamp,
}

impl RegisteredUser {
    /// Whether `identifier` names this user (email is case-insensitive)
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.email.eq_ignore_ascii_case(identifier)
            || self.username.as_deref() == Some(identifier)
    }

    pub fn to_session_user(&self) -> SessionUser {
        SessionUser::new(self.username.clone(), self.email.clone())
    }
}

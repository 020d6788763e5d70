//! Value objects
//!
//! Small validated types shared by entities and gateways.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{entity::SessionUser, error::ValueObjectError};

/// Maximum message length in characters (after trimming)
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Characters the realtime store does not accept inside a key
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '#', '$', '[', ']', '/'];

fn is_forbidden_key_char(c: char) -> bool {
    FORBIDDEN_KEY_CHARS.contains(&c) || c.is_control()
}

fn sanitize_key(value: &str) -> String {
    value
        .chars()
        .map(|c| if is_forbidden_key_char(c) { '_' } else { c })
        .collect()
}

/// Room identifier
///
/// Any non-empty store-safe key is accepted; the fixed catalog lives in
/// [`RoomDirectory`](super::RoomDirectory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(pub(super) String);

impl RoomId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyRoomId);
        }
        if trimmed.chars().any(is_forbidden_key_char) {
            return Err(ValueObjectError::InvalidRoomId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message body, trimmed and between 1 and [`MAX_MESSAGE_CHARS`] characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: &str) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyMessage);
        }
        let length = trimmed.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(ValueObjectError::MessageTooLong {
                length,
                max: MAX_MESSAGE_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Key of a presence record under `onlineUsers`
///
/// Derived from the username, or the email when no username is set. Characters
/// the store rejects in keys are replaced with `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PresenceKey(String);

impl PresenceKey {
    pub fn new(value: &str) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyPresenceKey);
        }
        Ok(Self(sanitize_key(trimmed)))
    }

    /// Key of the given user's presence record
    pub fn for_user(user: &SessionUser) -> Self {
        Self(sanitize_key(user.display_name()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PresenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Domain layer errors

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Room ID is empty
    #[error("Room ID must not be empty")]
    EmptyRoomId,

    /// Room ID contains a character the store does not accept in keys
    #[error("Room ID '{0}' contains an invalid character")]
    InvalidRoomId(String),

    /// Message text is empty after trimming
    #[error("Message must not be empty")]
    EmptyMessage,

    /// Message text exceeds the character limit
    #[error("Message is too long ({length} characters, max {max})")]
    MessageTooLong { length: usize, max: usize },

    /// Presence key could not be derived
    #[error("Presence key must not be empty")]
    EmptyPresenceKey,
}

/// Errors reported by a realtime store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the operation (e.g. permission denied)
    #[error("Store rejected the operation: {0}")]
    Rejected(String),

    /// The store returned data that could not be interpreted
    #[error("Invalid data from store: {0}")]
    InvalidData(String),
}

/// Errors reported by a session storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not valid JSON
    #[error("Storage is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}

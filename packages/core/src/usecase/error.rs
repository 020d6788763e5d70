//! UseCase layer errors

use thiserror::Error;

use crate::domain::{StorageError, StoreError};

/// Failure of a gateway call, surfaced to views as a recoverable signal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network or backend failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store refused the write (e.g. permission denied)
    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(reason) | StoreError::InvalidData(reason) => {
                GatewayError::StoreUnavailable(reason)
            }
            StoreError::Rejected(reason) => GatewayError::WriteRejected(reason),
        }
    }
}

/// Reason a send was blocked before reaching the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejection {
    #[error("Please enter a message.")]
    EmptyMessage,

    #[error("Message is too long (max 500 characters).")]
    TooLong,

    #[error("Please log in to send messages.")]
    NotLoggedIn,

    #[error("A message is already being sent.")]
    AlreadySending,

    #[error("Please wait a moment before sending another message.")]
    RateLimited,
}

impl SendRejection {
    /// Rejections that are not reported to the user
    pub fn is_silent(&self) -> bool {
        matches!(self, SendRejection::AlreadySending)
    }
}

/// Session lifecycle errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("A user with email '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("No registered user matches '{0}'")]
    UnknownUser(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        SessionError::Storage(StorageError::Corrupted(error))
    }
}

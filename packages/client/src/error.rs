//! Error types for the chat client.

use thiserror::Error;

use hiroba_core::{domain::StoreError, usecase::SessionError};

use crate::config::ConfigError;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid command-line configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The realtime store could not be set up
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Local session storage is unusable
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Terminal input could not be initialised
    #[error("Readline error: {0}")]
    Readline(String),
}

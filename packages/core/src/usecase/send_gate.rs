//! Client-side gate applied before a message reaches the chat gateway.
//!
//! The checks run in a fixed order and the first failure wins:
//! empty text, text too long, no session user, send already in flight,
//! less than [`MIN_SEND_INTERVAL_MS`] since the last attempt.

use crate::domain::{MessageText, SessionUser, ValueObjectError};

use super::{chat_gateway::NewMessage, error::SendRejection};

/// Minimum time between two send attempts
pub const MIN_SEND_INTERVAL_MS: i64 = 1000;

/// Everything the gate looks at for one send
#[derive(Debug, Clone, Copy)]
pub struct SendAttempt<'a> {
    pub draft: &'a str,
    pub user: Option<&'a SessionUser>,
    pub in_flight: bool,
    /// When the previous send was attempted, successful or not
    pub last_attempt_at: Option<i64>,
    pub now: i64,
}

/// Validate a send and build the message to append
pub fn validate_send(attempt: &SendAttempt<'_>) -> Result<NewMessage, SendRejection> {
    let text = MessageText::new(attempt.draft).map_err(|e| match e {
        ValueObjectError::MessageTooLong { .. } => SendRejection::TooLong,
        _ => SendRejection::EmptyMessage,
    })?;

    let user = attempt.user.ok_or(SendRejection::NotLoggedIn)?;

    if attempt.in_flight {
        return Err(SendRejection::AlreadySending);
    }

    if let Some(last) = attempt.last_attempt_at
        && attempt.now - last < MIN_SEND_INTERVAL_MS
    {
        return Err(SendRejection::RateLimited);
    }

    Ok(NewMessage {
        user: user.display_name().to_string(),
        text,
    })
}

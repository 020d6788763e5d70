//! Views composing the core gateways with the session.
//!
//! Each view owns its subscription and is driven by `step().await` from the
//! interactive loop. Store failures never escape a view; they are turned into
//! an offline flag and a notice.

pub mod chat;
pub mod presence;
#[cfg(test)]
mod test_support;

pub use chat::{ChatPhase, ChatUpdate, ChatView};
pub use presence::{PresenceUpdate, PresenceView};

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Status line shown above a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

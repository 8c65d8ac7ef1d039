//! One-shot notices carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Generic failure message for catalog operations.
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong";

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// The generic failure notice.
    #[must_use]
    pub fn something_went_wrong() -> Self {
        Self::error(SOMETHING_WENT_WRONG)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Queue a notice for the next page render, replacing any pending one.
pub async fn flash(session: &Session, notice: Notice) {
    if let Err(e) = session.insert(session_keys::NOTICE, &notice).await {
        tracing::warn!(error = %e, "Failed to store notice");
    }
}

/// Take the pending notice, if any.
pub async fn take(session: &Session) -> Option<Notice> {
    session
        .remove::<Notice>(session_keys::NOTICE)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read notice");
            None
        })
}

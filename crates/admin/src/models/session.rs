//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session issued by the hosted auth service.
///
/// Stored in the server-side session; the browser only ever holds the
/// session cookie. Implements `Debug` manually to redact the tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for backend calls.
    pub access_token: String,
    /// Token used to obtain a fresh access token.
    pub refresh_token: String,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// Auth service user id.
    pub user_id: String,
    /// Signed-in user's email address.
    pub email: String,
}

impl AuthSession {
    /// Whether the access token expires within `margin` of `now`.
    #[must_use]
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= margin
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the signed-in user's auth session.
    pub const AUTH_SESSION: &str = "auth_session";

    /// Key for the one-shot notice shown on the next page render.
    pub const NOTICE: &str = "notice";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: "access-secret".to_string(),
            refresh_token: "refresh-secret".to_string(),
            expires_at,
            user_id: "u1".to_string(),
            email: "ops@shop.test".to_string(),
        }
    }

    #[test]
    fn test_expires_within() {
        let now = Utc::now();
        let s = session(now + Duration::seconds(30));
        assert!(s.expires_within(Duration::seconds(60), now));
        assert!(!s.expires_within(Duration::seconds(10), now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", session(Utc::now()));
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
        assert!(debug.contains("ops@shop.test"));
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let s = session(Utc::now());
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(serde_json::from_str::<AuthSession>(&json).unwrap(), s);
    }
}

//! Authentication extractors and middleware for admin.
//!
//! Provides extractors for requiring a signed-in session in route handlers.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::AuthSession;
use crate::services::session_gate::{AuthEvent, AuthState, LOGIN_PATH, SessionGate};
use crate::state::AppState;

/// Extractor that requires a signed-in session.
///
/// Runs the session gate for the request: the stored session is retrieved,
/// refreshed if its access token is about to expire, and the request is
/// redirected to the login page unless the result is authenticated.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(current: RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", current.auth.email)
/// }
/// ```
pub struct RequireSession {
    /// The live auth session.
    pub auth: AuthSession,
    /// The cookie session (for notices and sign-out).
    pub session: Session,
}

/// Error returned when a session is required but missing.
pub enum SessionRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// The session layer is not installed.
    MissingSessionLayer,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSessionLayer => {
                tracing::error!("Session layer missing from router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(SessionRejection::MissingSessionLayer)?;

        let mut gate = SessionGate::new(session.clone());
        gate.retrieve().await;
        let transition = gate.refresh_if_expiring(state.auth()).await;

        match transition.state {
            AuthState::Authenticated(auth) => {
                set_sentry_user(&auth.user_id, &auth.email);
                Ok(Self { auth, session })
            }
            AuthState::Loading | AuthState::Unauthenticated => {
                Err(SessionRejection::RedirectToLogin)
            }
        }
    }
}

/// Extractor that optionally gets the stored auth session.
///
/// Unlike `RequireSession`, this neither refreshes tokens nor rejects the
/// request.
pub struct OptionalSession(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => {
                let mut gate = SessionGate::new(session.clone());
                gate.retrieve().await.state.session().cloned()
            }
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Response marker set when the backend rejected the session's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionRejected;

/// Sign the session out after a handler reported [`SessionRejected`].
pub async fn clear_rejected_session(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionRejected>().is_some() {
        SessionGate::new(session)
            .dispatch(AuthEvent::SignedOut)
            .await;
    }

    response
}

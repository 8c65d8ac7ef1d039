//! Authentication state machine and its session-backed gate.
//!
//! ```text
//! Loading ── SessionRetrieved(Some) ─────────────▶ Authenticated
//!    │    ── SessionRetrieved(None) / Failed ────▶ Unauthenticated  (→ /auth)
//!
//! any ── SignedIn ─────────────▶ Authenticated    (→ /dashboard/products)
//! any ── TokenRefreshed ───────▶ Authenticated
//! any ── SignedOut ────────────▶ Unauthenticated  (→ /auth)
//! ```
//!
//! [`transition`] is the pure rule table. [`SessionGate`] applies it to the
//! request's cookie session: the transition's state is persisted (or
//! cleared) and logged on every dispatch.

use chrono::{Duration, Utc};
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crate::backend::AuthProvider;
use crate::models::{AuthSession, session_keys};

/// Login screen.
pub const LOGIN_PATH: &str = "/auth";

/// Landing page after sign-in.
pub const PRODUCTS_PATH: &str = "/dashboard/products";

/// Access tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Authentication state of the current visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Session check still pending.
    Loading,
    /// Signed in with a live session.
    Authenticated(AuthSession),
    /// No usable session.
    Unauthenticated,
}

impl AuthState {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Authenticated(_) => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// The live session, if authenticated.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Lifecycle events reported by the session store and auth provider.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// The initial session lookup finished.
    SessionRetrieved(Option<AuthSession>),
    /// The initial session lookup failed.
    RetrievalFailed,
    /// Email/password sign-in succeeded.
    SignedIn(AuthSession),
    /// The user signed out or the session was revoked.
    SignedOut,
    /// The access token was refreshed.
    TokenRefreshed(AuthSession),
}

/// Outcome of applying an [`AuthEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: AuthState,
    /// Where to send the browser, if anywhere.
    pub redirect: Option<&'static str>,
}

/// Apply an event. The resulting state depends only on the event.
#[must_use]
pub fn transition(event: AuthEvent) -> Transition {
    match event {
        AuthEvent::SessionRetrieved(Some(session)) | AuthEvent::TokenRefreshed(session) => {
            Transition {
                state: AuthState::Authenticated(session),
                redirect: None,
            }
        }
        AuthEvent::SessionRetrieved(None) | AuthEvent::RetrievalFailed | AuthEvent::SignedOut => {
            Transition {
                state: AuthState::Unauthenticated,
                redirect: Some(LOGIN_PATH),
            }
        }
        AuthEvent::SignedIn(session) => Transition {
            state: AuthState::Authenticated(session),
            redirect: Some(PRODUCTS_PATH),
        },
    }
}

/// Per-request view of the authentication state, backed by the cookie session.
pub struct SessionGate {
    session: Session,
    state: AuthState,
}

impl SessionGate {
    /// Wrap a session. The gate starts in [`AuthState::Loading`].
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self {
            session,
            state: AuthState::Loading,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &AuthState {
        &self.state
    }

    /// Look up the stored session and dispatch the result.
    pub async fn retrieve(&mut self) -> Transition {
        let event = match self
            .session
            .get::<AuthSession>(session_keys::AUTH_SESSION)
            .await
        {
            Ok(found) => AuthEvent::SessionRetrieved(found),
            Err(e) => {
                warn!(error = %e, "Failed to read auth session");
                AuthEvent::RetrievalFailed
            }
        };
        self.dispatch(event).await
    }

    /// Refresh the access token if it is expired or about to expire.
    ///
    /// A failed refresh signs the user out.
    pub async fn refresh_if_expiring(&mut self, auth: &dyn AuthProvider) -> Transition {
        let refresh_token = match &self.state {
            AuthState::Authenticated(session)
                if session.expires_within(Duration::seconds(REFRESH_MARGIN_SECS), Utc::now()) =>
            {
                session.refresh_token.clone()
            }
            _ => {
                return Transition {
                    state: self.state.clone(),
                    redirect: None,
                };
            }
        };

        match auth.refresh_session(&refresh_token).await {
            Ok(session) => self.dispatch(AuthEvent::TokenRefreshed(session)).await,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, signing out");
                self.dispatch(AuthEvent::SignedOut).await
            }
        }
    }

    /// Apply an event, persist the resulting state, and log the change.
    pub async fn dispatch(&mut self, event: AuthEvent) -> Transition {
        let persist = !matches!(event, AuthEvent::SessionRetrieved(_));
        let signed_in = matches!(event, AuthEvent::SignedIn(_));
        let next = transition(event);

        if persist {
            self.persist(&next.state, signed_in).await;
        }

        if self.state.name() == next.state.name() {
            debug!(state = next.state.name(), "Auth state unchanged");
        } else {
            info!(
                from = self.state.name(),
                to = next.state.name(),
                email = next.state.session().map(|s| s.email.as_str()),
                "Auth state changed"
            );
        }

        self.state = next.state.clone();
        next
    }

    async fn persist(&self, state: &AuthState, cycle_id: bool) {
        let result = match state {
            AuthState::Authenticated(session) => {
                if cycle_id && let Err(e) = self.session.cycle_id().await {
                    warn!(error = %e, "Failed to rotate session id");
                }
                self.session
                    .insert(session_keys::AUTH_SESSION, session)
                    .await
            }
            AuthState::Unauthenticated => self.session.flush().await,
            AuthState::Loading => Ok(()),
        };

        if let Err(e) = result {
            warn!(error = %e, state = state.name(), "Failed to persist auth state");
        }
    }
}

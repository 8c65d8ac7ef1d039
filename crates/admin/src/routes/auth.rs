//! Authentication route handlers for admin.
//!
//! Email and password sign-in against the hosted auth service, and sign-out.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use storefront_admin_core::Email;

use crate::backend::BackendError;
use crate::components::layout::APP_TITLE;
use crate::components::notice::{self, Notice};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalSession;
use crate::services::session_gate::{AuthEvent, LOGIN_PATH, PRODUCTS_PATH, SessionGate};
use crate::state::AppState;

use super::render;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub title: &'static str,
    pub email: String,
    pub error: Option<String>,
}

impl LoginPageTemplate {
    fn new(email: String, error: Option<String>) -> Self {
        Self {
            title: APP_TITLE,
            email,
            error,
        }
    }
}

/// Login form input.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/auth", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// GET /
async fn root() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

/// Render the login page, or skip it when already signed in.
///
/// GET /auth
async fn login_page(OptionalSession(auth): OptionalSession) -> Response {
    if auth.is_some() {
        return Redirect::to(PRODUCTS_PATH).into_response();
    }

    render(&LoginPageTemplate::new(String::new(), None))
}

/// Sign in with email and password.
///
/// POST /auth
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            return render(&LoginPageTemplate::new(form.email, Some(e.to_string())));
        }
    };
    let password = SecretString::from(form.password);

    match state.auth().sign_in_with_password(&email, &password).await {
        Ok(auth) => {
            set_sentry_user(&auth.user_id, &auth.email);
            // Lists cached under a previous user's token may be hidden from this one
            state.catalog().invalidate_all().await;

            let transition = SessionGate::new(session)
                .dispatch(AuthEvent::SignedIn(auth))
                .await;
            Redirect::to(transition.redirect.unwrap_or(PRODUCTS_PATH)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            render(&LoginPageTemplate::new(
                email.into_inner(),
                Some(e.provider_message()),
            ))
        }
    }
}

/// Sign out and clear the session.
///
/// A failed sign-out keeps the session and shows the provider's message.
///
/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(
    State(state): State<AppState>,
    OptionalSession(auth): OptionalSession,
    session: Session,
) -> Response {
    if let Some(auth) = auth {
        match state.auth().sign_out(&auth.access_token).await {
            // An already revoked token means there is nothing left to sign out of
            Ok(()) | Err(BackendError::Unauthorized(_)) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Sign-out failed");
                notice::flash(&session, Notice::error(e.provider_message())).await;
                return Redirect::to("/dashboard").into_response();
            }
        }
    }

    clear_sentry_user();
    let transition = SessionGate::new(session)
        .dispatch(AuthEvent::SignedOut)
        .await;
    Redirect::to(transition.redirect.unwrap_or(LOGIN_PATH)).into_response()
}

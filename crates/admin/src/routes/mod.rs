//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Auth (email + password against the hosted auth service)
//! GET  /                                - Redirect to login
//! GET  /auth                            - Login page
//! POST /auth                            - Sign in
//! POST /auth/logout                     - Sign out
//!
//! # Dashboard
//! GET  /dashboard                       - Product and category counts
//!
//! # Products
//! GET  /dashboard/products              - Search, sort, paginate
//! POST /dashboard/products              - Create
//! GET  /dashboard/products/new          - Create form
//! GET  /dashboard/products/{id}         - Details
//! POST /dashboard/products/{id}         - Update
//! GET  /dashboard/products/{id}/edit    - Edit form
//! POST /dashboard/products/{id}/delete  - Delete
//!
//! # Categories
//! (same shape under /dashboard/categories, list without search or paging)
//! ```

use askama::Template;
use axum::{
    Router,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_sessions::Session;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::components::{Chrome, Notice, notice};
use crate::error::AppError;
use crate::middleware::{clear_rejected_session, create_session_layer};
use crate::services::CatalogError;
use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod products;

/// Build the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        // Dashboard
        .route("/dashboard", get(dashboard::index))
        // Products
        .route(
            "/dashboard/products",
            get(products::index).post(products::create),
        )
        .route("/dashboard/products/new", get(products::new_product))
        .route(
            "/dashboard/products/{id}",
            get(products::show).post(products::update),
        )
        .route("/dashboard/products/{id}/edit", get(products::edit))
        .route("/dashboard/products/{id}/delete", post(products::delete))
        // Categories
        .route(
            "/dashboard/categories",
            get(categories::index).post(categories::create),
        )
        .route("/dashboard/categories/new", get(categories::new_category))
        .route(
            "/dashboard/categories/{id}",
            get(categories::show).post(categories::update),
        )
        .route("/dashboard/categories/{id}/edit", get(categories::edit))
        .route("/dashboard/categories/{id}/delete", post(categories::delete))
}

/// Build the full application with its middleware stack.
pub fn app(state: AppState) -> Router {
    // Session layer (in-memory, SameSite=Strict)
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/admin/static"))
        .layer(axum::middleware::from_fn(clear_rejected_session))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

/// Render a template into an HTML response.
pub(crate) fn render(template: &impl Template) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => AppError::Internal(format!("template render failed: {e}")).into_response(),
    }
}

/// Keep a page rendering when a catalog query fails.
///
/// A rejected token ends the session. Any other failure is logged and the
/// page shows the generic error notice with an empty result.
pub(crate) fn or_notice<T: Default>(
    result: Result<T, CatalogError>,
    chrome: &mut Chrome,
) -> Result<T, AppError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_unauthorized() => Err(AppError::SessionExpired),
        Err(e) => {
            tracing::error!(error = %e, "Catalog query failed");
            chrome.notice = Some(Notice::something_went_wrong());
            Ok(T::default())
        }
    }
}

/// Leave a details or edit page whose entity could not be loaded.
///
/// Unknown ids are a 404 and a rejected token ends the session. Any other
/// failure returns to the list with the generic error notice.
pub(crate) async fn back_to_list(
    err: CatalogError,
    session: &Session,
    list_path: &str,
) -> Result<Response, AppError> {
    match err {
        CatalogError::NotFound(what) => Err(AppError::NotFound(what)),
        err if err.is_unauthorized() => Err(AppError::SessionExpired),
        err => {
            tracing::error!(error = %err, "Failed to load entity");
            notice::flash(session, Notice::something_went_wrong()).await;
            Ok(Redirect::to(list_path).into_response())
        }
    }
}

/// Parse a path id, treating garbage as an unknown entity.
pub(crate) fn parse_id<I: std::str::FromStr>(raw: &str, entity: &str) -> Result<I, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{entity} {raw}")))
}

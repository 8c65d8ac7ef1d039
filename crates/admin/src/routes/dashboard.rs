//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Response};
use tracing::instrument;

use crate::{
    components::Chrome,
    error::AppError,
    filters,
    middleware::RequireSession,
    services::CatalogCounts,
    state::AppState,
};

use super::{or_notice, render};

/// A summary card.
#[derive(Debug, Clone)]
pub struct StatCard {
    pub label: &'static str,
    pub value: u64,
    pub href: &'static str,
}

impl StatCard {
    fn from_counts(counts: CatalogCounts) -> Vec<Self> {
        vec![
            Self {
                label: "Total Products",
                value: counts.products,
                href: "/dashboard/products",
            },
            Self {
                label: "Total Categories",
                value: counts.categories,
                href: "/dashboard/categories",
            },
        ]
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: Chrome,
    pub cards: Vec<StatCard>,
}

/// Dashboard page handler.
///
/// Counts fall back to zero when the backend query fails.
#[instrument(skip_all)]
pub async fn index(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let mut chrome = Chrome::load(&session, &auth, "/dashboard").await;
    let counts = or_notice(state.catalog().counts(&auth.access_token).await, &mut chrome)?;

    Ok(render(&DashboardTemplate {
        chrome,
        cards: StatCard::from_counts(counts),
    }))
}

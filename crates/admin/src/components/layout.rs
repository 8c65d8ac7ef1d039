//! Page chrome: sidebar, navigation, and the pending notice.

use tower_sessions::Session;

use super::notice::{self, Notice};
use crate::models::AuthSession;

/// Sidebar title.
pub const APP_TITLE: &str = "Storefront";

/// A sidebar navigation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

const NAV: &[(&str, &str)] = &[
    ("Dashboard", "/dashboard"),
    ("Products", "/dashboard/products"),
    ("Categories", "/dashboard/categories"),
];

/// Everything the base layout needs besides the page body.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub title: &'static str,
    pub user_email: String,
    pub current_path: String,
    pub nav: Vec<NavItem>,
    pub notice: Option<Notice>,
}

impl Chrome {
    #[must_use]
    pub fn new(current_path: &str, user_email: &str, notice: Option<Notice>) -> Self {
        let nav = NAV
            .iter()
            .map(|&(label, href)| NavItem {
                label,
                href,
                active: is_active(href, current_path),
            })
            .collect();

        Self {
            title: APP_TITLE,
            user_email: user_email.to_string(),
            current_path: current_path.to_string(),
            nav,
            notice,
        }
    }

    /// Build the chrome for a signed-in page, consuming the pending notice.
    pub async fn load(session: &Session, auth: &AuthSession, current_path: &str) -> Self {
        let notice = notice::take(session).await;
        Self::new(current_path, &auth.email, notice)
    }
}

/// The dashboard entry only matches exactly; section entries also match
/// their sub-pages.
fn is_active(href: &str, current_path: &str) -> bool {
    if href == "/dashboard" {
        return current_path == href;
    }
    current_path == href
        || current_path
            .strip_prefix(href)
            .is_some_and(|rest| rest.starts_with('/'))
}

//! Integration tests for the storefront admin dashboard.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-admin-integration-tests
//! ```
//!
//! Each test spawns the full admin router (sessions, middleware, templates)
//! on an ephemeral port, backed by the in-memory backend, and drives it with
//! a cookie-keeping `reqwest` client that does not follow redirects.
//!
//! # Test Categories
//!
//! - `admin_auth` - login, logout, route guard, revoked tokens
//! - `admin_products` - product list search, sort, pagination, CRUD
//! - `admin_categories` - category CRUD and the end-to-end "Drinks" flow

#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, redirect::Policy};
use secrecy::SecretString;
use url::Url;

use storefront_admin::backend::memory::InMemoryBackend;
use storefront_admin::config::{AdminConfig, BackendConfig};
use storefront_admin::routes;
use storefront_admin::state::AppState;

/// Email of the seeded dashboard user.
pub const ADMIN_EMAIL: &str = "ops@shop.test";

/// Password of the seeded dashboard user.
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Configuration for an in-process test server.
#[must_use]
pub fn test_config() -> AdminConfig {
    AdminConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        backend: BackendConfig {
            url: Url::parse("http://127.0.0.1:54321").expect("valid backend url"),
            anon_key: SecretString::from("test-anon-key"),
            timeout: Duration::from_secs(5),
        },
        cache_ttl: Duration::from_secs(60),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// A running admin server and a browser-like client for it.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub backend: Arc<InMemoryBackend>,
}

impl TestApp {
    /// Spawn a server with the seeded user and an empty catalog.
    pub async fn spawn() -> Self {
        Self::spawn_with(InMemoryBackend::new().with_user(ADMIN_EMAIL, ADMIN_PASSWORD)).await
    }

    /// Spawn a server around a prepared backend.
    pub async fn spawn_with(backend: InMemoryBackend) -> Self {
        let backend = Arc::new(backend);
        let state = AppState::with_backends(test_config(), backend.clone(), backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, routes::app(state))
                .await
                .expect("Test server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
            backend,
        }
    }

    /// Spawn a server and sign the client in.
    pub async fn signed_in() -> Self {
        let app = Self::spawn().await;
        let resp = app.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        app
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a path without following redirects.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET a path and return the status and body.
    pub async fn get_page(&self, path: &str) -> (StatusCode, String) {
        let resp = self.get(path).await;
        let status = resp.status();
        (status, resp.text().await.expect("Failed to read body"))
    }

    /// POST a form without following redirects.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Submit the login form.
    pub async fn sign_in(&self, email: &str, password: &str) -> Response {
        self.post_form("/auth", &[("email", email), ("password", password)])
            .await
    }

    /// Create a category through the dashboard.
    pub async fn create_category(&self, name: &str) {
        let resp = self
            .post_form("/dashboard/categories", &[("name", name), ("image", "")])
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "create category {name}");
    }

    /// Create a product through the dashboard.
    pub async fn create_product(&self, name: &str, stock: &str, category_id: &str) {
        let resp = self
            .post_form(
                "/dashboard/products",
                &[
                    ("name", name),
                    ("description", ""),
                    ("image", ""),
                    ("initial_stock", stock),
                    ("available_stock", stock),
                    ("category_id", category_id),
                ],
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "create product {name}");
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> &str {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

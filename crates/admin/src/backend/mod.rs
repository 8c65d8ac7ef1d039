//! Hosted backend client (database + auth).
//!
//! The dashboard owns no database. Catalog rows live in a hosted
//! PostgREST-style service and sign-in goes through its GoTrue-style auth
//! API. Both are reached through the traits in this module so route handlers
//! and the catalog service never depend on the wire format.
//!
//! # Implementations
//!
//! - [`RestBackend`] - HTTP client for the hosted service (production)
//! - [`memory::InMemoryBackend`] - in-process store for tests and local runs
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_admin::backend::{CatalogBackend, RestBackend};
//!
//! let backend = RestBackend::new(&config.backend)?;
//! let rows = backend.list_categories(&session.access_token).await?;
//! ```

pub mod memory;
mod rest;
pub mod rows;

pub use rest::RestBackend;
pub use rows::{CategoryRow, CategoryRowInput, ProductRow, ProductRowInput};

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use storefront_admin_core::{CategoryId, Email, ProductId};

use crate::models::AuthSession;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the provider's error body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The access token was rejected or the credentials were wrong.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The targeted row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response was well-formed but not what the client expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// The provider's own error message, for surfacing to the user verbatim.
    #[must_use]
    pub fn provider_message(&self) -> String {
        match self {
            Self::Status { message, .. } | Self::Unauthorized(message) => message.clone(),
            _ => self.to_string(),
        }
    }
}

/// A backend collection (table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
}

impl Collection {
    /// Table name on the backend.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
        }
    }

    /// Primary key column name.
    #[must_use]
    pub const fn id_column(self) -> &'static str {
        match self {
            Self::Products => "product_id",
            Self::Categories => "category_id",
        }
    }
}

/// Row-level access to the catalog collections.
///
/// Every call carries the signed-in user's access token; the backend applies
/// its own row-level policies.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// All categories, ordered by id ascending.
    async fn list_categories(&self, token: &str) -> Result<Vec<CategoryRow>, BackendError>;

    /// All products joined with their category, ordered by id ascending.
    async fn list_products(&self, token: &str) -> Result<Vec<ProductRow>, BackendError>;

    /// Insert a category and return the stored row.
    async fn insert_category(
        &self,
        token: &str,
        row: &CategoryRowInput,
    ) -> Result<CategoryRow, BackendError>;

    /// Update a category by id.
    async fn update_category(
        &self,
        token: &str,
        id: CategoryId,
        row: &CategoryRowInput,
    ) -> Result<(), BackendError>;

    /// Delete a category by id.
    async fn delete_category(&self, token: &str, id: CategoryId) -> Result<(), BackendError>;

    /// Insert a product and return the stored row.
    async fn insert_product(
        &self,
        token: &str,
        row: &ProductRowInput,
    ) -> Result<ProductRow, BackendError>;

    /// Update a product by id.
    async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        row: &ProductRowInput,
    ) -> Result<(), BackendError>;

    /// Delete a product by id.
    async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), BackendError>;

    /// Exact row count of a collection.
    async fn count(&self, token: &str, collection: Collection) -> Result<u64, BackendError>;
}

/// Session management against the hosted auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;
}

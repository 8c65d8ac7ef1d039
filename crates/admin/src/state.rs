//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{AuthProvider, BackendError, CatalogBackend, RestBackend};
use crate::config::AdminConfig;
use crate::services::CatalogService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    catalog: CatalogService,
    auth: Arc<dyn AuthProvider>,
}

impl AppState {
    /// Build state backed by the hosted service.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, BackendError> {
        let backend = Arc::new(RestBackend::new(&config.backend)?);
        Ok(Self::with_backends(config, backend.clone(), backend))
    }

    /// Build state around explicit backends (used by tests and local runs).
    #[must_use]
    pub fn with_backends(
        config: AdminConfig,
        catalog: Arc<dyn CatalogBackend>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let catalog = CatalogService::new(catalog, config.cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                auth,
            }),
        }
    }

    /// Returns a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Returns the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Returns the auth provider.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }
}

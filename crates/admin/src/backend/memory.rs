//! In-process backend for tests and local runs without a hosted project.
//!
//! Mirrors the hosted service closely enough for the dashboard's purposes:
//! ids are assigned ascending, products must reference an existing category,
//! categories still referenced by products cannot be deleted, and every call
//! requires a token issued by [`AuthProvider::sign_in_with_password`].
//! Refreshing a session rotates both tokens and revokes the old access token.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use storefront_admin_core::{CategoryId, Email, ProductId};

use super::{
    AuthProvider, BackendError, CatalogBackend, CategoryRow, CategoryRowInput, Collection,
    ProductRow, ProductRowInput,
};
use crate::models::AuthSession;

#[derive(Default)]
struct Store {
    categories: BTreeMap<i64, CategoryRow>,
    products: BTreeMap<i64, ProductRow>,
    next_category_id: i64,
    next_product_id: i64,
    /// email -> password
    users: HashMap<String, String>,
    /// access token -> email
    access_tokens: HashMap<String, String>,
    /// refresh token -> (email, access token issued with it)
    refresh_tokens: HashMap<String, (String, String)>,
    issued: u64,
}

impl Store {
    fn authorize(&self, token: &str) -> Result<(), BackendError> {
        if self.access_tokens.contains_key(token) {
            Ok(())
        } else {
            Err(BackendError::Unauthorized("invalid JWT".to_string()))
        }
    }

    fn issue(&mut self, email: &str, ttl: Duration) -> AuthSession {
        self.issued += 1;
        let access_token = format!("access-{}", self.issued);
        let refresh_token = format!("refresh-{}", self.issued);
        self.access_tokens
            .insert(access_token.clone(), email.to_string());
        self.refresh_tokens.insert(
            refresh_token.clone(),
            (email.to_string(), access_token.clone()),
        );

        AuthSession {
            access_token,
            refresh_token,
            expires_at: Utc::now() + ttl,
            user_id: format!("user-{email}"),
            email: email.to_string(),
        }
    }

    fn joined(&self, mut row: ProductRow) -> ProductRow {
        row.categories = self.categories.get(&row.category_id).cloned();
        row
    }

    fn require_category(&self, category_id: i64) -> Result<(), BackendError> {
        if self.categories.contains_key(&category_id) {
            Ok(())
        } else {
            Err(foreign_key_violation(format!(
                "insert or update on table \"products\" violates foreign key constraint: \
                 category {category_id} does not exist"
            )))
        }
    }
}

fn foreign_key_violation(message: String) -> BackendError {
    BackendError::Status {
        status: 409,
        message,
    }
}

/// In-memory catalog and auth backend.
pub struct InMemoryBackend {
    store: Mutex<Store>,
    token_ttl: Duration,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_sign_out: AtomicBool,
    product_lists: AtomicU64,
    category_lists: AtomicU64,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend with no users.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                next_category_id: 1,
                next_product_id: 1,
                ..Store::default()
            }),
            token_ttl: Duration::hours(1),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            product_lists: AtomicU64::new(0),
            category_lists: AtomicU64::new(0),
        }
    }

    /// Register a user that can sign in with `password`.
    #[must_use]
    pub fn with_user(mut self, email: &str, password: &str) -> Self {
        self.store
            .get_mut()
            .users
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Lifetime of issued access tokens.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Make every insert, update, and delete fail with a 500.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every list call fail with a 500.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make sign-out fail with a 500 instead of revoking the token.
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Number of list calls served for a collection.
    #[must_use]
    pub fn list_calls(&self, collection: Collection) -> u64 {
        match collection {
            Collection::Products => self.product_lists.load(Ordering::SeqCst),
            Collection::Categories => self.category_lists.load(Ordering::SeqCst),
        }
    }

    /// Revoke every issued access token, as if they had all expired.
    pub async fn expire_access_tokens(&self) {
        self.store.lock().await.access_tokens.clear();
    }

    fn check_readable(&self) -> Result<(), BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 500,
                message: "read rejected".to_string(),
            });
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 500,
                message: "write rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for InMemoryBackend {
    async fn list_categories(&self, token: &str) -> Result<Vec<CategoryRow>, BackendError> {
        let store = self.store.lock().await;
        store.authorize(token)?;
        self.check_readable()?;
        self.category_lists.fetch_add(1, Ordering::SeqCst);
        Ok(store.categories.values().cloned().collect())
    }

    async fn list_products(&self, token: &str) -> Result<Vec<ProductRow>, BackendError> {
        let store = self.store.lock().await;
        store.authorize(token)?;
        self.check_readable()?;
        self.product_lists.fetch_add(1, Ordering::SeqCst);
        Ok(store
            .products
            .values()
            .cloned()
            .map(|row| store.joined(row))
            .collect())
    }

    async fn insert_category(
        &self,
        token: &str,
        row: &CategoryRowInput,
    ) -> Result<CategoryRow, BackendError> {
        let mut store = self.store.lock().await;
        store.authorize(token)?;
        self.check_writable()?;

        let id = store.next_category_id;
        store.next_category_id += 1;
        let stored = CategoryRow {
            category_id: id,
            name: row.name.clone(),
            image_url: Some(row.image_url.clone()),
        };
        store.categories.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_category(
        &self,
        token: &str,
        id: CategoryId,
        row: &CategoryRowInput,
    ) -> Result<(), BackendError> {
        let mut store = self.store.lock().await;
        store.authorize(token)?;
        self.check_writable()?;

        let existing = store
            .categories
            .get_mut(&id.as_i64())
            .ok_or_else(|| BackendError::NotFound(format!("categories {id}")))?;
        existing.name.clone_from(&row.name);
        existing.image_url = Some(row.image_url.clone());
        Ok(())
    }

    async fn delete_category(&self, token: &str, id: CategoryId) -> Result<(), BackendError> {
        let mut store = self.store.lock().await;
        store.authorize(token)?;
        self.check_writable()?;

        if !store.categories.contains_key(&id.as_i64()) {
            return Err(BackendError::NotFound(format!("categories {id}")));
        }
        if store
            .products
            .values()
            .any(|p| p.category_id == id.as_i64())
        {
            return Err(foreign_key_violation(format!(
                "update or delete on table \"categories\" violates foreign key constraint: \
                 category {id} is still referenced by products"
            )));
        }
        store.categories.remove(&id.as_i64());
        Ok(())
    }

    async fn insert_product(
        &self,
        token: &str,
        row: &ProductRowInput,
    ) -> Result<ProductRow, BackendError> {
        let mut store = self.store.lock().await;
        store.authorize(token)?;
        self.check_writable()?;
        store.require_category(row.category_id)?;

        let id = store.next_product_id;
        store.next_product_id += 1;
        let stored = ProductRow {
            product_id: id,
            name: row.name.clone(),
            description: Some(row.description.clone()),
            initial_stock: row.initial_stock,
            available_stock: row.available_stock,
            category_id: row.category_id,
            image_url: Some(row.image_url.clone()),
            categories: None,
        };
        store.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        row: &ProductRowInput,
    ) -> Result<(), BackendError> {
        let mut store = self.store.lock().await;
        store.authorize(token)?;
        self.check_writable()?;
        if !store.products.contains_key(&id.as_i64()) {
            return Err(BackendError::NotFound(format!("products {id}")));
        }
        store.require_category(row.category_id)?;

        if let Some(existing) = store.products.get_mut(&id.as_i64()) {
            existing.name.clone_from(&row.name);
            existing.description = Some(row.description.clone());
            existing.image_url = Some(row.image_url.clone());
            existing.initial_stock = row.initial_stock;
            existing.available_stock = row.available_stock;
            existing.category_id = row.category_id;
        }
        Ok(())
    }

    async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), BackendError> {
        let mut store = self.store.lock().await;
        store.authorize(token)?;
        self.check_writable()?;

        store
            .products
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("products {id}")))
    }

    async fn count(&self, token: &str, collection: Collection) -> Result<u64, BackendError> {
        let store = self.store.lock().await;
        store.authorize(token)?;
        let len = match collection {
            Collection::Products => store.products.len(),
            Collection::Categories => store.categories.len(),
        };
        Ok(len as u64)
    }
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let mut store = self.store.lock().await;
        let matches = store
            .users
            .get(email.as_str())
            .is_some_and(|stored| stored == password.expose_secret());
        if !matches {
            return Err(BackendError::Status {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(store.issue(email.as_str(), self.token_ttl))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let mut store = self.store.lock().await;
        let (email, old_access) = store.refresh_tokens.remove(refresh_token).ok_or_else(|| {
            BackendError::Status {
                status: 400,
                message: "Invalid Refresh Token: Refresh Token Not Found".to_string(),
            }
        })?;
        store.access_tokens.remove(&old_access);
        Ok(store.issue(&email, self.token_ttl))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 500,
                message: "Auth service unavailable".to_string(),
            });
        }
        let mut store = self.store.lock().await;
        let email = store
            .access_tokens
            .remove(access_token)
            .ok_or_else(|| BackendError::Unauthorized("Session not found".to_string()))?;
        store.refresh_tokens.retain(|_, (owner, _)| *owner != email);
        Ok(())
    }
}

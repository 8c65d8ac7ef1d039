//! Catalog queries and mutations.
//!
//! Lists are fetched whole from the backend and cached with `moka` under a
//! [`QueryKey`]. A successful write invalidates the matching list so the
//! next read refetches; a failed write leaves the cache untouched. A read
//! that overlaps an invalidation returns what it fetched but does not cache
//! it.

mod cache;

pub use cache::{CachedList, QueryKey};

use cache::Generations;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use storefront_admin_core::{Category, CategoryId, CategoryInput, Product, ProductId, ProductInput};

use crate::backend::{BackendError, CatalogBackend, CategoryRowInput, Collection, ProductRowInput};

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The requested entity is not in the catalog.
    #[error("{0} not found")]
    NotFound(String),
}

impl CatalogError {
    /// Whether the backend rejected the access token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Backend(BackendError::Unauthorized(_)))
    }
}

/// Row counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub products: u64,
    pub categories: u64,
}

/// Cached access to products and categories.
///
/// Cheaply cloneable; clones share the backend and the cache.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    backend: Arc<dyn CatalogBackend>,
    cache: Cache<QueryKey, CachedList>,
    generations: Generations,
}

impl CatalogService {
    /// Create a catalog service whose cached lists live for `ttl`.
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                backend,
                cache,
                generations: Generations::default(),
            }),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All products ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn products(&self, token: &str) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(CachedList::Products(products)) =
            self.inner.cache.get(&QueryKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let generation = self.inner.generations.current(QueryKey::Products);
        let rows = self.inner.backend.list_products(token).await?;
        let products: Arc<Vec<Product>> = Arc::new(rows.into_iter().map(Product::from).collect());

        self.store(
            QueryKey::Products,
            generation,
            CachedList::Products(Arc::clone(&products)),
        )
        .await;

        Ok(products)
    }

    /// All categories ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip_all)]
    pub async fn categories(&self, token: &str) -> Result<Arc<Vec<Category>>, CatalogError> {
        if let Some(CachedList::Categories(categories)) =
            self.inner.cache.get(&QueryKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let generation = self.inner.generations.current(QueryKey::Categories);
        let rows = self.inner.backend.list_categories(token).await?;
        let categories: Arc<Vec<Category>> =
            Arc::new(rows.into_iter().map(Category::from).collect());

        self.store(
            QueryKey::Categories,
            generation,
            CachedList::Categories(Arc::clone(&categories)),
        )
        .await;

        Ok(categories)
    }

    /// A single product, looked up in the product list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this id.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn product(&self, token: &str, id: ProductId) -> Result<Product, CatalogError> {
        self.products(token)
            .await?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("Product {id}")))
    }

    /// A single category, looked up in the category list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no category has this id.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn category(&self, token: &str, id: CategoryId) -> Result<Category, CatalogError> {
        self.categories(token)
            .await?
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("Category {id}")))
    }

    /// Exact product and category counts. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if either count request fails.
    #[instrument(skip_all)]
    pub async fn counts(&self, token: &str) -> Result<CatalogCounts, CatalogError> {
        let products = self.inner.backend.count(token, Collection::Products).await?;
        let categories = self
            .inner
            .backend
            .count(token, Collection::Categories)
            .await?;
        Ok(CatalogCounts {
            products,
            categories,
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the insert.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &str,
        input: &ProductInput,
    ) -> Result<Product, CatalogError> {
        let row = self
            .inner
            .backend
            .insert_product(token, &ProductRowInput::from(input))
            .await?;
        self.invalidate(QueryKey::Products).await;
        Ok(Product::from(row))
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update or the product
    /// does not exist.
    #[instrument(skip(self, token, input), fields(id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), CatalogError> {
        self.inner
            .backend
            .update_product(token, id, &ProductRowInput::from(input))
            .await?;
        self.invalidate(QueryKey::Products).await;
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete or the product
    /// does not exist.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), CatalogError> {
        self.inner.backend.delete_product(token, id).await?;
        self.invalidate(QueryKey::Products).await;
        Ok(())
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the insert.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        token: &str,
        input: &CategoryInput,
    ) -> Result<Category, CatalogError> {
        let row = self
            .inner
            .backend
            .insert_category(token, &CategoryRowInput::from(input))
            .await?;
        self.invalidate(QueryKey::Categories).await;
        Ok(Category::from(row))
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update or the category
    /// does not exist.
    #[instrument(skip(self, token, input), fields(id = %id))]
    pub async fn update_category(
        &self,
        token: &str,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<(), CatalogError> {
        self.inner
            .backend
            .update_category(token, id, &CategoryRowInput::from(input))
            .await?;
        self.invalidate(QueryKey::Categories).await;
        Ok(())
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete, for example
    /// while products still reference the category.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn delete_category(&self, token: &str, id: CategoryId) -> Result<(), CatalogError> {
        self.inner.backend.delete_category(token, id).await?;
        self.invalidate(QueryKey::Categories).await;
        Ok(())
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Cache a fetched list unless the query was invalidated since
    /// `generation` was read.
    async fn store(&self, key: QueryKey, generation: u64, value: CachedList) {
        let generations = &self.inner.generations;
        if generations.current(key) != generation {
            debug!(?key, "List changed while fetching, not caching");
            return;
        }

        self.inner.cache.insert(key, value).await;

        // An invalidation that landed between the check and the insert
        if generations.current(key) != generation {
            self.inner.cache.invalidate(&key).await;
        }
    }

    /// Drop a cached list so the next read refetches it.
    pub async fn invalidate(&self, key: QueryKey) {
        debug!(?key, "Invalidating cached list");
        self.inner.generations.bump(key);
        self.inner.cache.invalidate(&key).await;
    }

    /// Drop every cached list.
    pub async fn invalidate_all(&self) {
        self.inner.generations.bump(QueryKey::Products);
        self.inner.generations.bump(QueryKey::Categories);
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::backend::AuthProvider;
    use crate::backend::memory::InMemoryBackend;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicBool, Ordering};
    use storefront_admin_core::Email;
    use tokio::sync::Notify;

    use crate::backend::{CategoryRow, ProductRow};

    /// Delegates to the in-memory backend but pauses the first category
    /// listing after the rows were read.
    struct StallingBackend {
        inner: Arc<InMemoryBackend>,
        armed: AtomicBool,
        fetched: Notify,
        resume: Notify,
    }

    #[async_trait]
    impl CatalogBackend for StallingBackend {
        async fn list_categories(&self, token: &str) -> Result<Vec<CategoryRow>, BackendError> {
            let rows = self.inner.list_categories(token).await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.fetched.notify_one();
                self.resume.notified().await;
            }
            Ok(rows)
        }

        async fn list_products(&self, token: &str) -> Result<Vec<ProductRow>, BackendError> {
            self.inner.list_products(token).await
        }

        async fn insert_category(
            &self,
            token: &str,
            row: &CategoryRowInput,
        ) -> Result<CategoryRow, BackendError> {
            self.inner.insert_category(token, row).await
        }

        async fn update_category(
            &self,
            token: &str,
            id: CategoryId,
            row: &CategoryRowInput,
        ) -> Result<(), BackendError> {
            self.inner.update_category(token, id, row).await
        }

        async fn delete_category(&self, token: &str, id: CategoryId) -> Result<(), BackendError> {
            self.inner.delete_category(token, id).await
        }

        async fn insert_product(
            &self,
            token: &str,
            row: &ProductRowInput,
        ) -> Result<ProductRow, BackendError> {
            self.inner.insert_product(token, row).await
        }

        async fn update_product(
            &self,
            token: &str,
            id: ProductId,
            row: &ProductRowInput,
        ) -> Result<(), BackendError> {
            self.inner.update_product(token, id, row).await
        }

        async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), BackendError> {
            self.inner.delete_product(token, id).await
        }

        async fn count(&self, token: &str, collection: Collection) -> Result<u64, BackendError> {
            self.inner.count(token, collection).await
        }
    }

    async fn service() -> (CatalogService, Arc<InMemoryBackend>, String) {
        let backend = Arc::new(InMemoryBackend::new().with_user("ops@shop.test", "pw"));
        let session = backend
            .sign_in_with_password(
                &Email::parse("ops@shop.test").unwrap(),
                &SecretString::from("pw"),
            )
            .await
            .unwrap();
        let service = CatalogService::new(backend.clone(), Duration::from_secs(60));
        (service, backend, session.access_token)
    }

    fn drinks() -> CategoryInput {
        CategoryInput {
            name: "Drinks".to_string(),
            image: String::new(),
        }
    }

    fn cola(category_id: CategoryId) -> ProductInput {
        ProductInput {
            name: "Cola".to_string(),
            description: "Fizzy".to_string(),
            image: String::new(),
            initial_stock: 10,
            available_stock: 7,
            category_id,
        }
    }

    #[tokio::test]
    async fn test_lists_are_cached() {
        let (service, backend, token) = service().await;
        service.categories(&token).await.unwrap();
        service.categories(&token).await.unwrap();
        assert_eq!(backend.list_calls(Collection::Categories), 1);
    }

    #[tokio::test]
    async fn test_successful_create_invalidates_only_its_list() {
        let (service, backend, token) = service().await;
        service.categories(&token).await.unwrap();
        service.products(&token).await.unwrap();

        let drinks = service.create_category(&token, &drinks()).await.unwrap();

        let categories = service.categories(&token).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, drinks.id);
        assert_eq!(backend.list_calls(Collection::Categories), 2);

        service.products(&token).await.unwrap();
        assert_eq!(backend.list_calls(Collection::Products), 1);
    }

    #[tokio::test]
    async fn test_read_overlapping_a_write_is_not_cached() {
        let (_, memory, token) = service().await;
        let backend = Arc::new(StallingBackend {
            inner: memory,
            armed: AtomicBool::new(true),
            fetched: Notify::new(),
            resume: Notify::new(),
        });
        let service = CatalogService::new(backend.clone(), Duration::from_secs(60));

        let reader = {
            let service = service.clone();
            let token = token.clone();
            tokio::spawn(async move { service.categories(&token).await.map(|c| c.len()) })
        };

        // The reader holds the empty list while the write lands
        backend.fetched.notified().await;
        service.create_category(&token, &drinks()).await.unwrap();
        backend.resume.notify_one();

        assert_eq!(reader.await.unwrap().unwrap(), 0);
        assert_eq!(service.categories(&token).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let (service, backend, token) = service().await;
        let drinks = service.create_category(&token, &drinks()).await.unwrap();
        service.products(&token).await.unwrap();

        backend.set_fail_writes(true);
        let err = service
            .create_product(&token, &cola(drinks.id))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Backend(_)));

        service.products(&token).await.unwrap();
        assert_eq!(backend.list_calls(Collection::Products), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_invalidate() {
        let (service, backend, token) = service().await;
        let drinks = service.create_category(&token, &drinks()).await.unwrap();
        let created = service.create_product(&token, &cola(drinks.id)).await.unwrap();

        let mut edited = cola(drinks.id);
        edited.available_stock = 2;
        service.update_product(&token, created.id, &edited).await.unwrap();
        assert_eq!(
            service.product(&token, created.id).await.unwrap().available_stock,
            2
        );

        service.delete_product(&token, created.id).await.unwrap();
        assert!(service.products(&token).await.unwrap().is_empty());
        assert_eq!(backend.list_calls(Collection::Products), 2);
    }

    #[tokio::test]
    async fn test_product_joins_category_name() {
        let (service, _backend, token) = service().await;
        let drinks = service.create_category(&token, &drinks()).await.unwrap();
        service.create_product(&token, &cola(drinks.id)).await.unwrap();

        let products = service.products(&token).await.unwrap();
        assert_eq!(products[0].category_name, "Drinks");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (service, _backend, token) = service().await;
        let err = service
            .category(&token, CategoryId::new(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_counts_are_not_cached() {
        let (service, _backend, token) = service().await;
        assert_eq!(
            service.counts(&token).await.unwrap(),
            CatalogCounts {
                products: 0,
                categories: 0
            }
        );
        service.create_category(&token, &drinks()).await.unwrap();
        assert_eq!(service.counts(&token).await.unwrap().categories, 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_reported() {
        let (service, backend, token) = service().await;
        backend.expire_access_tokens().await;
        let err = service.products(&token).await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}

//! Cache types for catalog list queries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use storefront_admin_core::{Category, Product};

/// Cache key for catalog list queries.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum QueryKey {
    Products,
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CachedList {
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<Category>>),
}

/// Invalidation counters, one per query.
///
/// A read records the generation before fetching and only keeps its result
/// if no invalidation happened in between.
#[derive(Debug, Default)]
pub(super) struct Generations {
    products: AtomicU64,
    categories: AtomicU64,
}

impl Generations {
    const fn counter(&self, key: QueryKey) -> &AtomicU64 {
        match key {
            QueryKey::Products => &self.products,
            QueryKey::Categories => &self.categories,
        }
    }

    pub(super) fn current(&self, key: QueryKey) -> u64 {
        self.counter(key).load(Ordering::SeqCst)
    }

    pub(super) fn bump(&self, key: QueryKey) {
        self.counter(key).fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_only_touches_its_key() {
        let generations = Generations::default();
        generations.bump(QueryKey::Products);
        generations.bump(QueryKey::Products);
        assert_eq!(generations.current(QueryKey::Products), 2);
        assert_eq!(generations.current(QueryKey::Categories), 0);
    }
}

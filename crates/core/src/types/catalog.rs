//! Catalog view models and mutation inputs.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// A product category as shown in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Image URL (may be empty).
    pub image: String,
}

/// A product as shown in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub initial_stock: i64,
    pub available_stock: i64,
    pub category_id: CategoryId,
    /// Category name as joined by the backend at fetch time.
    ///
    /// May lag behind a rename until the product list is refetched; prefer
    /// resolving through the current category list and fall back to this.
    pub category_name: String,
    /// Image URL (may be empty).
    pub image: String,
}

impl Product {
    /// Resolve the display name of this product's category.
    ///
    /// Looks the category up in `categories` and falls back to the
    /// denormalized name when it is not present.
    #[must_use]
    pub fn resolved_category_name<'a>(&'a self, categories: &'a [Category]) -> &'a str {
        categories
            .iter()
            .find(|c| c.id == self.category_id)
            .map_or(self.category_name.as_str(), |c| c.name.as_str())
    }
}

/// Field set for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub image: String,
}

/// Field set for creating or updating a product.
///
/// Built only from validated form input; `category_id` always refers to a
/// category that was present in the fetched list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub image: String,
    pub initial_stock: i64,
    pub available_stock: i64,
    pub category_id: CategoryId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(category_id: i64, category_name: &str) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Cola".to_string(),
            description: String::new(),
            initial_stock: 10,
            available_stock: 4,
            category_id: CategoryId::new(category_id),
            category_name: category_name.to_string(),
            image: String::new(),
        }
    }

    #[test]
    fn test_resolved_category_name_prefers_current_list() {
        let categories = vec![Category {
            id: CategoryId::new(3),
            name: "Soft Drinks".to_string(),
            image: String::new(),
        }];
        let p = product(3, "Drinks");
        assert_eq!(p.resolved_category_name(&categories), "Soft Drinks");
    }

    #[test]
    fn test_resolved_category_name_falls_back_to_joined_name() {
        let p = product(9, "Snacks");
        assert_eq!(p.resolved_category_name(&[]), "Snacks");
    }
}

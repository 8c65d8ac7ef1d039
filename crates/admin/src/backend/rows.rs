//! Storage row shapes and their mapping to dashboard view models.
//!
//! The backend uses snake_case column names (`category_id`, `image_url`,
//! `initial_stock`, ...) and returns nullable text columns as `null`.

use serde::{Deserialize, Serialize};

use storefront_admin_core::{
    Category, CategoryId, CategoryInput, Product, ProductId, ProductInput,
};

/// A row of the `categories` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Writable columns of the `categories` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRowInput {
    pub name: String,
    pub image_url: String,
}

/// A row of the `products` table, optionally joined with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub initial_stock: i64,
    pub available_stock: i64,
    pub category_id: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Embedded category (present when selected with `categories(*)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryRow>,
}

/// Writable columns of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRowInput {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub initial_stock: i64,
    pub available_stock: i64,
    pub category_id: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.category_id),
            name: row.name,
            image: row.image_url.unwrap_or_default(),
        }
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.product_id),
            name: row.name,
            description: row.description.unwrap_or_default(),
            initial_stock: row.initial_stock,
            available_stock: row.available_stock,
            category_id: CategoryId::new(row.category_id),
            category_name: row.categories.map(|c| c.name).unwrap_or_default(),
            image: row.image_url.unwrap_or_default(),
        }
    }
}

impl From<&CategoryInput> for CategoryRowInput {
    fn from(input: &CategoryInput) -> Self {
        Self {
            name: input.name.clone(),
            image_url: input.image.clone(),
        }
    }
}

impl From<&ProductInput> for ProductRowInput {
    fn from(input: &ProductInput) -> Self {
        Self {
            name: input.name.clone(),
            description: input.description.clone(),
            image_url: input.image.clone(),
            initial_stock: input.initial_stock,
            available_stock: input.available_stock,
            category_id: input.category_id.as_i64(),
        }
    }
}

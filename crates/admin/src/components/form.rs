//! Create/edit forms for products and categories.
//!
//! A form collects field edits, validates them, and hands the resulting
//! input to a caller-supplied create or update action. It never talks to the
//! backend itself; [`submit`] turns the action's result into a notice.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;

use serde::Deserialize;

use storefront_admin_core::{Category, CategoryId, CategoryInput, Product, ProductInput};

use super::notice::Notice;

/// Whether a form creates a new entity or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

impl FormMode {
    /// Page title, e.g. "Add Product" or "Edit Category".
    #[must_use]
    pub fn title(self, entity: &str) -> String {
        match self {
            Self::Create => format!("Add {entity}"),
            Self::Edit => format!("Edit {entity}"),
        }
    }

    /// Submit button label.
    #[must_use]
    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Edit => "Update",
        }
    }

    /// Notice shown after a successful submit.
    #[must_use]
    pub fn success_message(self, entity: &str) -> String {
        match self {
            Self::Create => format!("{entity} created"),
            Self::Edit => format!("{entity} updated"),
        }
    }
}

/// Result of running a form's action.
#[derive(Debug)]
pub struct Submitted<T, E> {
    pub outcome: Result<T, E>,
    pub notice: Notice,
}

/// Run a create or update action and report the outcome as a notice.
///
/// Failures are logged and reported with the generic failure message.
pub async fn submit<T, E, F>(mode: FormMode, entity: &str, action: F) -> Submitted<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match action.await {
        Ok(value) => Submitted {
            outcome: Ok(value),
            notice: Notice::success(mode.success_message(entity)),
        },
        Err(e) => {
            tracing::warn!(error = %e, entity, ?mode, "Form submission failed");
            Submitted {
                outcome: Err(e),
                notice: Notice::something_went_wrong(),
            }
        }
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for a field, if it failed validation.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_stock(raw: &str, field: &'static str, errors: &mut FieldErrors) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => n,
        Ok(_) => {
            errors.add(field, "Must not be negative");
            0
        }
        Err(_) => {
            errors.add(field, "Must be a whole number");
            0
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Raw product form fields as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProductFormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub initial_stock: String,
    #[serde(default)]
    pub available_stock: String,
    #[serde(default)]
    pub category_id: String,
}

impl From<&Product> for ProductFormData {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            image: p.image.clone(),
            initial_stock: p.initial_stock.to_string(),
            available_stock: p.available_stock.to_string(),
            category_id: p.category_id.to_string(),
        }
    }
}

impl ProductFormData {
    /// Validate against the fetched category list.
    ///
    /// # Errors
    ///
    /// Returns the messages for every invalid field.
    pub fn validate(&self, categories: &[Category]) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        }

        let initial_stock = parse_stock(&self.initial_stock, "initial_stock", &mut errors);
        let available_stock = parse_stock(&self.available_stock, "available_stock", &mut errors);

        let category_id = match self.category_id.parse::<CategoryId>() {
            Ok(id) if categories.iter().any(|c| c.id == id) => Some(id),
            Ok(_) => {
                errors.add("category_id", "Choose an existing category");
                None
            }
            Err(_) => {
                errors.add("category_id", "Choose a category");
                None
            }
        };

        match category_id {
            Some(category_id) if errors.is_empty() => Ok(ProductInput {
                name: name.to_string(),
                description: self.description.trim().to_string(),
                image: self.image.trim().to_string(),
                initial_stock,
                available_stock,
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// Raw category form fields as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CategoryFormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

impl From<&Category> for CategoryFormData {
    fn from(c: &Category) -> Self {
        Self {
            name: c.name.clone(),
            image: c.image.clone(),
        }
    }
}

impl CategoryFormData {
    /// Validate the fields.
    ///
    /// # Errors
    ///
    /// Returns the messages for every invalid field.
    pub fn validate(&self) -> Result<CategoryInput, FieldErrors> {
        let name = self.name.trim();
        if name.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("name", "Name is required");
            return Err(errors);
        }

        Ok(CategoryInput {
            name: name.to_string(),
            image: self.image.trim().to_string(),
        })
    }
}

/// A category choice in the product form's select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Options for the category select, marking `selected_id` as chosen.
#[must_use]
pub fn category_options(categories: &[Category], selected_id: &str) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| {
            let id = c.id.to_string();
            CategoryOption {
                selected: id == selected_id.trim(),
                id,
                name: c.name.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: CategoryId::new(2),
            name: "Drinks".to_string(),
            image: String::new(),
        }]
    }

    fn valid() -> ProductFormData {
        ProductFormData {
            name: " Cola ".to_string(),
            description: "Fizzy".to_string(),
            image: String::new(),
            initial_stock: "10".to_string(),
            available_stock: "4".to_string(),
            category_id: "2".to_string(),
        }
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(FormMode::Create.title("Product"), "Add Product");
        assert_eq!(FormMode::Edit.title("Category"), "Edit Category");
        assert_eq!(FormMode::Create.submit_label(), "Create");
        assert_eq!(FormMode::Edit.submit_label(), "Update");
        assert_eq!(FormMode::Edit.success_message("Product"), "Product updated");
    }

    #[test]
    fn test_valid_product() {
        let input = valid().validate(&categories()).unwrap();
        assert_eq!(input.name, "Cola");
        assert_eq!(input.initial_stock, 10);
        assert_eq!(input.category_id, CategoryId::new(2));
    }

    #[test]
    fn test_empty_category_is_rejected_not_zero() {
        let form = ProductFormData {
            category_id: String::new(),
            ..valid()
        };
        let errors = form.validate(&categories()).unwrap_err();
        assert_eq!(errors.get("category_id"), Some("Choose a category"));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let form = ProductFormData {
            category_id: "7".to_string(),
            ..valid()
        };
        let errors = form.validate(&categories()).unwrap_err();
        assert_eq!(errors.get("category_id"), Some("Choose an existing category"));
    }

    #[test]
    fn test_bad_stock_values() {
        let form = ProductFormData {
            name: "  ".to_string(),
            initial_stock: "-1".to_string(),
            available_stock: "lots".to_string(),
            ..valid()
        };
        let errors = form.validate(&categories()).unwrap_err();
        assert_eq!(errors.get("initial_stock"), Some("Must not be negative"));
        assert_eq!(errors.get("available_stock"), Some("Must be a whole number"));
        assert_eq!(errors.get("name"), Some("Name is required"));
    }

    #[test]
    fn test_category_form() {
        let ok = CategoryFormData {
            name: "Drinks".to_string(),
            image: " https://cdn.test/d.png ".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.image, "https://cdn.test/d.png");

        assert!(CategoryFormData::default().validate().is_err());
    }

    #[test]
    fn test_prefill_from_product() {
        let product = Product {
            id: storefront_admin_core::ProductId::new(1),
            name: "Cola".to_string(),
            description: String::new(),
            initial_stock: 3,
            available_stock: 1,
            category_id: CategoryId::new(2),
            category_name: "Drinks".to_string(),
            image: String::new(),
        };
        let form = ProductFormData::from(&product);
        assert_eq!(form.category_id, "2");
        let options = category_options(&categories(), &form.category_id);
        assert!(options[0].selected);
    }

    #[tokio::test]
    async fn test_submit_reports_outcome() {
        let ok: Submitted<u8, String> =
            submit(FormMode::Create, "Category", async { Ok(1) }).await;
        assert_eq!(ok.notice, Notice::success("Category created"));

        let failed: Submitted<u8, String> =
            submit(FormMode::Edit, "Product", async { Err("boom".to_string()) }).await;
        assert!(failed.outcome.is_err());
        assert_eq!(failed.notice, Notice::something_went_wrong());
    }
}

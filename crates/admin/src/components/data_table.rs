//! Data table component types.
//!
//! These types define the configuration for the catalog tables in the admin panel.

use super::list_view::{ListState, SortDirection, SortKey};

/// Column definition for a data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Unique key for the column (the sort key for sortable columns).
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Whether the column is sortable.
    pub sortable: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: false,
        }
    }
}

/// A rendered column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub label: String,
    /// Link that applies the toggled sort (sortable columns only).
    pub href: Option<String>,
    /// Sort arrow for sortable columns.
    pub indicator: &'static str,
}

/// Configuration for a data table.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Whether to show the search box.
    pub searchable: bool,
    /// Title for empty state.
    pub empty_title: String,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            search_placeholder: "Search...".to_string(),
            searchable: false,
            empty_title: "No items found".to_string(),
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Enable the search box with a placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self.searchable = true;
        self
    }

    /// Set empty state title.
    #[must_use]
    pub fn empty_state(mut self, title: &str) -> Self {
        self.empty_title = title.to_string();
        self
    }

    /// Header cells for the current list state.
    ///
    /// Sortable headers link to the state with that column toggled.
    #[must_use]
    pub fn header_cells<K: SortKey>(&self, state: &ListState<K>, base_path: &str) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .map(|column| {
                let key = column.sortable.then(|| K::parse(&column.key)).flatten();
                match key {
                    Some(key) => {
                        let indicator = match state.sort {
                            Some(spec) if spec.key == key => match spec.direction {
                                SortDirection::Asc => "▲",
                                SortDirection::Desc => "▼",
                            },
                            _ => "↕",
                        };
                        HeaderCell {
                            label: column.label.clone(),
                            href: Some(state.toggle_sort(key).href(base_path)),
                            indicator,
                        }
                    }
                    None => HeaderCell {
                        label: column.label.clone(),
                        href: None,
                        indicator: "",
                    },
                }
            })
            .collect()
    }
}

/// Build the products table configuration.
#[must_use]
pub fn products_table_config() -> DataTableConfig {
    DataTableConfig::new("products")
        .column(TableColumn::sortable("name", "Name"))
        .column(TableColumn::new("description", "Description"))
        .column(TableColumn::sortable("initial_stock", "Initial Stock"))
        .column(TableColumn::sortable("available_stock", "Available Stock"))
        .column(TableColumn::new("category", "Category"))
        .column(TableColumn::new("image", "Image"))
        .column(TableColumn::new("actions", "Actions"))
        .search_placeholder("Search products...")
        .empty_state("No products found")
}

/// Build the categories table configuration.
#[must_use]
pub fn categories_table_config() -> DataTableConfig {
    DataTableConfig::new("categories")
        .column(TableColumn::new("name", "Name"))
        .column(TableColumn::new("image", "Image"))
        .column(TableColumn::new("actions", "Actions"))
        .empty_state("No categories found")
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::components::list_view::ProductSortKey;

    #[test]
    fn test_products_headers_link_to_toggled_sort() {
        let state = ListState::<ProductSortKey>::default()
            .with_query("tea")
            .toggle_sort(ProductSortKey::Name);
        let cells = products_table_config().header_cells(&state, "/dashboard/products");

        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0].indicator, "▲");
        assert_eq!(
            cells[0].href.as_deref(),
            Some("/dashboard/products?q=tea&sort=name&dir=desc")
        );
        assert_eq!(cells[2].indicator, "↕");
        assert_eq!(
            cells[2].href.as_deref(),
            Some("/dashboard/products?q=tea&sort=initial_stock&dir=asc")
        );
        assert_eq!(cells[1].href, None);
    }

    #[test]
    fn test_categories_table_is_plain() {
        let config = categories_table_config();
        assert!(!config.searchable);
        assert_eq!(config.empty_title, "No categories found");
        assert!(config.columns.iter().all(|c| !c.sortable));
    }
}

//! List view state: search, sort, and pagination over a fetched collection.
//!
//! The state lives in the query string (`?q=&sort=&dir=&page=`) and is turned
//! into the visible slice of rows on every render. Nothing here performs I/O.

use std::cmp::Ordering;

use serde::Deserialize;

use storefront_admin_core::{Category, Product};

/// Rows per page on the product list.
pub const PRODUCTS_PER_PAGE: usize = 5;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Query-string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parse the query-string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// A field value used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortValue<'a> {
    Text(&'a str),
    Number(i64),
}

impl SortValue<'_> {
    /// Compare two values.
    ///
    /// Text compares case-insensitively first and falls back to the raw
    /// strings to break ties. Mixed kinds compare equal.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A sortable column identifier with a stable query-string name.
pub trait SortKey: Copy + Eq + Sized {
    /// Query-string form.
    fn as_str(self) -> &'static str;

    /// Parse the query-string form.
    fn parse(s: &str) -> Option<Self>;
}

/// Rows that can be searched and sorted.
pub trait Listable {
    type Key: SortKey;

    /// Text fields checked by the search box.
    fn search_fields(&self) -> Vec<&str>;

    /// Value of a sortable column.
    fn sort_value(&self, key: Self::Key) -> SortValue<'_>;
}

/// Sortable product columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortKey {
    Name,
    InitialStock,
    AvailableStock,
}

impl SortKey for ProductSortKey {
    fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::InitialStock => "initial_stock",
            Self::AvailableStock => "available_stock",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "initial_stock" => Some(Self::InitialStock),
            "available_stock" => Some(Self::AvailableStock),
            _ => None,
        }
    }
}

impl Listable for Product {
    type Key = ProductSortKey;

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.category_name.as_str(),
        ]
    }

    fn sort_value(&self, key: ProductSortKey) -> SortValue<'_> {
        match key {
            ProductSortKey::Name => SortValue::Text(&self.name),
            ProductSortKey::InitialStock => SortValue::Number(self.initial_stock),
            ProductSortKey::AvailableStock => SortValue::Number(self.available_stock),
        }
    }
}

/// Replace each product's joined category name with the name from the
/// current category list, keeping the joined name when the id is unknown.
#[must_use]
pub fn resolve_category_names(products: &[Product], categories: &[Category]) -> Vec<Product> {
    products
        .iter()
        .map(|p| Product {
            category_name: p.resolved_category_name(categories).to_string(),
            ..p.clone()
        })
        .collect()
}

// =============================================================================
// Derivation
// =============================================================================

/// Rows whose search fields contain `query`, ignoring case.
///
/// An empty query keeps every row.
#[must_use]
pub fn filter<'a, T: Listable>(rows: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.to_lowercase();
    rows.iter()
        .filter(|row| {
            needle.is_empty()
                || row
                    .search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Stable sort by a column. `None` keeps fetch order.
pub fn sort<T: Listable>(rows: &mut [&T], spec: Option<SortSpec<T::Key>>) {
    let Some(spec) = spec else {
        return;
    };
    rows.sort_by(|a, b| {
        let ordering = a.sort_value(spec.key).compare(&b.sort_value(spec.key));
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Number of pages needed for `total` rows.
#[must_use]
pub const fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Rows on a 1-based page. Pages outside `1..=page_count` are empty.
#[must_use]
pub fn paginate<T>(rows: Vec<T>, page: usize, per_page: usize) -> Vec<T> {
    if page == 0 || per_page == 0 {
        return Vec::new();
    }
    rows.into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect()
}

// =============================================================================
// State
// =============================================================================

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<K> {
    pub key: K,
    pub direction: SortDirection,
}

/// Raw query-string parameters of a list page.
///
/// Kept as strings so malformed values degrade to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

/// Search text, sort, and current page of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<K> {
    pub query: String,
    pub sort: Option<SortSpec<K>>,
    /// 1-based.
    pub page: usize,
}

impl<K: SortKey> Default for ListState<K> {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: None,
            page: 1,
        }
    }
}

impl<K: SortKey> ListState<K> {
    /// Decode from query-string parameters.
    ///
    /// Unknown sort keys mean fetch order, unknown directions mean
    /// ascending, and an unparsable page means page 1.
    #[must_use]
    pub fn from_params(params: &ListParams) -> Self {
        let sort = params
            .sort
            .as_deref()
            .and_then(K::parse)
            .map(|key| SortSpec {
                key,
                direction: params
                    .dir
                    .as_deref()
                    .and_then(SortDirection::parse)
                    .unwrap_or_default(),
            });
        let page = params
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .unwrap_or(1);

        Self {
            query: params.q.clone().unwrap_or_default(),
            sort,
            page,
        }
    }

    /// New search text. Always returns to page 1.
    #[must_use]
    pub fn with_query(&self, query: &str) -> Self {
        Self {
            query: query.to_string(),
            sort: self.sort,
            page: 1,
        }
    }

    /// Click on a column header: the same key flips direction, a new key
    /// starts ascending.
    #[must_use]
    pub fn toggle_sort(&self, key: K) -> Self {
        let direction = match self.sort {
            Some(current) if current.key == key => current.direction.toggled(),
            _ => SortDirection::Asc,
        };
        Self {
            query: self.query.clone(),
            sort: Some(SortSpec { key, direction }),
            page: self.page,
        }
    }

    /// Jump to a page.
    #[must_use]
    pub fn with_page(&self, page: usize) -> Self {
        Self {
            query: self.query.clone(),
            sort: self.sort,
            page,
        }
    }

    /// Encode as a query string (without the leading `?`).
    ///
    /// Empty search text and page 1 are omitted.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        if !self.query.is_empty() {
            out.append_pair("q", &self.query);
        }
        if let Some(spec) = self.sort {
            out.append_pair("sort", spec.key.as_str());
            out.append_pair("dir", spec.direction.as_str());
        }
        if self.page != 1 {
            out.append_pair("page", &self.page.to_string());
        }
        out.finish()
    }

    /// Link to this state under `base_path`.
    #[must_use]
    pub fn href(&self, base_path: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            base_path.to_string()
        } else {
            format!("{base_path}?{query}")
        }
    }

    /// Filter, sort, and paginate `rows`.
    #[must_use]
    pub fn apply<'a, T>(&self, rows: &'a [T], per_page: usize) -> ListPage<'a, T>
    where
        T: Listable<Key = K>,
    {
        let mut matched = filter(rows, &self.query);
        sort(&mut matched, self.sort);
        let total = matched.len();

        ListPage {
            rows: paginate(matched, self.page, per_page),
            page: self.page,
            page_count: page_count(total, per_page),
            total,
        }
    }
}

/// The visible slice of a list.
#[derive(Debug)]
pub struct ListPage<'a, T> {
    pub rows: Vec<&'a T>,
    /// Requested page (1-based), possibly out of range.
    pub page: usize,
    pub page_count: usize,
    /// Number of rows that matched the search.
    pub total: usize,
}

/// A numbered page link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Pagination controls for a list page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pager {
    pub links: Vec<PageLink>,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl Pager {
    /// Build controls for `page_count` pages. Single-page lists get none.
    #[must_use]
    pub fn new<K: SortKey>(state: &ListState<K>, page_count: usize, base_path: &str) -> Self {
        if page_count <= 1 {
            return Self::default();
        }

        let links = (1..=page_count)
            .map(|number| PageLink {
                number,
                href: state.with_page(number).href(base_path),
                current: number == state.page,
            })
            .collect();
        let prev_href = (state.page > 1 && state.page <= page_count)
            .then(|| state.with_page(state.page - 1).href(base_path));
        let next_href = (state.page >= 1 && state.page < page_count)
            .then(|| state.with_page(state.page + 1).href(base_path));

        Self {
            links,
            prev_href,
            next_href,
        }
    }

    /// Whether any controls should render.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.links.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use storefront_admin_core::{CategoryId, ProductId};

    fn product(id: i64, name: &str, initial: i64, available: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            initial_stock: initial,
            available_stock: available,
            category_id: CategoryId::new(1),
            category_name: "Drinks".to_string(),
            image: String::new(),
        }
    }

    fn catalog(n: i64) -> Vec<Product> {
        (1..=n)
            .map(|i| product(i, &format!("Item {i:02}"), i, n - i))
            .collect()
    }

    fn ids(page: &ListPage<'_, Product>) -> Vec<i64> {
        page.rows.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_across_fields() {
        let mut rows = vec![
            product(1, "Cola", 1, 1),
            product(2, "Chips", 1, 1),
            product(3, "Water", 1, 1),
        ];
        rows[1].description = "Salted COLA flavour".to_string();
        rows[2].category_name = "Snacks".to_string();

        let matched: Vec<i64> = filter(&rows, "cola").iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(matched, vec![1, 2]);

        let matched: Vec<i64> = filter(&rows, "SNACK").iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(matched, vec![3]);

        assert_eq!(filter(&rows, "").len(), 3);
    }

    #[test]
    fn test_text_sort_ignores_case_with_raw_tie_break() {
        let rows = vec![
            product(1, "banana", 0, 0),
            product(2, "Apple", 0, 0),
            product(3, "apple", 0, 0),
            product(4, "Cherry", 0, 0),
        ];
        let state = ListState::<ProductSortKey>::default().toggle_sort(ProductSortKey::Name);
        let page = state.apply(&rows, 10);
        assert_eq!(ids(&page), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_numeric_sort_desc_reverses_asc() {
        let rows = vec![
            product(1, "a", 5, 0),
            product(2, "b", 2, 0),
            product(3, "c", 9, 0),
        ];
        let asc = ListState::default().toggle_sort(ProductSortKey::InitialStock);
        assert_eq!(ids(&asc.apply(&rows, 10)), vec![2, 1, 3]);

        let desc = asc.toggle_sort(ProductSortKey::InitialStock);
        assert_eq!(desc.sort.unwrap().direction, SortDirection::Desc);
        assert_eq!(ids(&desc.apply(&rows, 10)), vec![3, 1, 2]);
    }

    #[test]
    fn test_toggling_twice_restores_order_and_sort_is_stable() {
        let rows = vec![
            product(1, "a", 1, 7),
            product(2, "b", 1, 3),
            product(3, "c", 1, 7),
        ];
        let state = ListState::default()
            .toggle_sort(ProductSortKey::AvailableStock)
            .toggle_sort(ProductSortKey::AvailableStock)
            .toggle_sort(ProductSortKey::AvailableStock);
        assert_eq!(state.sort.unwrap().direction, SortDirection::Asc);
        assert_eq!(ids(&state.apply(&rows, 10)), vec![2, 1, 3]);
    }

    #[test]
    fn test_new_sort_key_starts_ascending() {
        let state = ListState::default()
            .toggle_sort(ProductSortKey::Name)
            .toggle_sort(ProductSortKey::Name)
            .toggle_sort(ProductSortKey::InitialStock);
        assert_eq!(
            state.sort,
            Some(SortSpec {
                key: ProductSortKey::InitialStock,
                direction: SortDirection::Asc
            })
        );
    }

    #[test]
    fn test_no_sort_keeps_fetch_order() {
        let rows = vec![product(3, "z", 0, 0), product(1, "a", 0, 0)];
        let page = ListState::<ProductSortKey>::default().apply(&rows, 10);
        assert_eq!(ids(&page), vec![3, 1]);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);
        assert_eq!(page_count(12, 5), 3);
    }

    #[test]
    fn test_first_page_of_twelve() {
        let rows = catalog(12);
        let page = ListState::<ProductSortKey>::default().apply(&rows, PRODUCTS_PER_PAGE);
        assert_eq!(ids(&page), vec![1, 2, 3, 4, 5]);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.total, 12);

        let last = ListState::<ProductSortKey>::default()
            .with_page(3)
            .apply(&rows, PRODUCTS_PER_PAGE);
        assert_eq!(ids(&last), vec![11, 12]);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let rows = catalog(12);
        let beyond = ListState::<ProductSortKey>::default().with_page(4);
        assert!(beyond.apply(&rows, PRODUCTS_PER_PAGE).rows.is_empty());
        let zero = ListState::<ProductSortKey>::default().with_page(0);
        assert!(zero.apply(&rows, PRODUCTS_PER_PAGE).rows.is_empty());
    }

    #[test]
    fn test_search_resets_page() {
        let state = ListState::<ProductSortKey>::default()
            .toggle_sort(ProductSortKey::Name)
            .with_page(3);
        let searched = state.with_query("cola");
        assert_eq!(searched.page, 1);
        assert_eq!(searched.sort, state.sort);
    }

    #[test]
    fn test_query_string_codec() {
        let params = ListParams {
            q: Some("lemon tea".to_string()),
            sort: Some("available_stock".to_string()),
            dir: Some("desc".to_string()),
            page: Some("2".to_string()),
        };
        let state = ListState::<ProductSortKey>::from_params(&params);
        assert_eq!(state.query, "lemon tea");
        assert_eq!(state.page, 2);
        assert_eq!(
            state.to_query_string(),
            "q=lemon+tea&sort=available_stock&dir=desc&page=2"
        );
        assert_eq!(
            ListState::<ProductSortKey>::default().href("/dashboard/products"),
            "/dashboard/products"
        );
    }

    #[test]
    fn test_query_is_matched_as_typed() {
        let rows = vec![product(1, "Cola", 1, 1), product(2, "Diet Cola", 1, 1)];
        let params = ListParams {
            q: Some(" cola".to_string()),
            ..ListParams::default()
        };
        let state = ListState::<ProductSortKey>::from_params(&params);
        assert_eq!(state.query, " cola");
        assert_eq!(ids(&state.apply(&rows, 10)), vec![2]);
    }

    #[test]
    fn test_malformed_params_fall_back() {
        let params = ListParams {
            q: None,
            sort: Some("price".to_string()),
            dir: Some("sideways".to_string()),
            page: Some("two".to_string()),
        };
        let state = ListState::<ProductSortKey>::from_params(&params);
        assert_eq!(state.sort, None);
        assert_eq!(state.page, 1);

        let params = ListParams {
            sort: Some("name".to_string()),
            dir: Some("sideways".to_string()),
            ..ListParams::default()
        };
        let state = ListState::<ProductSortKey>::from_params(&params);
        assert_eq!(state.sort.unwrap().direction, SortDirection::Asc);
    }

    #[test]
    fn test_pager_links() {
        let state = ListState::<ProductSortKey>::default().with_page(2);
        let pager = Pager::new(&state, 3, "/p");
        assert_eq!(pager.links.len(), 3);
        assert!(pager.links[1].current);
        assert_eq!(pager.prev_href.as_deref(), Some("/p"));
        assert_eq!(pager.next_href.as_deref(), Some("/p?page=3"));

        let first = Pager::new(&ListState::<ProductSortKey>::default(), 3, "/p");
        assert_eq!(first.prev_href, None);

        assert!(!Pager::new(&state, 1, "/p").is_visible());
    }

    #[test]
    fn test_resolve_category_names() {
        let categories = vec![Category {
            id: CategoryId::new(1),
            name: "Soft Drinks".to_string(),
            image: String::new(),
        }];
        let mut orphan = product(2, "Mystery", 0, 0);
        orphan.category_id = CategoryId::new(9);
        orphan.category_name = "Old".to_string();
        let resolved = resolve_category_names(&[product(1, "Cola", 0, 0), orphan], &categories);
        assert_eq!(resolved[0].category_name, "Soft Drinks");
        assert_eq!(resolved[1].category_name, "Old");
    }
}

//! Product management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use storefront_admin_core::{Category, Product, ProductId};

use crate::{
    components::{
        Chrome, Notice,
        data_table::{DataTableConfig, HeaderCell, products_table_config},
        form::{
            CategoryOption, FieldErrors, FormMode, ProductFormData, category_options, submit,
        },
        list_view::{
            ListParams, ListState, PRODUCTS_PER_PAGE, Pager, ProductSortKey, SortKey,
            resolve_category_names,
        },
        notice,
    },
    error::AppError,
    filters,
    middleware::RequireSession,
    models::AuthSession,
    services::session_gate::PRODUCTS_PATH,
    state::AppState,
};

use super::{back_to_list, or_notice, parse_id, render};

const ENTITY: &str = "Product";

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: Chrome,
    pub table: DataTableConfig,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<Product>,
    /// Number of products matching the search.
    pub total: usize,
    pub query: String,
    pub sort_key: &'static str,
    pub sort_dir: &'static str,
    pub pager: Pager,
}

/// Product create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub submit_label: &'static str,
    pub action: String,
    pub form: ProductFormData,
    pub errors: FieldErrors,
    pub options: Vec<CategoryOption>,
}

impl ProductFormTemplate {
    fn new(
        chrome: Chrome,
        mode: FormMode,
        id: Option<ProductId>,
        form: ProductFormData,
        errors: FieldErrors,
        categories: &[Category],
    ) -> Self {
        let action = id.map_or_else(
            || PRODUCTS_PATH.to_string(),
            |id| format!("{PRODUCTS_PATH}/{id}"),
        );
        Self {
            chrome,
            title: mode.title(ENTITY),
            submit_label: mode.submit_label(),
            action,
            options: category_options(categories, &form.category_id),
            form,
            errors,
        }
    }
}

/// Product detail page template.
#[derive(Template)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: Chrome,
    pub product: Product,
}

/// Products list page handler.
///
/// Search, sort, and page come from the query string; the full list is
/// fetched (or served from cache) and the visible page derived from it.
#[instrument(skip(auth, session, state))]
pub async fn index(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let mut chrome = Chrome::load(&session, &auth, PRODUCTS_PATH).await;
    let token = &auth.access_token;
    let products = or_notice(state.catalog().products(token).await, &mut chrome)?;
    let categories = or_notice(state.catalog().categories(token).await, &mut chrome)?;
    let products = resolve_category_names(&products, &categories);

    let list = ListState::<ProductSortKey>::from_params(&params);
    let page = list.apply(&products, PRODUCTS_PER_PAGE);
    let table = products_table_config();

    let template = ProductsIndexTemplate {
        headers: table.header_cells(&list, PRODUCTS_PATH),
        pager: Pager::new(&list, page.page_count, PRODUCTS_PATH),
        rows: page.rows.into_iter().cloned().collect(),
        total: page.total,
        query: list.query.clone(),
        sort_key: list.sort.map_or("", |s| s.key.as_str()),
        sort_dir: list.sort.map_or("", |s| s.direction.as_str()),
        table,
        chrome,
    };

    Ok(render(&template))
}

/// New product form handler.
#[instrument(skip_all)]
pub async fn new_product(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let mut chrome = Chrome::load(&session, &auth, PRODUCTS_PATH).await;
    let categories = or_notice(
        state.catalog().categories(&auth.access_token).await,
        &mut chrome,
    )?;

    Ok(render(&ProductFormTemplate::new(
        chrome,
        FormMode::Create,
        None,
        ProductFormData::default(),
        FieldErrors::default(),
        &categories,
    )))
}

/// Create product handler.
#[instrument(skip_all)]
pub async fn create(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Form(form): Form<ProductFormData>,
) -> Result<Response, AppError> {
    save(&state, &auth, &session, FormMode::Create, None, form).await
}

/// Product detail handler.
#[instrument(skip(auth, session, state))]
pub async fn show(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: ProductId = parse_id(&id, ENTITY)?;
    let product = match state.catalog().product(&auth.access_token, id).await {
        Ok(product) => product,
        Err(e) => return back_to_list(e, &session, PRODUCTS_PATH).await,
    };
    let chrome = Chrome::load(&session, &auth, PRODUCTS_PATH).await;

    Ok(render(&ProductShowTemplate { chrome, product }))
}

/// Edit product form handler.
#[instrument(skip(auth, session, state))]
pub async fn edit(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: ProductId = parse_id(&id, ENTITY)?;
    let product = match state.catalog().product(&auth.access_token, id).await {
        Ok(product) => product,
        Err(e) => return back_to_list(e, &session, PRODUCTS_PATH).await,
    };
    let mut chrome = Chrome::load(&session, &auth, PRODUCTS_PATH).await;
    let categories = or_notice(
        state.catalog().categories(&auth.access_token).await,
        &mut chrome,
    )?;

    Ok(render(&ProductFormTemplate::new(
        chrome,
        FormMode::Edit,
        Some(id),
        ProductFormData::from(&product),
        FieldErrors::default(),
        &categories,
    )))
}

/// Update product handler.
#[instrument(skip(auth, session, state, form))]
pub async fn update(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ProductFormData>,
) -> Result<Response, AppError> {
    let id: ProductId = parse_id(&id, ENTITY)?;
    save(&state, &auth, &session, FormMode::Edit, Some(id), form).await
}

/// Delete product handler.
#[instrument(skip(auth, session, state))]
pub async fn delete(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id: ProductId = parse_id(&id, ENTITY)?;

    match state.catalog().delete_product(&auth.access_token, id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            notice::flash(&session, Notice::success("Product deleted")).await;
        }
        Err(e) if e.is_unauthorized() => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::error!(product_id = %id, error = %e, "Failed to delete product");
            notice::flash(&session, Notice::something_went_wrong()).await;
        }
    }

    Ok(Redirect::to(PRODUCTS_PATH))
}

/// Validate and submit a product form.
///
/// Invalid input re-renders the form with field errors. A failed submit
/// re-renders it with the failure notice and the edits preserved.
async fn save(
    state: &AppState,
    auth: &AuthSession,
    session: &tower_sessions::Session,
    mode: FormMode,
    id: Option<ProductId>,
    form: ProductFormData,
) -> Result<Response, AppError> {
    // A pending notice stays queued for the page after the redirect
    let mut chrome = Chrome::new(PRODUCTS_PATH, &auth.email, None);
    let catalog = state.catalog();
    let token = &auth.access_token;
    let categories = or_notice(catalog.categories(token).await, &mut chrome)?;

    let input = match form.validate(&categories) {
        Ok(input) => input,
        Err(errors) => {
            let template = ProductFormTemplate::new(chrome, mode, id, form, errors, &categories);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response());
        }
    };

    let submitted = match id {
        Some(id) => submit(mode, ENTITY, catalog.update_product(token, id, &input)).await,
        None => {
            submit(mode, ENTITY, async {
                catalog.create_product(token, &input).await.map(|_| ())
            })
            .await
        }
    };

    match submitted.outcome {
        Ok(()) => {
            notice::flash(session, submitted.notice).await;
            Ok(Redirect::to(PRODUCTS_PATH).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(AppError::SessionExpired),
        Err(_) => {
            chrome.notice = Some(submitted.notice);
            let template = ProductFormTemplate::new(
                chrome,
                mode,
                id,
                form,
                FieldErrors::default(),
                &categories,
            );
            Ok(render(&template))
        }
    }
}

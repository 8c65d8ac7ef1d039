//! Category management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use storefront_admin_core::{Category, CategoryId};

use crate::{
    components::{
        Chrome, Notice,
        data_table::{DataTableConfig, categories_table_config},
        form::{CategoryFormData, FieldErrors, FormMode, submit},
        notice,
    },
    error::AppError,
    filters,
    middleware::RequireSession,
    models::AuthSession,
    state::AppState,
};

use super::{back_to_list, or_notice, parse_id, render};

const ENTITY: &str = "Category";

/// Category list path.
const CATEGORIES_PATH: &str = "/dashboard/categories";

/// Categories list page template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub chrome: Chrome,
    pub table: DataTableConfig,
    pub rows: Vec<Category>,
}

/// Category create/edit form template.
#[derive(Template)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub submit_label: &'static str,
    pub action: String,
    pub form: CategoryFormData,
    pub errors: FieldErrors,
}

impl CategoryFormTemplate {
    fn new(
        chrome: Chrome,
        mode: FormMode,
        id: Option<CategoryId>,
        form: CategoryFormData,
        errors: FieldErrors,
    ) -> Self {
        Self {
            chrome,
            title: mode.title(ENTITY),
            submit_label: mode.submit_label(),
            action: id.map_or_else(
                || CATEGORIES_PATH.to_string(),
                |id| format!("{CATEGORIES_PATH}/{id}"),
            ),
            form,
            errors,
        }
    }
}

/// Category detail page template.
#[derive(Template)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub chrome: Chrome,
    pub category: Category,
}

/// Categories list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let mut chrome = Chrome::load(&session, &auth, CATEGORIES_PATH).await;
    let categories = or_notice(
        state.catalog().categories(&auth.access_token).await,
        &mut chrome,
    )?;

    Ok(render(&CategoriesIndexTemplate {
        chrome,
        table: categories_table_config(),
        rows: categories.to_vec(),
    }))
}

/// New category form handler.
#[instrument(skip_all)]
pub async fn new_category(RequireSession { auth, session }: RequireSession) -> Response {
    let chrome = Chrome::load(&session, &auth, CATEGORIES_PATH).await;

    render(&CategoryFormTemplate::new(
        chrome,
        FormMode::Create,
        None,
        CategoryFormData::default(),
        FieldErrors::default(),
    ))
}

/// Create category handler.
#[instrument(skip_all)]
pub async fn create(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Form(form): Form<CategoryFormData>,
) -> Result<Response, AppError> {
    save(&state, &auth, &session, None, form).await
}

/// Category detail handler.
#[instrument(skip(auth, session, state))]
pub async fn show(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: CategoryId = parse_id(&id, ENTITY)?;
    let category = match state.catalog().category(&auth.access_token, id).await {
        Ok(category) => category,
        Err(e) => return back_to_list(e, &session, CATEGORIES_PATH).await,
    };
    let chrome = Chrome::load(&session, &auth, CATEGORIES_PATH).await;

    Ok(render(&CategoryShowTemplate { chrome, category }))
}

/// Edit category form handler.
#[instrument(skip(auth, session, state))]
pub async fn edit(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: CategoryId = parse_id(&id, ENTITY)?;
    let category = match state.catalog().category(&auth.access_token, id).await {
        Ok(category) => category,
        Err(e) => return back_to_list(e, &session, CATEGORIES_PATH).await,
    };
    let chrome = Chrome::load(&session, &auth, CATEGORIES_PATH).await;

    Ok(render(&CategoryFormTemplate::new(
        chrome,
        FormMode::Edit,
        Some(id),
        CategoryFormData::from(&category),
        FieldErrors::default(),
    )))
}

/// Update category handler.
#[instrument(skip(auth, session, state, form))]
pub async fn update(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CategoryFormData>,
) -> Result<Response, AppError> {
    let id: CategoryId = parse_id(&id, ENTITY)?;
    save(&state, &auth, &session, Some(id), form).await
}

/// Delete category handler.
///
/// The backend refuses to delete a category that products still use; that
/// surfaces as the generic failure notice.
#[instrument(skip(auth, session, state))]
pub async fn delete(
    RequireSession { auth, session }: RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id: CategoryId = parse_id(&id, ENTITY)?;

    match state.catalog().delete_category(&auth.access_token, id).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category deleted");
            notice::flash(&session, Notice::success("Category deleted")).await;
        }
        Err(e) if e.is_unauthorized() => return Err(AppError::SessionExpired),
        Err(e) => {
            tracing::error!(category_id = %id, error = %e, "Failed to delete category");
            notice::flash(&session, Notice::something_went_wrong()).await;
        }
    }

    Ok(Redirect::to(CATEGORIES_PATH))
}

/// Validate and submit a category form.
async fn save(
    state: &AppState,
    auth: &AuthSession,
    session: &Session,
    id: Option<CategoryId>,
    form: CategoryFormData,
) -> Result<Response, AppError> {
    let mode = if id.is_some() {
        FormMode::Edit
    } else {
        FormMode::Create
    };
    // A pending notice stays queued for the page after the redirect
    let mut chrome = Chrome::new(CATEGORIES_PATH, &auth.email, None);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let template = CategoryFormTemplate::new(chrome, mode, id, form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response());
        }
    };

    let catalog = state.catalog();
    let token = &auth.access_token;
    let submitted = match id {
        Some(id) => submit(mode, ENTITY, catalog.update_category(token, id, &input)).await,
        None => {
            submit(mode, ENTITY, async {
                catalog.create_category(token, &input).await.map(|_| ())
            })
            .await
        }
    };

    match submitted.outcome {
        Ok(()) => {
            notice::flash(session, submitted.notice).await;
            Ok(Redirect::to(CATEGORIES_PATH).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(AppError::SessionExpired),
        Err(_) => {
            chrome.notice = Some(submitted.notice);
            let template =
                CategoryFormTemplate::new(chrome, mode, id, form, FieldErrors::default());
            Ok(render(&template))
        }
    }
}

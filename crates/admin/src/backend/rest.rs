//! HTTP client for the hosted backend.
//!
//! Uses `reqwest` against two APIs on the same host:
//! - `/rest/v1/<table>` - PostgREST-style row access
//! - `/auth/v1/*` - GoTrue-style session management

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};
use url::Url;

use storefront_admin_core::{CategoryId, Email, ProductId};

use super::{
    AuthProvider, BackendError, CatalogBackend, CategoryRow, CategoryRowInput, Collection,
    ProductRow, ProductRowInput,
};
use crate::config::BackendConfig;
use crate::models::AuthSession;

/// Lifetime assumed when the auth service omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// =============================================================================
// RestBackend
// =============================================================================

/// Client for the hosted database and auth APIs.
///
/// Cheaply cloneable; the underlying `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestBackendInner>,
}

struct RestBackendInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl RestBackend {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(RestBackendInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    /// Build an endpoint URL under the configured base.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.inner.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}/{path}"));
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Start a request carrying the project key and a bearer token.
    ///
    /// Without a user token the anon key doubles as the bearer, which is what
    /// the auth endpoints expect before sign-in.
    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let anon_key = self.inner.anon_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", anon_key)
            .bearer_auth(token.unwrap_or(anon_key))
    }

    /// Send a row request and decode the JSON array it returns.
    async fn rows<T, B>(
        &self,
        method: Method,
        collection: Collection,
        query: &[(&str, &str)],
        token: &str,
        body: Option<&B>,
    ) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(&format!("rest/v1/{}", collection.table()), query);
        let mut req = self.request(method.clone(), url, Some(token));
        if method != Method::GET {
            req = req.header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = check_status(req.send().await?).await?;
        decode_json(response).await
    }

    async fn token_request<B: Serialize + ?Sized>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<AuthSession, BackendError> {
        let url = self.endpoint("auth/v1/token", &[("grant_type", grant_type)]);
        let response = self.request(Method::POST, url, None).json(body).send().await?;
        let token: TokenResponse = decode_json(check_status(response).await?).await?;
        Ok(token.into_session(Utc::now()))
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogBackend for RestBackend {
    #[instrument(skip(self, token))]
    async fn list_categories(&self, token: &str) -> Result<Vec<CategoryRow>, BackendError> {
        self.rows(
            Method::GET,
            Collection::Categories,
            &[("select", "*"), ("order", "category_id.asc")],
            token,
            None::<&()>,
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn list_products(&self, token: &str) -> Result<Vec<ProductRow>, BackendError> {
        self.rows(
            Method::GET,
            Collection::Products,
            &[("select", "*,categories(*)"), ("order", "product_id.asc")],
            token,
            None::<&()>,
        )
        .await
    }

    #[instrument(skip(self, token, row), fields(name = %row.name))]
    async fn insert_category(
        &self,
        token: &str,
        row: &CategoryRowInput,
    ) -> Result<CategoryRow, BackendError> {
        let rows: Vec<CategoryRow> = self
            .rows(
                Method::POST,
                Collection::Categories,
                &[],
                token,
                Some(std::slice::from_ref(row)),
            )
            .await?;
        single(rows, Collection::Categories)
    }

    #[instrument(skip(self, token, row), fields(id = %id))]
    async fn update_category(
        &self,
        token: &str,
        id: CategoryId,
        row: &CategoryRowInput,
    ) -> Result<(), BackendError> {
        let filter = format!("eq.{id}");
        let rows: Vec<CategoryRow> = self
            .rows(
                Method::PATCH,
                Collection::Categories,
                &[(Collection::Categories.id_column(), &filter)],
                token,
                Some(row),
            )
            .await?;
        expect_affected(&rows, Collection::Categories, id.as_i64())
    }

    #[instrument(skip(self, token), fields(id = %id))]
    async fn delete_category(&self, token: &str, id: CategoryId) -> Result<(), BackendError> {
        let filter = format!("eq.{id}");
        let rows: Vec<CategoryRow> = self
            .rows(
                Method::DELETE,
                Collection::Categories,
                &[(Collection::Categories.id_column(), &filter)],
                token,
                None::<&()>,
            )
            .await?;
        expect_affected(&rows, Collection::Categories, id.as_i64())
    }

    #[instrument(skip(self, token, row), fields(name = %row.name))]
    async fn insert_product(
        &self,
        token: &str,
        row: &ProductRowInput,
    ) -> Result<ProductRow, BackendError> {
        let rows: Vec<ProductRow> = self
            .rows(
                Method::POST,
                Collection::Products,
                &[],
                token,
                Some(std::slice::from_ref(row)),
            )
            .await?;
        single(rows, Collection::Products)
    }

    #[instrument(skip(self, token, row), fields(id = %id))]
    async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        row: &ProductRowInput,
    ) -> Result<(), BackendError> {
        let filter = format!("eq.{id}");
        let rows: Vec<ProductRow> = self
            .rows(
                Method::PATCH,
                Collection::Products,
                &[(Collection::Products.id_column(), &filter)],
                token,
                Some(row),
            )
            .await?;
        expect_affected(&rows, Collection::Products, id.as_i64())
    }

    #[instrument(skip(self, token), fields(id = %id))]
    async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), BackendError> {
        let filter = format!("eq.{id}");
        let rows: Vec<ProductRow> = self
            .rows(
                Method::DELETE,
                Collection::Products,
                &[(Collection::Products.id_column(), &filter)],
                token,
                None::<&()>,
            )
            .await?;
        expect_affected(&rows, Collection::Products, id.as_i64())
    }

    #[instrument(skip(self, token))]
    async fn count(&self, token: &str, collection: Collection) -> Result<u64, BackendError> {
        let url = self.endpoint(
            &format!("rest/v1/{}", collection.table()),
            &[("select", "*")],
        );
        let response = self
            .request(Method::HEAD, url, Some(token))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check_status(response).await?;

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BackendError::InvalidResponse("missing Content-Range".to_string()))?;

        parse_content_range_total(range).ok_or_else(|| {
            BackendError::InvalidResponse(format!("unexpected Content-Range: {range}"))
        })
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| {
                now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS))
            });

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user_id: self.user.id,
            email: self.user.email.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        self.token_request(
            "password",
            &PasswordGrant {
                email: email.as_str(),
                password: password.expose_secret(),
            },
        )
        .await
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        self.token_request("refresh_token", &RefreshGrant { refresh_token })
            .await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout", &[]);
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Error body shapes used by the database and auth APIs.
#[derive(Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Extract the human-readable message from a provider error body.
fn provider_message(body: &str) -> Option<String> {
    let parsed: ProviderErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
}

/// Map non-success statuses to `BackendError`.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = provider_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    tracing::warn!(
        status = %status,
        message = %message,
        "Backend returned non-success status"
    );

    Err(match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        _ => BackendError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}

fn single<T>(rows: Vec<T>, collection: Collection) -> Result<T, BackendError> {
    rows.into_iter().next().ok_or_else(|| {
        BackendError::InvalidResponse(format!("insert into {} returned no row", collection.table()))
    })
}

fn expect_affected<T>(rows: &[T], collection: Collection, id: i64) -> Result<(), BackendError> {
    if rows.is_empty() {
        debug!(table = collection.table(), id, "No rows affected");
        return Err(BackendError::NotFound(format!("{} {id}", collection.table())));
    }
    Ok(())
}

/// Parse the total from a `Content-Range` header (`0-24/25`, `*/0`).
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

//! Integration tests for sign-in, sign-out, and the route guard.
//!
//! Run with: cargo test -p storefront-admin-integration-tests

use chrono::Duration;
use reqwest::StatusCode;
use storefront_admin::backend::memory::InMemoryBackend;
use storefront_admin_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp, location};

#[tokio::test]
async fn test_root_redirects_to_login() {
    let app = TestApp::spawn().await;

    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get_page("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_protected_pages_redirect_when_signed_out() {
    let app = TestApp::spawn().await;

    for path in [
        "/dashboard",
        "/dashboard/products",
        "/dashboard/products/new",
        "/dashboard/categories",
        "/dashboard/categories/1/edit",
    ] {
        let resp = app.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/auth", "{path}");
    }
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get_page("/auth").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sign in"));
    assert!(body.contains(r#"action="/auth""#));
}

#[tokio::test]
async fn test_sign_in_lands_on_products() {
    let app = TestApp::spawn().await;

    let resp = app.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard/products");

    let (status, body) = app.get_page("/dashboard/products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(ADMIN_EMAIL));

    // Already signed in: the login page forwards to the product list
    let resp = app.get("/auth").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard/products");
}

#[tokio::test]
async fn test_wrong_password_shows_provider_message() {
    let app = TestApp::spawn().await;

    let resp = app.sign_in(ADMIN_EMAIL, "wrong").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("body");
    assert!(body.contains("Invalid login credentials"));
    assert!(body.contains(ADMIN_EMAIL));

    let resp = app.get("/dashboard").await;
    assert_eq!(location(&resp), "/auth");
}

#[tokio::test]
async fn test_malformed_email_is_rejected_before_backend() {
    let app = TestApp::spawn().await;

    let resp = app.sign_in("not-an-email", ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("body");
    assert!(body.contains("email must look like name@domain"));
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let app = TestApp::signed_in().await;

    let resp = app.post_form("/auth/logout", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth");

    let resp = app.get("/dashboard").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth");

    let (status, _) = app.get_page("/auth").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_sign_out_keeps_session() {
    let app = TestApp::signed_in().await;
    app.backend.set_fail_sign_out(true);

    let resp = app.post_form("/auth/logout", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    // The provider's message is shown as-is and the user is still signed in
    let (status, body) = app.get_page("/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Auth service unavailable"));
    assert!(body.contains(ADMIN_EMAIL));
}

#[tokio::test]
async fn test_expiring_token_is_refreshed() {
    let backend = InMemoryBackend::new()
        .with_user(ADMIN_EMAIL, ADMIN_PASSWORD)
        .with_token_ttl(Duration::seconds(30));
    let app = TestApp::spawn_with(backend).await;
    let resp = app.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // Every request is inside the refresh margin, so each one rotates the
    // tokens and revokes the previous access token
    for _ in 0..3 {
        let (status, body) = app.get_page("/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Total Products"));
    }
}

#[tokio::test]
async fn test_revoked_token_ends_session() {
    let app = TestApp::signed_in().await;
    app.backend.expire_access_tokens().await;

    // Counts are never cached, so the backend sees the revoked token
    let resp = app.get("/dashboard").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth");

    // The session was cleared, so the login page renders instead of looping
    let (status, body) = app.get_page("/auth").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sign in"));
}

#[tokio::test]
async fn test_dashboard_shows_counts() {
    let app = TestApp::signed_in().await;
    app.create_category("Drinks").await;
    app.create_category("Snacks").await;
    app.create_product("Cola", "10", "1").await;

    let (status, body) = app.get_page("/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Total Products"));
    assert!(body.contains("Total Categories"));
    assert!(body.contains(r#"<span class="card-value">1</span>"#));
    assert!(body.contains(r#"<span class="card-value">2</span>"#));
}

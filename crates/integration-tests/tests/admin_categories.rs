//! Integration tests for category management.
//!
//! Run with: cargo test -p storefront-admin-integration-tests

use reqwest::StatusCode;
use storefront_admin_integration_tests::{TestApp, location};

#[tokio::test]
async fn test_empty_list() {
    let app = TestApp::signed_in().await;

    let (status, body) = app.get_page("/dashboard/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No categories found"));
    assert!(body.contains("Add Category"));
}

#[tokio::test]
async fn test_created_category_is_listed_and_selectable() {
    let app = TestApp::signed_in().await;

    let (_, body) = app.get_page("/dashboard/categories/new").await;
    assert!(body.contains("Add Category"));
    assert!(body.contains(">Create<"));

    let resp = app
        .post_form(
            "/dashboard/categories",
            &[("name", "Drinks"), ("image", "https://cdn.test/drinks.png")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard/categories");

    let (_, body) = app.get_page("/dashboard/categories").await;
    assert!(body.contains("Category created"));
    assert!(body.contains(r#"<a href="/dashboard/categories/1">Drinks</a>"#));

    // The product form offers the new category
    let (_, body) = app.get_page("/dashboard/products/new").await;
    assert!(body.contains(r#"<option value="1">Drinks</option>"#));

    app.create_product("Cola", "10", "1").await;
    let (_, body) = app.get_page("/dashboard/products/1/edit").await;
    assert!(body.contains(r#"<option value="1" selected>Drinks</option>"#));
}

#[tokio::test]
async fn test_rename_category_updates_product_list() {
    let app = TestApp::signed_in().await;
    app.create_category("Drinks").await;
    app.create_product("Cola", "10", "1").await;

    let resp = app
        .post_form(
            "/dashboard/categories/1",
            &[("name", "Beverages"), ("image", "")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let (_, body) = app.get_page("/dashboard/categories/1").await;
    assert!(body.contains("Beverages"));

    let (_, body) = app.get_page("/dashboard/products").await;
    assert!(body.contains("<td>Beverages</td>"));
}

#[tokio::test]
async fn test_category_in_use_cannot_be_deleted() {
    let app = TestApp::signed_in().await;
    app.create_category("Drinks").await;
    app.create_product("Cola", "10", "1").await;

    let resp = app.post_form("/dashboard/categories/1/delete", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard/categories");

    let (_, body) = app.get_page("/dashboard/categories").await;
    assert!(body.contains("Something went wrong"));
    assert!(body.contains("Drinks"));
}

#[tokio::test]
async fn test_delete_unused_category() {
    let app = TestApp::signed_in().await;
    app.create_category("Drinks").await;

    let resp = app.post_form("/dashboard/categories/1/delete", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let (_, body) = app.get_page("/dashboard/categories").await;
    assert!(body.contains("Category deleted"));
    assert!(body.contains("No categories found"));
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let app = TestApp::signed_in().await;

    let resp = app
        .post_form("/dashboard/categories", &[("name", "  "), ("image", "")])
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("body");
    assert!(body.contains("Name is required"));
}

#[tokio::test]
async fn test_rejected_form_leaves_pending_notice_queued() {
    let app = TestApp::signed_in().await;
    app.create_category("Drinks").await;

    let resp = app
        .post_form("/dashboard/categories", &[("name", ""), ("image", "")])
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = app.get_page("/dashboard/categories").await;
    assert!(body.contains("Category created"));
}

#[tokio::test]
async fn test_failed_lookup_returns_to_list_with_notice() {
    let app = TestApp::signed_in().await;
    app.create_category("Drinks").await;
    app.backend.set_fail_reads(true);

    let resp = app.get("/dashboard/categories/1/edit").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard/categories");

    app.backend.set_fail_reads(false);
    let (_, body) = app.get_page("/dashboard/categories").await;
    assert!(body.contains("Something went wrong"));
}

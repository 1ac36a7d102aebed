//! Integration tests for favorites (hearts), reviews, and the
//! store-deletion cascade.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//!   (`savory-cli migrate`)
//! - The site running (`cargo run -p savory-site`)
//! - `SITE_DATABASE_URL` set, for the post-delete dangling-reference scan
//!
//! Run with: `cargo test -p savory-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::Value;
use sqlx::PgPool;

use savory_integration_tests::{client, create_test_store, register_test_user, site_base_url};

async fn store_id_for_slug(pool: &PgPool, slug: &str) -> i32 {
    sqlx::query_scalar("SELECT id FROM stores WHERE slug = $1")
        .bind(slug)
        .fetch_one(pool)
        .await
        .expect("store missing from database")
}

async fn toggle_heart(client: &Client, store_id: i32) -> Vec<i64> {
    let base_url = site_base_url();
    let resp = client
        .post(format!("{base_url}/api/store/{store_id}/heart"))
        .send()
        .await
        .expect("Failed to toggle heart");

    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.expect("Failed to parse heart JSON");
    user["hearts"]
        .as_array()
        .expect("hearts missing")
        .iter()
        .map(|v| v.as_i64().expect("heart id not a number"))
        .collect()
}

async fn test_pool() -> PgPool {
    let url = std::env::var("SITE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("SITE_DATABASE_URL must be set for database-scan tests");
    PgPool::connect(&url).await.expect("Failed to connect")
}

// ============================================================================
// Favorite Toggle
// ============================================================================

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_heart_toggle_is_idempotent_under_double_toggle() {
    let client = client();
    register_test_user(&client).await;
    let slug = create_test_store(&client, "Heartable Bakery").await;

    let pool = test_pool().await;
    let store_id = store_id_for_slug(&pool, &slug).await;

    // Toggle on: the store joins the hearts set exactly once
    let hearts = toggle_heart(&client, store_id).await;
    assert_eq!(
        hearts.iter().filter(|h| **h == i64::from(store_id)).count(),
        1
    );

    // Toggle off: back to the original (empty) set
    let hearts = toggle_heart(&client, store_id).await;
    assert!(!hearts.contains(&i64::from(store_id)));
}

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_heart_never_duplicates() {
    let client = client();
    register_test_user(&client).await;
    let slug = create_test_store(&client, "Twice Hearted Cafe").await;

    let pool = test_pool().await;
    let store_id = store_id_for_slug(&pool, &slug).await;

    // Three toggles end hearted, a fourth unhearted, a fifth hearted
    // again; membership never exceeds one no matter how many flips
    for _ in 0..3 {
        toggle_heart(&client, store_id).await;
    }
    let hearts = toggle_heart(&client, store_id).await;
    assert!(!hearts.contains(&i64::from(store_id)));

    let hearts = toggle_heart(&client, store_id).await;
    assert_eq!(
        hearts.iter().filter(|h| **h == i64::from(store_id)).count(),
        1
    );

    let db_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM hearts WHERE store_id = $1")
            .bind(store_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to count hearts");
    assert!(db_count <= 1, "composite key must prevent duplicates");
}

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_heart_requires_auth() {
    let anonymous = client();
    let base_url = site_base_url();

    let resp = anonymous
        .post(format!("{base_url}/api/store/1/heart"))
        .send()
        .await
        .expect("Failed to send heart request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_review_create_and_render() {
    let client = client();
    register_test_user(&client).await;
    let slug = create_test_store(&client, "Reviewable Ramen").await;

    let pool = test_pool().await;
    let store_id = store_id_for_slug(&pool, &slug).await;
    let base_url = site_base_url();

    let resp = client
        .post(format!("{base_url}/reviews/{store_id}"))
        .form(&[("text", "Broth of the year."), ("rating", "5")])
        .send()
        .await
        .expect("Failed to post review");
    assert!(resp.status().is_success() || resp.status().is_redirection());

    let body = client
        .get(format!("{base_url}/store/{slug}"))
        .send()
        .await
        .expect("Failed to load detail page")
        .text()
        .await
        .expect("Failed to read detail page");
    assert!(body.contains("Broth of the year."));
}

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_review_edit_rejected_for_non_owner() {
    let author = client();
    register_test_user(&author).await;
    let slug = create_test_store(&author, "Guarded Grill").await;

    let pool = test_pool().await;
    let store_id = store_id_for_slug(&pool, &slug).await;
    let base_url = site_base_url();

    author
        .post(format!("{base_url}/reviews/{store_id}"))
        .form(&[("text", "Mine to edit."), ("rating", "4")])
        .send()
        .await
        .expect("Failed to post review");

    let review_id: i32 =
        sqlx::query_scalar("SELECT id FROM reviews WHERE store_id = $1")
            .bind(store_id)
            .fetch_one(&pool)
            .await
            .expect("review missing");

    // A different logged-in user must not be able to edit it
    let interloper = client();
    register_test_user(&interloper).await;

    let resp = interloper
        .post(format!("{base_url}/reviews/{review_id}/edit"))
        .form(&[("text", "Hijacked!"), ("rating", "1")])
        .send()
        .await
        .expect("Failed to send edit");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Cascade Delete
// ============================================================================

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_store_delete_cascades_with_no_dangling_references() {
    let client = client();
    register_test_user(&client).await;
    let slug = create_test_store(&client, "Doomed Donuts").await;

    let pool = test_pool().await;
    let store_id = store_id_for_slug(&pool, &slug).await;
    let base_url = site_base_url();

    // Give it a review and a heart so the cascade has work to do
    client
        .post(format!("{base_url}/reviews/{store_id}"))
        .form(&[("text", "Gone too soon."), ("rating", "5")])
        .send()
        .await
        .expect("Failed to post review");
    toggle_heart(&client, store_id).await;

    // Delete returns the removed store as JSON
    let resp = client
        .delete(format!("{base_url}/stores/{store_id}/delete"))
        .send()
        .await
        .expect("Failed to delete store");
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = resp.json().await.expect("Failed to parse deleted store");
    assert_eq!(deleted["id"].as_i64(), Some(i64::from(store_id)));
    assert_eq!(deleted["slug"].as_str(), Some(slug.as_str()));

    // Post-delete scan: zero dangling references anywhere
    let stores: i64 = sqlx::query_scalar("SELECT count(*) FROM stores WHERE id = $1")
        .bind(store_id)
        .fetch_one(&pool)
        .await
        .expect("scan failed");
    let reviews: i64 = sqlx::query_scalar("SELECT count(*) FROM reviews WHERE store_id = $1")
        .bind(store_id)
        .fetch_one(&pool)
        .await
        .expect("scan failed");
    let hearts: i64 = sqlx::query_scalar("SELECT count(*) FROM hearts WHERE store_id = $1")
        .bind(store_id)
        .fetch_one(&pool)
        .await
        .expect("scan failed");

    assert_eq!((stores, reviews, hearts), (0, 0, 0));

    // And the public page is gone
    let resp = client
        .get(format!("{base_url}/store/{slug}"))
        .send()
        .await
        .expect("Failed to get deleted store page");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

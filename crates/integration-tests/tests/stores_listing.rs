//! Integration tests for the store listing, search, and geo endpoints.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//!   (`savory-cli migrate`)
//! - The site running (`cargo run -p savory-site`)
//!
//! Run with: `cargo test -p savory-integration-tests -- --ignored`

use reqwest::StatusCode;
use serde_json::Value;

use savory_integration_tests::{client, create_test_store, register_test_user, site_base_url};

// ============================================================================
// Listing & Pagination
// ============================================================================

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_listing_renders() {
    let client = client();
    let base_url = site_base_url();

    let resp = client
        .get(format!("{base_url}/stores"))
        .send()
        .await
        .expect("Failed to get store listing");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Stores"));
}

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_out_of_range_page_redirects_to_last_page() {
    let client = client();
    let base_url = site_base_url();

    // Ensure at least one store exists so there is a last page
    register_test_user(&client).await;
    create_test_store(&client, "Pagination Probe").await;

    // Far past the end; the site should land us on a real page with an
    // informational notice rather than an empty listing
    let resp = client
        .get(format!("{base_url}/stores/page/9999"))
        .send()
        .await
        .expect("Failed to get out-of-range page");

    assert_eq!(resp.status(), StatusCode::OK);
    let landed = resp.url().path().to_owned();
    assert_ne!(landed, "/stores/page/9999", "expected a redirect");

    let body = resp.text().await.expect("Failed to read response");
    assert!(
        body.contains("does not exist! Last available page here is"),
        "expected the out-of-range notice to be flashed"
    );
}

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_page_one_never_redirects() {
    let client = client();
    let base_url = site_base_url();

    let resp = client
        .get(format!("{base_url}/stores/page/1"))
        .send()
        .await
        .expect("Failed to get page 1");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/stores/page/1");
}

// ============================================================================
// Text Search
// ============================================================================

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_search_returns_at_most_five_results() {
    let client = client();
    let base_url = site_base_url();

    register_test_user(&client).await;
    for i in 0..7 {
        create_test_store(&client, &format!("Searchable Coffee {i}")).await;
    }

    let resp = client
        .get(format!("{base_url}/api/search?q=coffee"))
        .send()
        .await
        .expect("Failed to search");

    assert_eq!(resp.status(), StatusCode::OK);
    let results: Vec<Value> = resp.json().await.expect("Failed to parse search JSON");
    assert!(results.len() <= 5, "search must cap results at 5");
    assert!(!results.is_empty());
}

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_search_with_empty_query_is_empty() {
    let client = client();
    let base_url = site_base_url();

    let resp = client
        .get(format!("{base_url}/api/search?q="))
        .send()
        .await
        .expect("Failed to search");

    assert_eq!(resp.status(), StatusCode::OK);
    let results: Vec<Value> = resp.json().await.expect("Failed to parse search JSON");
    assert!(results.is_empty());
}

// ============================================================================
// Geo Near
// ============================================================================

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_near_returns_sorted_capped_results() {
    let client = client();
    let base_url = site_base_url();

    register_test_user(&client).await;
    create_test_store(&client, "Near Probe").await;

    let resp = client
        .get(format!("{base_url}/api/stores/near?lng=-79.87&lat=43.25"))
        .send()
        .await
        .expect("Failed to query near");

    assert_eq!(resp.status(), StatusCode::OK);
    let results: Vec<Value> = resp.json().await.expect("Failed to parse near JSON");
    assert!(results.len() <= 10, "near must cap results at 10");

    // All within 10 km, ordered nearest first
    let distances: Vec<f64> = results
        .iter()
        .map(|r| r["distance_m"].as_f64().expect("distance_m missing"))
        .collect();
    assert!(distances.iter().all(|d| *d <= 10_000.0));
    assert!(
        distances.windows(2).all(|w| w[0] <= w[1]),
        "results must be ordered by distance ascending"
    );
}

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_near_rejects_bad_coordinates() {
    let client = client();
    let base_url = site_base_url();

    let resp = client
        .get(format!("{base_url}/api/stores/near?lng=-900&lat=43.25"))
        .send()
        .await
        .expect("Failed to query near");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Slug Uniqueness
// ============================================================================

#[tokio::test]
#[ignore = "Requires running site and database"]
async fn test_identical_names_get_distinct_slugs() {
    let client = client();

    register_test_user(&client).await;
    let first = create_test_store(&client, "Duplicate Name Diner").await;
    let second = create_test_store(&client, "Duplicate Name Diner").await;

    assert_ne!(first, second, "two stores with the same name must not collide");
    assert!(second.starts_with("duplicate-name-diner"));
}

//! Shared helpers for Savory integration tests.
//!
//! The tests in `tests/` drive a running site over HTTP. They require:
//! - A running `PostgreSQL` database with migrations applied
//!   (`savory-cli migrate`)
//! - The site running (`cargo run -p savory-site`)
//!
//! All of them are `#[ignore]`d so a plain `cargo test` stays green
//! without that infrastructure.

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;
use uuid::Uuid;

/// Base URL for the site (configurable via environment).
#[must_use]
pub fn site_base_url() -> String {
    std::env::var("SITE_BASE_URL").unwrap_or_else(|_| "http://localhost:7777".to_string())
}

/// A client with a cookie store, so sessions persist across requests.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Register a fresh throwaway user and leave the client logged in.
///
/// Returns the user's email.
///
/// # Panics
///
/// Panics if registration fails.
pub async fn register_test_user(client: &Client) -> String {
    let base_url = site_base_url();
    let email = format!("test-{}@example.com", Uuid::new_v4());

    let resp = client
        .post(format!("{base_url}/register"))
        .form(&[
            ("name", "Test User"),
            ("email", email.as_str()),
            ("password", "integration-test-password"),
            ("password-confirm", "integration-test-password"),
        ])
        .send()
        .await
        .expect("Failed to register test user");

    assert!(resp.status().is_success() || resp.status().is_redirection());
    email
}

/// Create a store through the multipart form; returns its slug.
///
/// # Panics
///
/// Panics if the request fails or the redirect is not a store page.
pub async fn create_test_store(client: &Client, name: &str) -> String {
    let base_url = site_base_url();

    let form = reqwest::multipart::Form::new()
        .text("name", name.to_owned())
        .text("description", "An integration test store")
        .text("address", "123 Test St, Hamilton, ON")
        .text("lng", "-79.87")
        .text("lat", "43.25")
        .text("tags", "Wifi");

    let resp = client
        .post(format!("{base_url}/add"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create test store");

    // The create handler redirects to /store/{slug}
    let final_url = resp.url().clone();
    let path = final_url.path();
    path.strip_prefix("/store/")
        .unwrap_or_else(|| panic!("expected a store detail redirect, got {path}"))
        .to_owned()
}

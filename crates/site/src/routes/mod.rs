//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Store listing (page 1)
//! GET  /stores                  - Store listing (page 1)
//! GET  /stores/page/{page}      - Store listing page
//! GET  /add                     - Add store form (auth)
//! POST /add                     - Create store (auth, multipart)
//! POST /add/{id}                - Update store (auth, multipart, owner)
//! GET  /stores/{id}/edit        - Edit store form (auth, owner)
//! DELETE /stores/{id}/delete    - Delete store + cascade (auth, owner, JSON)
//! GET  /store/{slug}            - Store detail with reviews
//! GET  /tags                    - Tag cloud + all tagged stores
//! GET  /tags/{tag}              - Stores with a tag
//! GET  /map                     - Map page
//! GET  /hearts                  - Hearted stores (auth)
//! GET  /top                     - Top-rated stores
//!
//! # Reviews
//! POST /reviews/{id}            - Create review for store {id} (auth)
//! GET  /reviews/{id}/edit       - Edit review form (auth, owner)
//! POST /reviews/{id}/edit       - Update review (auth, owner)
//! DELETE /reviews/{id}/delete   - Delete review (auth, owner, JSON)
//!
//! # Auth & Account
//! GET  /login     POST /login
//! GET  /register  POST /register
//! GET  /logout
//! GET  /account   POST /account        (auth)
//! POST /account/forgot
//! GET  /account/reset/{token}  POST /account/reset/{token}
//!
//! # JSON API
//! GET  /api/search?q=           - Up to 5 text-ranked stores
//! GET  /api/stores/near?lat=&lng= - Up to 10 geo-ranked stores
//! POST /api/store/{id}/heart    - Toggle favorite (auth)
//! ```

pub mod api;
pub mod auth;
pub mod reviews;
pub mod stores;
pub mod tags;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::page))
        .route("/add", get(stores::add_form).post(stores::create))
        .route("/add/{id}", post(stores::update))
        .route("/stores/{id}/edit", get(stores::edit_form))
        .route("/stores/{id}/delete", delete(stores::delete))
        .route("/store/{slug}", get(stores::detail))
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/map", get(stores::map))
        .route("/hearts", get(stores::hearts))
        .route("/top", get(stores::top))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews/{id}", post(reviews::create))
        .route(
            "/reviews/{id}/edit",
            get(reviews::edit_form).post(reviews::update),
        )
        .route("/reviews/{id}/delete", delete(reviews::delete))
}

/// Create the auth and account routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/logout", get(auth::logout))
        .route(
            "/account",
            get(auth::account_form).post(auth::update_account),
        )
        .route("/account/forgot", post(auth::forgot))
        .route(
            "/account/reset/{token}",
            get(auth::reset_form).post(auth::reset),
        )
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(api::search))
        .route("/api/stores/near", get(api::near))
        .route("/api/store/{id}/heart", post(api::heart))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .merge(review_routes())
        .merge(auth_routes())
        .merge(api_routes())
}

//! Repository-level tests that talk to the database directly, without
//! the HTTP layer.
//!
//! These tests require a `PostgreSQL` database with migrations applied
//! (`savory-cli migrate`) and `SITE_DATABASE_URL` set.
//!
//! Run with: `cargo test -p savory-integration-tests -- --ignored`

use sqlx::PgPool;
use uuid::Uuid;

use savory_core::{Email, UserId};
use savory_site::db::{ReviewRepository, StoreRepository, UserRepository};
use savory_site::models::{ReviewInput, StoreInput};

async fn test_pool() -> PgPool {
    let url = std::env::var("SITE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("SITE_DATABASE_URL must be set for repository tests");
    PgPool::connect(&url).await.expect("Failed to connect")
}

async fn seed_user(pool: &PgPool) -> UserId {
    let email =
        Email::parse(&format!("repo-{}@example.com", Uuid::new_v4())).expect("valid email");
    UserRepository::new(pool)
        .create("Repo Tester", &email, "unused-hash")
        .await
        .expect("Failed to create user")
        .id
}

fn store_input(name: &str) -> StoreInput {
    StoreInput {
        name: name.to_owned(),
        description: "Repository test store".to_owned(),
        tags: vec!["Wifi".to_owned()],
        address: Some("1 Repository Way".to_owned()),
        lng: Some(-79.87),
        lat: Some(43.25),
        photo: None,
    }
}

#[tokio::test]
#[ignore = "Requires database with migrations applied"]
async fn test_delete_all_for_store_removes_only_that_store() {
    let pool = test_pool().await;
    let author = seed_user(&pool).await;

    let stores = StoreRepository::new(&pool);
    let reviews = ReviewRepository::new(&pool);

    let doomed = stores
        .create(&store_input("Scoped Cascade Probe"), author)
        .await
        .expect("Failed to create store");
    let survivor = stores
        .create(&store_input("Scoped Cascade Bystander"), author)
        .await
        .expect("Failed to create store");

    let input = ReviewInput::parse("Fine.", 3).expect("valid review");
    for _ in 0..2 {
        reviews
            .create(&input, author, doomed.id)
            .await
            .expect("Failed to create review");
    }
    reviews
        .create(&input, author, survivor.id)
        .await
        .expect("Failed to create review");

    let removed = reviews
        .delete_all_for_store(doomed.id)
        .await
        .expect("Failed to delete reviews");
    assert_eq!(removed, 2);

    // The other store's reviews are untouched
    let remaining = reviews
        .for_store(survivor.id)
        .await
        .expect("Failed to list reviews");
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
#[ignore = "Requires database with migrations applied"]
async fn test_concurrent_heart_toggles_never_duplicate() {
    let pool = test_pool().await;
    let author = seed_user(&pool).await;

    let store = StoreRepository::new(&pool)
        .create(&store_input("Concurrent Heart Probe"), author)
        .await
        .expect("Failed to create store");

    let users = UserRepository::new(&pool);

    // Fire overlapping toggles for the same (user, store) pair; the
    // single-statement flip plus the composite key mean membership can
    // only ever be 0 or 1, never duplicated
    let (a, b, c, d) = tokio::join!(
        users.toggle_heart(author, store.id),
        users.toggle_heart(author, store.id),
        users.toggle_heart(author, store.id),
        users.toggle_heart(author, store.id),
    );
    for outcome in [a, b, c, d] {
        outcome.expect("toggle failed");
    }

    let count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM hearts WHERE user_id = $1 AND store_id = $2")
            .bind(author)
            .bind(store.id)
            .fetch_one(&pool)
            .await
            .expect("Failed to count hearts");
    assert!(count <= 1, "concurrent toggles must never duplicate");
}

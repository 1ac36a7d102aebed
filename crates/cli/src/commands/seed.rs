//! Sample-data seeding command.
//!
//! Loads two demo accounts and a handful of Hamilton-area stores with
//! tags, locations, and reviews, so search, the map, and the top-stores
//! page all have something to show. Safe to re-run; `--fresh` wipes
//! first.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use super::{CommandError, connect};

struct SeedStore {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    address: &'static str,
    lng: f64,
    lat: f64,
}

const STORES: &[SeedStore] = &[
    SeedStore {
        name: "Mission Chinese Food",
        slug: "mission-chinese-food",
        description: "Serving delicious late-night Chinese food with a line out the door.",
        tags: &["Open Late", "Licensed"],
        address: "172 Main St E, Hamilton, ON",
        lng: -79.862,
        lat: 43.255,
    },
    SeedStore {
        name: "Barley Vine Rail Co",
        slug: "barley-vine-rail-co",
        description: "Craft cocktails and comfort food in a restored rail building.",
        tags: &["Licensed", "Family Friendly"],
        address: "35 Main St, Grimsby, ON",
        lng: -79.563,
        lat: 43.192,
    },
    SeedStore {
        name: "The Mule",
        slug: "the-mule",
        description: "Tacos and tequila. Come hungry, leave happy.",
        tags: &["Open Late", "Vegetarian", "Licensed"],
        address: "41 King William St, Hamilton, ON",
        lng: -79.868,
        lat: 43.257,
    },
    SeedStore {
        name: "Saint James Espresso Bar",
        slug: "saint-james-espresso-bar",
        description: "Small-batch roasts, big windows, and reliable wifi.",
        tags: &["Wifi", "Family Friendly"],
        address: "170 James St N, Hamilton, ON",
        lng: -79.866,
        lat: 43.261,
    },
    SeedStore {
        name: "Green Bar",
        slug: "green-bar",
        description: "Plant-based bowls and fresh-pressed juice.",
        tags: &["Vegetarian", "Wifi"],
        address: "236 James St N, Hamilton, ON",
        lng: -79.867,
        lat: 43.263,
    },
    SeedStore {
        name: "Charred Chicken",
        slug: "charred-chicken",
        description: "Rotisserie chicken with a serious char.",
        tags: &["Family Friendly"],
        address: "244 James St N, Hamilton, ON",
        lng: -79.867,
        lat: 43.264,
    },
];

/// Seed sample data.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert
/// fails.
pub async fn run(password: &str, fresh: bool) -> Result<(), CommandError> {
    let pool = connect().await?;

    if fresh {
        tracing::info!("Deleting existing data...");
        sqlx::query("DELETE FROM hearts").execute(&pool).await?;
        sqlx::query("DELETE FROM reviews").execute(&pool).await?;
        sqlx::query("DELETE FROM stores").execute(&pool).await?;
        sqlx::query("DELETE FROM users").execute(&pool).await?;
    }

    let password_hash = hash_password(password)?;

    let wes = upsert_user(&pool, "Wes", "wes@example.com", &password_hash).await?;
    let debbie = upsert_user(&pool, "Debbie", "debbie@example.com", &password_hash).await?;

    tracing::info!("Seeding {} stores...", STORES.len());
    for (i, store) in STORES.iter().enumerate() {
        let author = if i % 2 == 0 { wes } else { debbie };
        let store_id: Option<i32> = sqlx::query_scalar(
            "INSERT INTO stores (name, slug, description, tags, address, lng, lat, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (slug) DO NOTHING
             RETURNING id",
        )
        .bind(store.name)
        .bind(store.slug)
        .bind(store.description)
        .bind(store.tags.iter().map(ToString::to_string).collect::<Vec<_>>())
        .bind(store.address)
        .bind(store.lng)
        .bind(store.lat)
        .bind(author)
        .fetch_optional(&pool)
        .await?;

        // Both demo users review each new store so /top has data
        if let Some(store_id) = store_id {
            let rating = i16::try_from(3 + (i % 3)).unwrap_or(3);
            seed_review(&pool, wes, store_id, "Would absolutely come back.", rating).await?;
            seed_review(&pool, debbie, store_id, "Solid spot, great service.", 4).await?;
        }
    }

    tracing::info!("Seed complete! Log in as wes@example.com or debbie@example.com.");
    Ok(())
}

async fn upsert_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<i32, CommandError> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash)
         VALUES ($1, $2, $3)
         ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_review(
    pool: &PgPool,
    author: i32,
    store: i32,
    text: &str,
    rating: i16,
) -> Result<(), CommandError> {
    sqlx::query("INSERT INTO reviews (author_id, store_id, text, rating) VALUES ($1, $2, $3, $4)")
        .bind(author)
        .bind(store)
        .bind(text)
        .bind(rating)
        .execute(pool)
        .await?;

    Ok(())
}

fn hash_password(password: &str) -> Result<String, CommandError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CommandError::PasswordHash)
}

//! JSON API route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use savory_core::{GeoPoint, StoreId};

use crate::db::{StoreRepository, UserRepository};
use crate::db::stores::{DEFAULT_NEAR_DISTANCE_M, NEAR_LIMIT};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{NearbyStore, Store, UserWithHearts};
use crate::state::AppState;

/// Text search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Geo search query parameters.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lng: f64,
}

/// `GET /api/search?q=` - up to 5 stores ranked by text relevance.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Store>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let stores = StoreRepository::new(state.pool()).search(q).await?;

    Ok(Json(stores))
}

/// `GET /api/stores/near?lat=&lng=` - up to 10 stores within 10 km,
/// nearest first.
#[instrument(skip(state))]
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<NearbyStore>>> {
    let point = GeoPoint::new(query.lng, query.lat)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let stores = StoreRepository::new(state.pool())
        .near(point.lng(), point.lat(), DEFAULT_NEAR_DISTANCE_M, NEAR_LIMIT)
        .await?;

    Ok(Json(stores))
}

/// `POST /api/store/{id}/heart` - toggle the store in the current user's
/// favorites; returns the updated user with their hearts set.
#[instrument(skip(state))]
pub async fn heart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<StoreId>,
) -> Result<Json<UserWithHearts>> {
    let hearts = UserRepository::new(state.pool())
        .toggle_heart(user.id, id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::Conflict(_) => {
                AppError::NotFound(format!("store {id}"))
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(UserWithHearts {
        id: user.id,
        name: user.name,
        email: user.email,
        hearts,
    }))
}

//! Store route handlers: listing, create/edit/delete, detail, hearts,
//! top rated, and the map page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use savory_core::{StoreId, UserId};

use crate::db::{ReviewRepository, StoreRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::listing::{self, Listing};
use crate::middleware::{Flash, OptionalAuth, RequireAuth};
use crate::models::{
    CurrentUser, ReviewWithAuthor, Store, StoreInput, TopStore,
};
use crate::middleware::FlashMessage;
use crate::ownership::assert_owner;
use crate::services::uploads;
use crate::state::AppState;

/// Tag labels offered as checkboxes on the store form.
pub const TAG_CHOICES: &[&str] = &["Wifi", "Open Late", "Family Friendly", "Vegetarian", "Licensed"];

// =============================================================================
// View Models
// =============================================================================

/// A store card plus whether the current user has hearted it.
pub struct StoreCard {
    pub store: Store,
    pub hearted: bool,
}

pub(crate) fn cards(stores: Vec<Store>, hearts: &[StoreId]) -> Vec<StoreCard> {
    stores
        .into_iter()
        .map(|store| {
            let hearted = hearts.contains(&store.id);
            StoreCard { store, hearted }
        })
        .collect()
}

async fn hearts_for(state: &AppState, user: Option<&CurrentUser>) -> Result<Vec<StoreId>> {
    match user {
        Some(user) => Ok(UserRepository::new(state.pool()).hearts(user.id).await?),
        None => Ok(Vec::new()),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Paginated store listing (also renders the hearts page).
#[derive(Template, WebTemplate)]
#[template(path = "pages/stores.html")]
pub struct StoresTemplate {
    pub title: String,
    pub cards: Vec<StoreCard>,
    pub page: i64,
    pub pages: i64,
    pub count: i64,
    pub paginated: bool,
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

/// Store detail page with reviews populated.
#[derive(Template, WebTemplate)]
#[template(path = "pages/store.html")]
pub struct StoreTemplate {
    pub title: String,
    pub store: Store,
    pub reviews: Vec<ReviewWithAuthor>,
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

/// One tag checkbox on the store form.
pub struct TagOption {
    pub label: &'static str,
    pub checked: bool,
}

/// Add/edit store form, prefilled from the store being edited.
#[derive(Template, WebTemplate)]
#[template(path = "pages/edit_store.html")]
pub struct EditStoreTemplate {
    pub title: String,
    /// Where the form posts: `/add` or `/add/{id}`.
    pub action: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lng: String,
    pub lat: String,
    pub photo: Option<String>,
    pub tag_options: Vec<TagOption>,
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

fn store_form(
    title: String,
    action: String,
    store: Option<&Store>,
    user: CurrentUser,
    flashes: Vec<FlashMessage>,
) -> EditStoreTemplate {
    let coord = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();

    let tag_options = TAG_CHOICES
        .iter()
        .map(|&label| TagOption {
            label,
            checked: store.is_some_and(|s| s.tags.iter().any(|t| t == label)),
        })
        .collect();

    EditStoreTemplate {
        title,
        action,
        name: store.map(|s| s.name.clone()).unwrap_or_default(),
        description: store.map(|s| s.description.clone()).unwrap_or_default(),
        address: store.and_then(|s| s.address.clone()).unwrap_or_default(),
        lng: coord(store.and_then(|s| s.lng)),
        lat: coord(store.and_then(|s| s.lat)),
        photo: store.and_then(|s| s.photo.clone()),
        tag_options,
        current_user: Some(user),
        flashes,
    }
}

/// Top-rated stores.
#[derive(Template, WebTemplate)]
#[template(path = "pages/top.html")]
pub struct TopTemplate {
    pub title: String,
    pub stores: Vec<TopStore>,
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

/// Map page.
#[derive(Template, WebTemplate)]
#[template(path = "pages/map.html")]
pub struct MapTemplate {
    pub title: String,
    pub map_key: Option<String>,
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

// =============================================================================
// Listing
// =============================================================================

/// `GET /` and `GET /stores` - first page of the listing.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> Result<Response> {
    render_listing(&state, user, &flash, 1).await
}

/// `GET /stores/page/{page}` - a specific listing page.
#[instrument(skip(state, flash))]
pub async fn page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
    Path(page): Path<i64>,
) -> Result<Response> {
    render_listing(&state, user, &flash, page).await
}

async fn render_listing(
    state: &AppState,
    user: Option<CurrentUser>,
    flash: &Flash,
    page: i64,
) -> Result<Response> {
    let repo = StoreRepository::new(state.pool());

    match listing::stores_page(&repo, page).await? {
        Listing::OutOfRange {
            requested,
            last_page,
        } => {
            flash
                .info(listing::out_of_range_notice(requested, last_page))
                .await;
            Ok(Redirect::to(&format!("/stores/page/{last_page}")).into_response())
        }
        Listing::Page { stores, meta } => {
            let hearts = hearts_for(state, user.as_ref()).await?;
            Ok(StoresTemplate {
                title: "Stores".to_owned(),
                cards: cards(stores, &hearts),
                page: meta.page,
                pages: meta.pages,
                count: meta.count,
                paginated: true,
                current_user: user,
                flashes: flash.take().await,
            }
            .into_response())
        }
    }
}

// =============================================================================
// Create / Edit
// =============================================================================

/// `GET /add` - blank store form.
#[instrument(skip_all)]
pub async fn add_form(RequireAuth(user): RequireAuth, flash: Flash) -> EditStoreTemplate {
    store_form(
        "Add Store".to_owned(),
        "/add".to_owned(),
        None,
        user,
        flash.take().await,
    )
}

/// `POST /add` - create a store from the multipart form.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    multipart: Multipart,
) -> Result<Response> {
    let input = match read_store_form(&state, multipart).await? {
        Ok(input) => input,
        Err(message) => {
            flash.error(message).await;
            return Ok(Redirect::to("/add").into_response());
        }
    };

    if let Err(message) = input.validate() {
        flash.error(message).await;
        return Ok(Redirect::to("/add").into_response());
    }

    let store = StoreRepository::new(state.pool())
        .create(&input, user.id)
        .await?;

    flash
        .success(format!(
            "Successfully created {}. Care to leave a review?",
            store.name
        ))
        .await;

    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

/// `GET /stores/{id}/edit` - edit form, owner only.
#[instrument(skip(state, flash))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(id): Path<StoreId>,
) -> Result<EditStoreTemplate> {
    let store = find_owned_store(&state, id, user.id).await?;

    Ok(store_form(
        format!("Edit {}", store.name),
        format!("/add/{}", store.id),
        Some(&store),
        user,
        flash.take().await,
    ))
}

/// `POST /add/{id}` - update a store from the multipart form, owner only.
#[instrument(skip(state, flash, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(id): Path<StoreId>,
    multipart: Multipart,
) -> Result<Response> {
    find_owned_store(&state, id, user.id).await?;

    let edit_url = format!("/stores/{id}/edit");

    let input = match read_store_form(&state, multipart).await? {
        Ok(input) => input,
        Err(message) => {
            flash.error(message).await;
            return Ok(Redirect::to(&edit_url).into_response());
        }
    };

    if let Err(message) = input.validate() {
        flash.error(message).await;
        return Ok(Redirect::to(&edit_url).into_response());
    }

    let store = StoreRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(|e| AppError::or_not_found(e, "store"))?;

    flash
        .success(format!("Successfully updated {}.", store.name))
        .await;

    Ok(Redirect::to(&edit_url).into_response())
}

/// `DELETE /stores/{id}/delete` - delete a store and cascade, owner only.
///
/// Returns the removed store as JSON.
#[instrument(skip(state, flash))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(id): Path<StoreId>,
) -> Result<Json<Store>> {
    find_owned_store(&state, id, user.id).await?;

    let store = StoreRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| AppError::or_not_found(e, "store"))?;

    flash
        .success(format!("Your {} store has been removed!", store.name))
        .await;

    Ok(Json(store))
}

/// Fetch a store and check the acting user owns it.
async fn find_owned_store(state: &AppState, id: StoreId, user: UserId) -> Result<Store> {
    let store = StoreRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;

    assert_owner(&store, user)?;

    Ok(store)
}

// =============================================================================
// Detail / Hearts / Top / Map
// =============================================================================

/// `GET /store/{slug}` - public detail page with reviews populated.
#[instrument(skip(state, flash))]
pub async fn detail(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
    Path(slug): Path<String>,
) -> Result<StoreTemplate> {
    let store = StoreRepository::new(state.pool())
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {slug}")))?;

    let reviews = ReviewRepository::new(state.pool())
        .for_store(store.id)
        .await?;

    Ok(StoreTemplate {
        title: store.name.clone(),
        store,
        reviews,
        current_user: user,
        flashes: flash.take().await,
    })
}

/// `GET /hearts` - the current user's favorited stores.
#[instrument(skip_all)]
pub async fn hearts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
) -> Result<StoresTemplate> {
    let stores = StoreRepository::new(state.pool())
        .hearted_by(user.id)
        .await?;

    let count = i64::try_from(stores.len()).unwrap_or(i64::MAX);
    let hearts: Vec<StoreId> = stores.iter().map(|s| s.id).collect();

    Ok(StoresTemplate {
        title: "Hearted Stores".to_owned(),
        cards: cards(stores, &hearts),
        page: 1,
        pages: 1,
        count,
        paginated: false,
        current_user: Some(user),
        flashes: flash.take().await,
    })
}

/// `GET /top` - stores ranked by average review rating.
#[instrument(skip_all)]
pub async fn top(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> Result<TopTemplate> {
    let stores = StoreRepository::new(state.pool()).top().await?;

    Ok(TopTemplate {
        title: "Top Stores!".to_owned(),
        stores,
        current_user: user,
        flashes: flash.take().await,
    })
}

/// `GET /map` - map page.
#[instrument(skip_all)]
pub async fn map(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> MapTemplate {
    MapTemplate {
        title: "Map".to_owned(),
        map_key: state.config().map_key.clone(),
        current_user: user,
        flashes: flash.take().await,
    }
}

// =============================================================================
// Multipart Form Parsing
// =============================================================================

/// Read the store form fields, saving the photo when one was uploaded.
///
/// The outer `Result` is for infrastructure failures; the inner one
/// carries a user-facing validation message for the flash-and-redirect
/// path.
async fn read_store_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<std::result::Result<StoreInput, String>> {
    let mut input = StoreInput::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(AppError::BadRequest(format!("malformed form: {e}"))),
        };

        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match name.as_str() {
            "name" => input.name = read_text(field).await?,
            "description" => input.description = read_text(field).await?,
            "location[address]" | "address" => {
                let address = read_text(field).await?;
                if !address.trim().is_empty() {
                    input.address = Some(address);
                }
            }
            "location[coordinates][0]" | "lng" => {
                match parse_coordinate(&read_text(field).await?, "longitude") {
                    Ok(lng) => input.lng = lng,
                    Err(message) => return Ok(Err(message)),
                }
            }
            "location[coordinates][1]" | "lat" => {
                match parse_coordinate(&read_text(field).await?, "latitude") {
                    Ok(lat) => input.lat = lat,
                    Err(message) => return Ok(Err(message)),
                }
            }
            "tags" => {
                let tag = read_text(field).await?;
                if !tag.is_empty() && !input.tags.contains(&tag) {
                    input.tags.push(tag);
                }
            }
            "photo" => {
                let content_type = field.content_type().map(ToOwned::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("malformed form: {e}")))?;

                // A file input left empty still submits an empty part
                if data.is_empty() {
                    continue;
                }

                let content_type = content_type.unwrap_or_default();
                match uploads::save_photo(&state.config().upload_dir, &content_type, data.to_vec())
                    .await
                {
                    Ok(filename) => input.photo = Some(filename),
                    Err(e) if e.is_client_error() => return Ok(Err(e.to_string())),
                    Err(e) => return Err(AppError::Internal(e.to_string())),
                }
            }
            _ => {}
        }
    }

    Ok(Ok(input))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map(|s| s.trim().to_owned())
        .map_err(|e| AppError::BadRequest(format!("malformed form: {e}")))
}

/// Parse an optional coordinate field. Empty means "not provided".
fn parse_coordinate(raw: &str, which: &str) -> std::result::Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("You must supply a valid {which}!"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use savory_core::Slug;

    fn store(id: i32) -> Store {
        Store {
            id: StoreId::new(id),
            name: format!("Store {id}"),
            slug: Slug::from_name(&format!("Store {id}")).unwrap(),
            description: String::new(),
            tags: vec![],
            photo: None,
            address: None,
            lng: None,
            lat: None,
            author_id: UserId::new(1),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("-79.8", "longitude").unwrap(), Some(-79.8));
        assert_eq!(parse_coordinate("  ", "longitude").unwrap(), None);
        assert!(parse_coordinate("east-ish", "longitude").is_err());
    }

    #[test]
    fn test_cards_mark_hearted_stores() {
        let hearts = vec![StoreId::new(2)];
        let cards = cards(vec![store(1), store(2)], &hearts);
        assert!(!cards[0].hearted);
        assert!(cards[1].hearted);
    }
}

//! Review route handlers.
//!
//! Every mutation here is owner-scoped and guarded: only a review's
//! author may edit or delete it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use savory_core::{ReviewId, StoreId, UserId};

use crate::db::{ReviewRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{Flash, FlashMessage, RequireAuth};
use crate::models::{CurrentUser, Review, ReviewInput};
use crate::ownership::assert_owner;
use crate::state::AppState;

/// Review form data (also used for edits).
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub text: String,
    pub rating: i16,
}

/// Edit review page.
#[derive(Template, WebTemplate)]
#[template(path = "pages/edit_review.html")]
pub struct EditReviewTemplate {
    pub title: String,
    pub review: Review,
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

/// `POST /reviews/{id}` - create a review for store `{id}`.
#[instrument(skip(state, flash, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(store_id): Path<StoreId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let store = StoreRepository::new(state.pool())
        .find_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {store_id}")))?;

    let back = format!("/store/{}", store.slug);

    let input = match ReviewInput::parse(&form.text, form.rating) {
        Ok(input) => input,
        Err(message) => {
            flash.error(message).await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    ReviewRepository::new(state.pool())
        .create(&input, user.id, store.id)
        .await?;

    flash.success("Review Saved!").await;

    Ok(Redirect::to(&back).into_response())
}

/// `GET /reviews/{id}/edit` - edit form, owner only.
#[instrument(skip(state, flash))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(id): Path<ReviewId>,
) -> Result<EditReviewTemplate> {
    let review = find_owned_review(&state, id, user.id).await?;

    Ok(EditReviewTemplate {
        title: "Edit Review".to_owned(),
        review,
        current_user: Some(user),
        flashes: flash.take().await,
    })
}

/// `POST /reviews/{id}/edit` - update a review, owner only.
#[instrument(skip(state, flash, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(id): Path<ReviewId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    find_owned_review(&state, id, user.id).await?;

    let input = match ReviewInput::parse(&form.text, form.rating) {
        Ok(input) => input,
        Err(message) => {
            flash.error(message).await;
            return Ok(Redirect::to(&format!("/reviews/{id}/edit")).into_response());
        }
    };

    let review = ReviewRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(|e| AppError::or_not_found(e, "review"))?;

    flash.success("Successfully updated your review!").await;

    Ok(Redirect::to(&format!("/store/{}", review.store_slug)).into_response())
}

/// `DELETE /reviews/{id}/delete` - delete a review, owner only.
///
/// Returns the removed review as JSON.
#[instrument(skip(state, flash))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>> {
    find_owned_review(&state, id, user.id).await?;

    let review = ReviewRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| AppError::or_not_found(e, "review"))?;

    flash
        .success("Your review has been successfully deleted!")
        .await;

    Ok(Json(review))
}

/// Fetch a review and check the acting user owns it.
async fn find_owned_review(state: &AppState, id: ReviewId, user: UserId) -> Result<Review> {
    let review = ReviewRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {id}")))?;

    assert_owner(&review, user)?;

    Ok(review)
}

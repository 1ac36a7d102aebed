//! Tag route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::db::StoreRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Flash, FlashMessage, OptionalAuth};
use crate::models::{CurrentUser, TagCount};
use crate::routes::stores::{StoreCard, cards};
use crate::state::AppState;

/// One entry in the tag cloud.
pub struct TagLink {
    pub tag: String,
    pub count: i64,
    /// Whether this is the tag the page is filtered on.
    pub active: bool,
}

fn tag_links(tags: Vec<TagCount>, active: Option<&str>) -> Vec<TagLink> {
    tags.into_iter()
        .map(|t| {
            let is_active = active == Some(t.tag.as_str());
            TagLink {
                tag: t.tag,
                count: t.count,
                active: is_active,
            }
        })
        .collect()
}

/// Tag listing page: the tag cloud plus matching stores.
#[derive(Template, WebTemplate)]
#[template(path = "pages/tags.html")]
pub struct TagsTemplate {
    pub title: String,
    pub tags: Vec<TagLink>,
    pub cards: Vec<StoreCard>,
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

/// `GET /tags` - every store with at least one tag.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> Result<TagsTemplate> {
    render(state, user, flash, None).await
}

/// `GET /tags/{tag}` - stores carrying the named tag.
#[instrument(skip(state, flash))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
    Path(tag): Path<String>,
) -> Result<TagsTemplate> {
    render(state, user, flash, Some(tag)).await
}

async fn render(
    state: AppState,
    user: Option<CurrentUser>,
    flash: Flash,
    tag: Option<String>,
) -> Result<TagsTemplate> {
    let repo = StoreRepository::new(state.pool());

    // Tag cloud and filtered stores are independent; fetch them together
    let (tags, stores) = tokio::try_join!(
        repo.tags_with_counts(),
        repo.list_by_tag(tag.as_deref())
    )?;

    Ok(TagsTemplate {
        title: tag.clone().unwrap_or_else(|| "Tags".to_owned()),
        tags: tag_links(tags, tag.as_deref()),
        cards: cards(stores, &[]),
        current_user: user,
        flashes: flash.take().await,
    })
}

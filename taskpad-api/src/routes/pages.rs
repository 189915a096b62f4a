/// Wiki page endpoints
///
/// Pages are addressed by title. Reading is public; creating requires
/// authentication; editing and deleting are restricted to the creator
/// (403 for everyone else, since page existence is public knowledge).
///
/// # Endpoints
///
/// - `GET /api/pages?q=` - List pages, optional title search (public)
/// - `GET /api/pages/:title` - Fetch one page (public)
/// - `POST /api/pages` - Create a page (authenticated)
/// - `PUT /api/pages/:title` - Replace content (owner only)
/// - `DELETE /api/pages/:title` - Delete (owner only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskpad_shared::{
    auth::middleware::AuthUser,
    models::page::{CreatePage, Page},
};
use validator::Validate;

/// Page list query parameters
#[derive(Debug, Deserialize)]
pub struct ListPagesQuery {
    /// Case-insensitive title substring filter
    pub q: Option<String>,
}

/// Create page request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePageRequest {
    /// Unique page title
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    /// Page body
    pub content: String,
}

/// Update page request
#[derive(Debug, Deserialize)]
pub struct UpdatePageRequest {
    /// Replacement body (titles are immutable)
    pub content: String,
}

/// Lists pages, optionally filtered by `?q=` title search
pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<ListPagesQuery>,
) -> ApiResult<Json<Vec<Page>>> {
    let pages = Page::list(&state.db, query.q.as_deref()).await?;

    Ok(Json(pages))
}

/// Fetches a page by title
///
/// # Errors
///
/// - `404 Not Found`: No page with that title
pub async fn get_page(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> ApiResult<Json<Page>> {
    let page = Page::find_by_title(&state.db, &title)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    Ok(Json(page))
}

/// Creates a page owned by the authenticated user
///
/// # Errors
///
/// - `409 Conflict`: Title already exists
pub async fn create_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreatePageRequest>,
) -> ApiResult<(StatusCode, Json<Page>)> {
    req.validate()?;

    let page = Page::create(
        &state.db,
        CreatePage {
            title: req.title,
            content: req.content,
            created_by: auth.user_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(page)))
}

/// Replaces a page's content (creator only)
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the page's creator
/// - `404 Not Found`: No page with that title
pub async fn update_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(title): Path<String>,
    Json(req): Json<UpdatePageRequest>,
) -> ApiResult<Json<Page>> {
    let page = Page::find_by_title(&state.db, &title)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    if !page.is_owned_by(auth.user_id) {
        return Err(ApiError::Forbidden(
            "Only the page creator may edit it".to_string(),
        ));
    }

    let updated = Page::update_content(&state.db, &title, &req.content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes a page (creator only)
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the page's creator
/// - `404 Not Found`: No page with that title
pub async fn delete_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(title): Path<String>,
) -> ApiResult<StatusCode> {
    let page = Page::find_by_title(&state.db, &title)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found".to_string()))?;

    if !page.is_owned_by(auth.user_id) {
        return Err(ApiError::Forbidden(
            "Only the page creator may delete it".to_string(),
        ));
    }

    Page::delete(&state.db, &title).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Message log endpoints
///
/// A flat, append-only message log shared by all users.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskpad_shared::{auth::middleware::AuthUser, models::message::Message};
use validator::Validate;

/// Default page size for message listing
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for message listing
const MAX_LIMIT: i64 = 200;

/// Message list query parameters
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    /// Number of messages to return (default 50, max 200)
    pub limit: Option<i64>,
}

/// Create message request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    /// Message body
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Message must be between 1 and 2000 characters"
    ))]
    pub body: String,
}

/// Lists recent messages, newest first
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let messages = Message::list_recent(&state.db, limit).await?;

    Ok(Json(messages))
}

/// Appends a message to the log
pub async fn create_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    req.validate()?;

    let message = Message::create(&state.db, auth.user_id, &req.body).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

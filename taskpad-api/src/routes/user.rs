/// Profile endpoints
///
/// The authenticated user's own profile: read, partial update, and
/// password change.
///
/// # Endpoints
///
/// - `GET /api/user` - Current profile
/// - `PUT /api/user` - Update username/email/avatar
/// - `PATCH /api/user` - Change password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskpad_shared::{
    auth::{middleware::AuthUser, password},
    models::user::{UpdateUser, User},
};
use validator::Validate;

/// Profile response
///
/// Deliberately excludes the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// User ID
    pub id: String,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// Avatar URL (if set)
    pub avatar_url: Option<String>,

    /// Account creation time
    pub created_at: DateTime<Utc>,

    /// Last login time (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        ProfileResponse {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Profile update request (all fields optional)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New username
    #[validate(length(
        min = 3,
        max = 80,
        message = "Username must be between 3 and 80 characters"
    ))]
    pub username: Option<String>,

    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New avatar URL
    #[validate(length(max = 255, message = "Avatar URL must be at most 255 characters"))]
    pub avatar_url: Option<String>,
}

/// Password change request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password (verified before the change)
    pub current_password: String,

    /// New password (strength-checked)
    pub new_password: String,
}

/// Returns the authenticated user's profile
///
/// # Errors
///
/// - `404 Not Found`: Account was deleted while the token was still valid
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Partially updates the authenticated user's profile
///
/// Fields absent from the request body are left unchanged.
///
/// # Errors
///
/// - `409 Conflict`: New username or email collides with another account
/// - `422 Unprocessable Entity`: Validation failure
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    req.validate()?;

    let update = UpdateUser {
        username: req.username,
        email: req.email.map(|e| e.to_lowercase()),
        password_hash: None,
        avatar_url: req.avatar_url.map(Some),
    };

    let user = User::update(&state.db, auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Changes the authenticated user's password
///
/// The current password must verify before the new one is accepted, and
/// the new password must pass the same strength rules as registration.
/// The old password stops working immediately.
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `422 Unprocessable Entity`: New password too weak
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = password::verify_password(&req.current_password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    password::validate_password_strength(&req.new_password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "new_password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.new_password)?;

    User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %auth.user_id, "Password changed");

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

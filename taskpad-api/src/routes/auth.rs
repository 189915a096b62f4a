/// Authentication endpoints
///
/// Registration, login, and token refresh.
///
/// # Endpoints
///
/// - `POST /api/register` - Create a new account
/// - `POST /api/login` - Authenticate and get tokens
/// - `POST /api/refresh` - Exchange a refresh token for a new access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskpad_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique username
    #[validate(length(
        min = 3,
        max = 80,
        message = "Username must be between 3 and 80 characters"
    ))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// User ID of the new account
    pub user_id: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// Access token (1h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (1h)
    pub access_token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "SecureP4ss"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{"user_id": "uuid"}`.
///
/// # Errors
///
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation or password strength failure
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    // Emails are stored and looked up lowercased.
    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email.to_lowercase(),
            password_hash,
            avatar_url: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id.to_string(),
        }),
    ))
}

/// Login endpoint
///
/// Authenticates by email and password, returning JWT tokens.
///
/// # Endpoint
///
/// ```text
/// POST /api/login
/// Content-Type: application/json
///
/// {
///   "email": "alice@example.com",
///   "password": "SecureP4ss"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user_id": "uuid",
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Wrong email or wrong password, indistinguishable
///   so the endpoint does not confirm which emails are registered
/// - `429 Too Many Requests`: More than 5 attempts/minute from one IP
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        access_token,
        refresh_token,
    }))
}

/// Token refresh endpoint
///
/// Exchanges a valid refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired, or access-typed token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Authentication context for Axum handlers
///
/// The API crate's auth middleware validates the Bearer token and inserts
/// an [`AuthUser`] into request extensions; handlers pull it back out with
/// Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskpad_shared::auth::middleware::AuthUser;
///
/// async fn handler(Extension(auth): Extension<AuthUser>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller, added to request extensions after token validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthUser {
    /// Authenticated user ID (the token's `sub` claim)
    pub user_id: Uuid,
}

impl AuthUser {
    /// Creates the context from validated JWT claims
    pub fn from_claims(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        (status, message).into_response()
    }
}

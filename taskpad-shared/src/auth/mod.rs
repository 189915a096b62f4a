/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: JWT access/refresh token generation and validation
/// - [`middleware`]: authenticated-caller context for Axum handlers
///
/// # Lifecycle
///
/// Register hashes the password and stores the PHC string. Login verifies
/// the hash and issues an access + refresh token pair. Protected routes
/// validate the access token and see only the [`middleware::AuthUser`]
/// context, never the credentials.

pub mod jwt;
pub mod middleware;
pub mod password;

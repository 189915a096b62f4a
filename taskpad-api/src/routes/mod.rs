/// API route handlers
///
/// Handlers are grouped by resource. All return `ApiResult`, so errors
/// flow through the unified [`crate::error::ApiError`] conversion.

pub mod auth;
pub mod health;
pub mod messages;
pub mod pages;
pub mod tasks;
pub mod user;

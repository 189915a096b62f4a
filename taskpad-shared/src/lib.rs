//! # Taskpad Shared Library
//!
//! Types and business logic shared between the Taskpad API server and its
//! tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks, pages, messages)
//! - `auth`: Password hashing, JWT tokens, request auth context
//! - `db`: Connection pooling and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskpad shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

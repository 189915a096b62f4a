/// Database models for Taskpad
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `task`: Per-user to-do items
/// - `page`: Wiki pages, publicly readable, owner-mutable
/// - `message`: Append-only user message log

pub mod message;
pub mod page;
pub mod task;
pub mod user;

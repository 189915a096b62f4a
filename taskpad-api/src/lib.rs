//! # Taskpad API Server Library
//!
//! Core functionality for the Taskpad API server: a JSON HTTP API for
//! user accounts, per-user tasks, wiki pages, and a shared message log.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Rate limiting and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

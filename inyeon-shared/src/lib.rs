//! # Inyeon Shared Library
//!
//! Types and logic shared by the Inyeon API server and client.
//!
//! ## Module Organization
//!
//! - `models`: database models and their queries
//! - `validation`: form schemas with localized messages
//! - `calendar`: month windows, navigation and calendar events
//! - `auth`: password hashing, session tokens, link tokens, bearer middleware
//! - `db`: connection pool and migrations
//! - `messages`: user-facing strings

pub mod auth;
pub mod calendar;
pub mod db;
pub mod messages;
pub mod models;
pub mod validation;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

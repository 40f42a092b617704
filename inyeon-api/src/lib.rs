//! # Inyeon API Server Library
//!
//! HTTP backend for Inyeon: accounts and sessions, contacts, plans and the
//! place-search proxy.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error type and HTTP response mapping
//! - `mailer`: confirmation and recovery emails
//! - `oauth`: Google and Kakao sign-in
//! - `places`: Kakao keyword search client
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod oauth;
pub mod places;
pub mod routes;

//! # Inyeon Client Library
//!
//! Application layer behind the Inyeon screens: the API service, the auth
//! store and its events, the query cache, and the contact book and calendar
//! controllers. Controllers read through a [`source::DataSource`], so demo
//! mode runs the same code on an in-memory data set.
//!
//! ## Modules
//!
//! - `service`: typed calls to the Inyeon API
//! - `source`: remote and demo data sources
//! - `session`: local storage, auth events, auth store
//! - `account`: sign-in, sign-up, OAuth and password flows
//! - `contacts`: contact book with pinning and paging
//! - `calendar`: month view, quick-create, drag-and-drop moves
//! - `holidays`: public holiday feed
//! - `cache`: query cache with stale times
//!
//! ## Example
//!
//! ```no_run
//! use inyeon_client::{app::InyeonClient, config::ClientConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = InyeonClient::demo(ClientConfig::from_env()?).await?;
//! let pinned = client.contacts().pinned().await?;
//! println!("{} pinned", pinned.len());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod app;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod contacts;
pub mod error;
pub mod holidays;
pub mod notice;
pub mod service;
pub mod session;
pub mod source;

pub use app::InyeonClient;
pub use error::{ServiceError, ServiceResult};

/// Database layer
///
/// - `pool`: Postgres connection pool with health check
/// - `migrations`: embedded schema migrations
///
/// Table queries live with their models in [`crate::models`].

pub mod migrations;
pub mod pool;

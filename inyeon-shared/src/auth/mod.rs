/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: access/refresh session tokens
/// - [`tokens`]: single-use email confirmation and recovery tokens
/// - [`middleware`]: Axum bearer-token middleware and [`middleware::AuthContext`]
///
/// # Example
///
/// ```
/// use inyeon_shared::auth::jwt::issue_session;
/// use inyeon_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Abcdef1!")?;
/// assert!(verify_password("Abcdef1!", &hash)?);
///
/// let session = issue_session(Uuid::new_v4(), "a-secret-that-is-at-least-32-bytes!!")?;
/// assert!(!session.access_token.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod tokens;

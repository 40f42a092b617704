/// User accounts
///
/// Email/password users and OAuth users share one table. OAuth users have no
/// `password_hash`. Email and nickname are unique (`users_email_key`,
/// `users_nickname_key`); the sign-up flow checks both before submitting.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     nickname VARCHAR(8) NOT NULL UNIQUE,
///     password_hash VARCHAR(255),
///     provider auth_provider NOT NULL DEFAULT 'email',
///     email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
///     profile_img TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use inyeon_shared::models::user::{AuthProvider, CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if !User::email_exists(&pool, "a@b.com").await? {
///     let user = User::create(&pool, CreateUser {
///         email: "a@b.com".to_string(),
///         nickname: "철수1".to_string(),
///         password_hash: Some("$argon2id$...".to_string()),
///         provider: AuthProvider::Email,
///         email_confirmed: false,
///         profile_img: None,
///     }).await?;
///     println!("created {}", user.id);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// How the account signs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Email,
    Google,
    Kakao,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Email => "email",
            AuthProvider::Google => "google",
            AuthProvider::Kakao => "kakao",
        }
    }

    /// Parses an OAuth provider path segment; `email` is not an OAuth provider
    pub fn from_oauth_segment(segment: &str) -> Option<Self> {
        match segment {
            "google" => Some(AuthProvider::Google),
            "kakao" => Some(AuthProvider::Kakao),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Case-insensitive (CITEXT)
    pub email: String,

    pub nickname: String,

    /// Argon2id hash; `None` for OAuth-only accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub provider: AuthProvider,

    pub email_confirmed: bool,

    pub profile_img: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// What the client keeps about the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub provider: AuthProvider,
    pub email_confirmed: bool,
    pub profile_img: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            provider: user.provider,
            email_confirmed: user.email_confirmed,
            profile_img: user.profile_img.clone(),
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub nickname: String,
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
    pub email_confirmed: bool,
    pub profile_img: Option<String>,
}

const USER_COLUMNS: &str = "id, email, nickname, password_hash, provider, email_confirmed, \
                            profile_img, created_at, updated_at, last_login_at";

impl User {
    /// Inserts a new account
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`users_email_key` / `users_nickname_key`)
    /// when either value is taken
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, nickname, password_hash, provider, email_confirmed, profile_img) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.nickname)
            .bind(data.password_hash)
            .bind(data.provider)
            .bind(data.email_confirmed)
            .bind(data.profile_img)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Duplicate check used by the sign-up form
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Duplicate check used by the sign-up form
    pub async fn nickname_exists(pool: &PgPool, nickname: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE nickname = $1)")
            .bind(nickname)
            .fetch_one(pool)
            .await
    }

    /// Replaces the password hash
    ///
    /// Returns `false` if the user does not exist.
    pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks the email as confirmed
    pub async fn confirm_email(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email_confirmed = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamps `last_login_at`
    pub async fn record_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Whether the account can sign in with a password
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

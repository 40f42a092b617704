/// Stored single-use link tokens
///
/// Backs the email-confirmation and password-recovery links. A token is
/// consumed with one conditional `UPDATE`, so two concurrent clicks on the
/// same link cannot both succeed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     purpose token_purpose NOT NULL,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     consumed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::tokens::{generate_link_token, hash_link_token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailConfirmation,
    PasswordRecovery,
}

impl TokenPurpose {
    /// How long an emailed link stays valid
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenPurpose::EmailConfirmation => Duration::days(1),
            TokenPurpose::PasswordRecovery => Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: TokenPurpose,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const TOKEN_COLUMNS: &str = "id, user_id, purpose, token_hash, expires_at, consumed_at, created_at";

impl AuthToken {
    /// Stores a new token and returns it with its plaintext
    ///
    /// The plaintext is only available here; it goes into the emailed link.
    pub async fn issue(
        pool: &PgPool,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> Result<(Self, String), sqlx::Error> {
        let (plaintext, hash) = generate_link_token();
        let expires_at = Utc::now() + purpose.lifetime();

        let query = format!(
            "INSERT INTO auth_tokens (user_id, purpose, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TOKEN_COLUMNS
        );

        let token = sqlx::query_as::<_, AuthToken>(&query)
            .bind(user_id)
            .bind(purpose)
            .bind(hash)
            .bind(expires_at)
            .fetch_one(pool)
            .await?;

        Ok((token, plaintext))
    }

    /// Consumes a live token
    ///
    /// Returns `None` for unknown, expired, already used or wrong-purpose
    /// tokens.
    pub async fn consume(
        pool: &PgPool,
        plaintext: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE auth_tokens SET consumed_at = NOW() \
             WHERE token_hash = $1 AND purpose = $2 AND consumed_at IS NULL AND expires_at > NOW() \
             RETURNING {}",
            TOKEN_COLUMNS
        );

        sqlx::query_as::<_, AuthToken>(&query)
            .bind(hash_link_token(plaintext))
            .bind(purpose)
            .fetch_optional(pool)
            .await
    }

    /// Drops tokens that can no longer be used
    pub async fn purge_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM auth_tokens WHERE consumed_at IS NOT NULL OR expires_at <= NOW()",
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub fn is_usable(&self) -> bool {
        self.consumed_at.is_none() && self.expires_at > Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetimes() {
        assert_eq!(TokenPurpose::EmailConfirmation.lifetime(), Duration::days(1));
        assert_eq!(TokenPurpose::PasswordRecovery.lifetime(), Duration::hours(1));
    }

    #[test]
    fn test_is_usable() {
        let mut token = AuthToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            purpose: TokenPurpose::PasswordRecovery,
            token_hash: hash_link_token("abc"),
            expires_at: Utc::now() + Duration::minutes(5),
            consumed_at: None,
            created_at: Utc::now(),
        };
        assert!(token.is_usable());

        token.consumed_at = Some(Utc::now());
        assert!(!token.is_usable());

        token.consumed_at = None;
        token.expires_at = Utc::now() - Duration::minutes(1);
        assert!(!token.is_usable());
    }

    #[test]
    fn test_purpose_wire_format() {
        let json = serde_json::to_string(&TokenPurpose::EmailConfirmation).expect("Should serialize");
        assert_eq!(json, "\"email_confirmation\"");
    }
}

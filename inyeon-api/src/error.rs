/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`; an `ApiError` renders as
/// `{ "error": <code>, "message": <text>, "details"?: [...] }` with the
/// matching status. Messages meant for end users are Korean.
///
/// # Example
///
/// ```
/// use inyeon_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler(found: bool) -> ApiResult<Json<&'static str>> {
///     if !found {
///         return Err(ApiError::NotFound("Contact not found".to_string()));
///     }
///     Ok(Json("ok"))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inyeon_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError},
    messages,
    validation::FieldErrors,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{oauth::OAuthError, places::PlaceSearchError};

pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),

    /// 401
    Unauthorized(String),

    /// 403
    Forbidden(String),

    /// 404
    NotFound(String),

    /// 409, e.g. duplicate email or nickname
    Conflict(String),

    /// 422 with per-field messages
    ValidationError(Vec<ValidationErrorDetail>),

    /// 502, an upstream provider failed
    BadGateway(String),

    /// 500; the message is logged, never returned
    InternalError(String),

    /// 503
    ServiceUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code ("bad_request", "conflict", ...)
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// 422 carrying the first failure of each field
    pub fn from_field_errors(errors: FieldErrors) -> Self {
        ApiError::ValidationError(
            errors
                .into_iter()
                .map(|(field, message)| ValidationErrorDetail { field, message })
                .collect(),
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                ("bad_gateway", msg, None)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg, None),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Maps unique violations on the account columns to their localized
/// duplicate message
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict(messages::DUPLICATE_EMAIL.to_string());
                    }
                    if constraint.contains("nickname") {
                        return ApiError::Conflict(messages::DUPLICATE_NICKNAME.to_string());
                    }
                    if db_err.is_foreign_key_violation() {
                        return ApiError::NotFound("Referenced resource not found".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized(messages::NOT_SIGNED_IN.to_string()),
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::Expired => ApiError::Unauthorized(messages::SESSION_EXPIRED.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized(messages::SESSION_EXPIRED.to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<PlaceSearchError> for ApiError {
    fn from(err: PlaceSearchError) -> Self {
        match err {
            PlaceSearchError::NotConfigured => {
                ApiError::ServiceUnavailable("Place search is not configured".to_string())
            }
            other => ApiError::BadGateway(format!("{}: {}", messages::PLACE_SEARCH_FAILED, other)),
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::UnknownProvider(provider) => {
                ApiError::NotFound(format!("Unknown OAuth provider: {}", provider))
            }
            OAuthError::NotConfigured(provider) => {
                ApiError::ServiceUnavailable(format!("{} sign-in is not configured", provider))
            }
            OAuthError::InvalidState(_) => ApiError::BadRequest(messages::OAUTH_FAILED.to_string()),
            OAuthError::MissingEmail | OAuthError::UnverifiedEmail => {
                ApiError::BadRequest(messages::OAUTH_FAILED.to_string())
            }
            OAuthError::UnconfirmedAccount => ApiError::Conflict(messages::DUPLICATE_EMAIL.to_string()),
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid month".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid month");

        let err = ApiError::NotFound("Plan not found".to_string());
        assert_eq!(err.to_string(), "Not found: Plan not found");
    }

    #[test]
    fn test_field_errors_become_details() {
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), messages::EMAIL_INVALID.to_string());
        errors.insert("password".to_string(), messages::PASSWORD_MIN_LENGTH.to_string());

        let err = ApiError::from_field_errors(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let ApiError::ValidationError(details) = err else {
            panic!("Expected a validation error");
        };
        assert_eq!(details[0].field, "email");
        assert_eq!(details[1].message, messages::PASSWORD_MIN_LENGTH);
    }

    #[test]
    fn test_row_not_found_is_404() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_expired_session_message() {
        let err = ApiError::from(JwtError::Expired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), format!("Unauthorized: {}", messages::SESSION_EXPIRED));
    }

    #[test]
    fn test_missing_place_key_is_503() {
        let err = ApiError::from(PlaceSearchError::NotConfigured);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

/// Client-side domain errors
///
/// Every failure a controller can see ends up here with a message ready to
/// show as a notice. Backend failures carry the localized message of the
/// operation that failed; auth rejections carry the server's own message
/// (invalid credentials, duplicate email, ...).

use crate::session::storage::StorageError;
use inyeon_shared::{messages, validation::FieldErrors};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Backend or network failure of one operation
    #[error("{0}")]
    Failed(&'static str),

    /// Server rejected the request with its own message (400/401/409)
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Per-field validation messages; displays the first one
    #[error("{}", first_field_message(.0))]
    Invalid(FieldErrors),

    #[error("{}", messages::NOT_SIGNED_IN)]
    NotSignedIn,

    #[error("{}", messages::DUPLICATE_CHECK_REQUIRED)]
    DuplicateCheckRequired,

    #[error("{}", messages::DEMO_RESTRICTED)]
    DemoRestricted,

    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn first_field_message(errors: &FieldErrors) -> &str {
    errors
        .values()
        .next()
        .map(String::as_str)
        .unwrap_or(messages::CHECK_INPUT)
}

impl ServiceError {
    /// Whether the session is gone and the user must sign in again
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::NotSignedIn | ServiceError::Rejected { status: 401, .. })
    }

    /// Field messages for an invalid form
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ServiceError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

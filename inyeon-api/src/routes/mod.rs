/// API route handlers, one module per resource

use inyeon_shared::validation::Form;

use crate::error::{ApiError, ApiResult};

pub mod auth;
pub mod contacts;
pub mod health;
pub mod oauth;
pub mod places;
pub mod plans;

/// Runs a form schema, turning failures into a 422 with per-field details
pub(crate) fn validated<F: Form>(form: &F) -> ApiResult<()> {
    let errors = form.field_errors();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::from_field_errors(errors))
    }
}

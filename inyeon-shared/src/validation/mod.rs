/// Form validation
///
/// Each form is a `validator::Validate` struct whose fields carry one custom
/// rule. A rule runs its checks in order and reports only the first failure,
/// so every invalid field ends up with exactly one localized message.
///
/// Validation never fails loudly: [`Form::field_errors`] returns a
/// field → message map that the caller renders next to each input.
///
/// # Example
///
/// ```
/// use inyeon_shared::validation::{Form, signup::SignUpForm};
///
/// let form = SignUpForm {
///     email: "a@b.com".to_string(),
///     password: "abcdefgh".to_string(),
///     password_check: "abcdefgh".to_string(),
///     nickname: "철수1".to_string(),
/// };
///
/// let errors = form.field_errors();
/// assert_eq!(errors["password"], "하나 이상의 특수문자가 포함되어야 합니다.");
/// ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

pub mod contact;
pub mod plan;
pub mod signin;
pub mod signup;

/// Field path → first failing message
///
/// Nested fields use dotted paths (`date_input.from`).
pub type FieldErrors = BTreeMap<String, String>;

/// Common behavior of every form schema
pub trait Form: Validate {
    /// First failure per field; empty when the form is valid
    fn field_errors(&self) -> FieldErrors {
        match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => first_errors(&errors),
        }
    }

    fn is_valid(&self) -> bool {
        self.field_errors().is_empty()
    }
}

/// Builds a failure carrying a localized message
pub(crate) fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Flattens `validator` output to one message per field path
pub fn first_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect(errors, None, &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: Option<&str>, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(first) = list.first() {
                    let message = first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| first.code.to_string());
                    out.insert(path, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, Some(&format!("{}[{}]", path, index)), out);
                }
            }
        }
    }
}

/// Treats an all-whitespace string as absent
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sign-up form
///
/// Rules, in evaluation order:
///
/// | field | checks |
/// |---|---|
/// | `email` | required, email format |
/// | `password` | required, one of `!@#$%^&*`, at least 8 characters |
/// | `password_check` | required, equal to `password` |
/// | `nickname` | required, 2..=8 characters, letters/digits/Hangul/spaces only |

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError};

use super::{failure, FieldErrors, Form};
use crate::messages;

/// Characters that satisfy the special-character rule
pub const PASSWORD_SPECIAL_CHARS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*'];

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const NICKNAME_MIN_CHARS: usize = 2;
pub const NICKNAME_MAX_CHARS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,

    #[validate(custom(function = "validate_password_check_present"))]
    pub password_check: String,

    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

impl Form for SignUpForm {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => super::first_errors(&errors),
        };

        if !errors.contains_key("password_check") && self.password_check != self.password {
            errors.insert(
                "password_check".to_string(),
                messages::PASSWORD_MISMATCH.to_string(),
            );
        }

        errors
    }
}

/// Required, then email format
pub fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(failure("required", messages::EMAIL_REQUIRED));
    }
    if !value.validate_email() {
        return Err(failure("email", messages::EMAIL_INVALID));
    }
    Ok(())
}

/// Required, then special character, then length
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(failure("required", messages::PASSWORD_REQUIRED));
    }
    if !value.contains(PASSWORD_SPECIAL_CHARS) {
        return Err(failure("special_char", messages::PASSWORD_SPECIAL_CHAR));
    }
    if value.chars().count() < PASSWORD_MIN_CHARS {
        return Err(failure("min_length", messages::PASSWORD_MIN_LENGTH));
    }
    Ok(())
}

fn validate_password_check_present(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(failure("required", messages::PASSWORD_CHECK_REQUIRED));
    }
    Ok(())
}

/// Whether a character may appear in a nickname
pub fn is_nickname_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c) || c.is_whitespace()
}

/// Required, then length bounds, then charset
pub fn validate_nickname(value: &str) -> Result<(), ValidationError> {
    let length = value.chars().count();

    if length == 0 {
        return Err(failure("required", messages::NICKNAME_REQUIRED));
    }
    if length < NICKNAME_MIN_CHARS {
        return Err(failure("min_length", messages::NICKNAME_MIN_LENGTH));
    }
    if length > NICKNAME_MAX_CHARS {
        return Err(failure("max_length", messages::NICKNAME_MAX_LENGTH));
    }
    if !value.chars().all(is_nickname_char) {
        return Err(failure("charset", messages::NICKNAME_CHARSET));
    }
    Ok(())
}

/// Sign-in and account recovery forms
///
/// Sign-in only checks presence and email shape; the password policy applies
/// when a password is chosen (sign-up and [`ChangePasswordForm`]).

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::signup::{validate_email_address, validate_password};
use super::{failure, FieldErrors, Form};
use crate::messages;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SignInForm {
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,

    #[validate(custom(function = "validate_password_present"))]
    pub password: String,
}

impl Form for SignInForm {}

fn validate_password_present(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(failure("required", messages::PASSWORD_REQUIRED));
    }
    Ok(())
}

/// Password reset request: only the email
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PasswordResetForm {
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,
}

impl Form for PasswordResetForm {}

/// New password chosen after following a recovery link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ChangePasswordForm {
    #[validate(custom(function = "validate_password"))]
    pub password: String,

    #[serde(default)]
    pub password_check: String,
}

impl Form for ChangePasswordForm {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => super::first_errors(&errors),
        };

        if self.password_check.is_empty() {
            errors.insert(
                "password_check".to_string(),
                messages::PASSWORD_CHECK_REQUIRED.to_string(),
            );
        } else if self.password_check != self.password {
            errors.insert("password_check".to_string(), messages::PASSWORD_MISMATCH.to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_form() {
        let form = SignInForm {
            email: "a@b.com".to_string(),
            password: "anything".to_string(),
        };
        assert!(form.is_valid());

        let errors = SignInForm::default().field_errors();
        assert_eq!(errors["email"], messages::EMAIL_REQUIRED);
        assert_eq!(errors["password"], messages::PASSWORD_REQUIRED);
    }

    #[test]
    fn test_sign_in_does_not_apply_password_policy() {
        let form = SignInForm {
            email: "a@b.com".to_string(),
            password: "short".to_string(),
        };
        assert!(form.field_errors().is_empty());
    }

    #[test]
    fn test_change_password_form() {
        let form = ChangePasswordForm {
            password: "newpass!1".to_string(),
            password_check: "newpass!1".to_string(),
        };
        assert!(form.is_valid());

        let form = ChangePasswordForm {
            password: "newpass1".to_string(),
            password_check: "newpass!1".to_string(),
        };
        let errors = form.field_errors();
        assert_eq!(errors["password"], messages::PASSWORD_SPECIAL_CHAR);
        assert_eq!(errors["password_check"], messages::PASSWORD_MISMATCH);
    }

    #[test]
    fn test_password_reset_form() {
        let form = PasswordResetForm {
            email: "a@@b".to_string(),
        };
        assert_eq!(form.field_errors()["email"], messages::EMAIL_INVALID);
    }
}

/// Contact form
///
/// Only `name` is required. Optional fields are validated only when filled
/// in, and blank optional fields are stored as NULL.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError};

use super::{failure, non_blank, FieldErrors, Form};
use crate::messages;
use crate::models::contact::{Contact, ContactInput, DEFAULT_RELATIONSHIP};

pub const NOTES_MIN_CHARS: usize = 5;
pub const BIRTH_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ContactForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    pub relationship_level: String,

    #[validate(custom(function = "validate_notes"))]
    pub notes: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(custom(function = "validate_contact_email"))]
    pub email: String,

    #[validate(custom(function = "validate_birth"))]
    pub birth: String,

    pub contacts_profile_img: String,
}

impl Form for ContactForm {}

impl ContactForm {
    /// Prefills the edit form from a stored contact
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            relationship_level: contact.relationship_level.clone(),
            notes: contact.notes.clone().unwrap_or_default(),
            phone: contact.phone.clone().unwrap_or_default(),
            email: contact.email.clone().unwrap_or_default(),
            birth: contact
                .birth
                .map(|d| d.format(BIRTH_FORMAT).to_string())
                .unwrap_or_default(),
            contacts_profile_img: contact.contacts_profile_img.clone().unwrap_or_default(),
        }
    }

    /// Validates and normalizes into a write payload
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when the form is invalid
    pub fn to_input(&self) -> Result<ContactInput, FieldErrors> {
        let errors = self.field_errors();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ContactInput {
            name: self.name.trim().to_string(),
            relationship_level: non_blank(&self.relationship_level)
                .unwrap_or_else(|| DEFAULT_RELATIONSHIP.to_string()),
            notes: non_blank(&self.notes),
            phone: non_blank(&self.phone),
            email: non_blank(&self.email),
            birth: non_blank(&self.birth)
                .and_then(|b| NaiveDate::parse_from_str(&b, BIRTH_FORMAT).ok()),
            contacts_profile_img: non_blank(&self.contacts_profile_img),
        })
    }
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(failure("required", messages::CONTACT_NAME_REQUIRED));
    }
    Ok(())
}

fn validate_notes(value: &str) -> Result<(), ValidationError> {
    if !value.trim().is_empty() && value.chars().count() < NOTES_MIN_CHARS {
        return Err(failure("min_length", messages::CONTACT_NOTES_MIN_LENGTH));
    }
    Ok(())
}

/// Empty, or 10 to 11 ASCII digits
fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    let digits_only = value.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || !(10..=11).contains(&value.len()) {
        return Err(failure("phone", messages::CONTACT_PHONE_INVALID));
    }
    Ok(())
}

fn validate_contact_email(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && !value.validate_email() {
        return Err(failure("email", messages::CONTACT_EMAIL_INVALID));
    }
    Ok(())
}

fn validate_birth(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    let well_shaped = value.len() == 10 && value.as_bytes()[4] == b'-' && value.as_bytes()[7] == b'-';
    if !well_shaped || NaiveDate::parse_from_str(value, BIRTH_FORMAT).is_err() {
        return Err(failure("birth", messages::CONTACT_BIRTH_INVALID));
    }
    Ok(())
}

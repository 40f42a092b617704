/// Plan form (quick-create popover and full edit form)
///
/// `title`, `contacts` and `date_input.from` are required. `date_input.to`
/// is optional and deliberately not compared with `from`; a missing `to`
/// makes a plan that ends when it starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{failure, non_blank, FieldErrors, Form};
use crate::messages;
use crate::models::place::Place;
use crate::models::plan::{NewPlan, PlanDetail, PlanPriority, DEFAULT_PLAN_COLOR};

/// Start/end picked in the date range input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInput {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlanForm {
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    /// Linked contact id
    pub contacts: Option<Uuid>,

    pub date_input: DateInput,

    pub detail: String,

    pub priority: Option<PlanPriority>,

    pub location: Option<Place>,

    pub colors: String,
}

impl Form for PlanForm {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(errors) => super::first_errors(&errors),
        };

        if self.contacts.is_none() {
            errors.insert("contacts".to_string(), messages::PLAN_CONTACT_REQUIRED.to_string());
        }
        if self.date_input.from.is_none() {
            errors.insert("date_input.from".to_string(), messages::PLAN_START_REQUIRED.to_string());
        }

        errors
    }
}

impl PlanForm {
    /// Quick-create draft seeded with the clicked calendar slot
    pub fn draft_at(start: DateTime<Utc>) -> Self {
        Self {
            date_input: DateInput {
                from: Some(start),
                to: None,
            },
            colors: DEFAULT_PLAN_COLOR.to_string(),
            ..Default::default()
        }
    }

    /// Prefills the edit form from a stored plan
    pub fn from_detail(detail: &PlanDetail) -> Self {
        let plan = &detail.plan;

        Self {
            title: plan.title.clone(),
            contacts: plan.contacts_id,
            date_input: DateInput {
                from: Some(plan.start_date),
                to: Some(plan.end_date),
            },
            detail: plan.detail.clone().unwrap_or_default(),
            priority: plan.priority,
            location: plan.place().cloned(),
            colors: plan.color().to_string(),
        }
    }

    /// Validates and converts into a write payload
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when the form is invalid
    pub fn to_new_plan(&self) -> Result<NewPlan, FieldErrors> {
        let errors = self.field_errors();
        let (Some(contacts_id), Some(start_date)) = (self.contacts, self.date_input.from) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewPlan {
            contacts_id: Some(contacts_id),
            title: self.title.trim().to_string(),
            detail: non_blank(&self.detail),
            priority: self.priority,
            start_date,
            end_date: self.date_input.to.unwrap_or(start_date),
            location: self
                .location
                .clone()
                .filter(|place| !place.place_name.trim().is_empty()),
            colors: Some(non_blank(&self.colors).unwrap_or_else(|| DEFAULT_PLAN_COLOR.to_string())),
        })
    }
}

fn validate_title(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(failure("required", messages::PLAN_TITLE_REQUIRED));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn valid_form() -> PlanForm {
        PlanForm {
            title: "저녁 약속".to_string(),
            contacts: Some(Uuid::new_v4()),
            ..PlanForm::draft_at(Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap())
        }
    }

    #[test]
    fn test_required_fields() {
        let errors = PlanForm::default().field_errors();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors["title"], messages::PLAN_TITLE_REQUIRED);
        assert_eq!(errors["contacts"], messages::PLAN_CONTACT_REQUIRED);
        assert_eq!(errors["date_input.from"], messages::PLAN_START_REQUIRED);
    }

    #[test]
    fn test_missing_end_defaults_to_start() {
        let plan = valid_form().to_new_plan().expect("Form should be valid");

        assert_eq!(plan.end_date, plan.start_date);
        assert_eq!(plan.colors.as_deref(), Some(DEFAULT_PLAN_COLOR));
        assert_eq!(plan.detail, None);
    }

    #[test]
    fn test_end_before_start_is_accepted() {
        let mut form = valid_form();
        let from = form.date_input.from.expect("Draft has a start");
        form.date_input.to = Some(from - Duration::days(2));

        assert!(form.is_valid());
        let plan = form.to_new_plan().expect("Form should be valid");
        assert!(plan.end_date < plan.start_date);
    }

    #[test]
    fn test_free_text_location_is_kept() {
        let form = PlanForm {
            location: Some(Place::from_text("성수동 카페")),
            ..valid_form()
        };

        let plan = form.to_new_plan().expect("Form should be valid");
        assert_eq!(plan.location.map(|p| p.place_name), Some("성수동 카페".to_string()));
    }

    #[test]
    fn test_to_new_plan_rejects_missing_contact() {
        let form = PlanForm {
            contacts: None,
            ..valid_form()
        };

        let errors = form.to_new_plan().expect_err("Form should be invalid");
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("contacts"));
    }
}

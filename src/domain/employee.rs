use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::error::DomainError;

/// Postal address of an employee. Every component is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Sets a single component by its form key (`street`, `city`, `state`, `postalCode`, `country`).
    ///
    /// Returns `false` when the key names no address component.
    pub fn set_component(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "street" => &mut self.street,
            "city" => &mut self.city,
            "state" => &mut self.state,
            "postalCode" | "postal_code" => &mut self.postal_code,
            "country" => &mut self.country,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub job_title: String,
    pub department: String,
    pub address: Address,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(
        id: String,
        fields: EmployeeFields,
        profile_picture: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone_number: fields.phone_number,
            job_title: fields.job_title,
            department: fields.department,
            address: fields.address,
            profile_picture,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every editable field. The picture is only swapped when `profile_picture` is `Some`;
    /// the superseded path is returned so the caller can remove the old file.
    pub fn apply(
        &mut self,
        fields: EmployeeFields,
        profile_picture: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        self.first_name = fields.first_name;
        self.last_name = fields.last_name;
        self.email = fields.email;
        self.phone_number = fields.phone_number;
        self.job_title = fields.job_title;
        self.department = fields.department;
        self.address = fields.address;
        self.updated_at = now;

        match profile_picture {
            Some(path) => self.profile_picture.replace(path),
            None => None,
        }
    }
}

/// Employee fields as submitted by a create or update form, before validation.
#[derive(Debug, Clone, Default, Validate)]
pub struct EmployeeForm {
    #[validate(
        required(message = "firstName is required"),
        length(min = 1, message = "firstName is required")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "lastName is required"),
        length(min = 1, message = "lastName is required")
    )]
    pub last_name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "phoneNumber is required"),
        length(min = 1, message = "phoneNumber is required")
    )]
    pub phone_number: Option<String>,
    #[validate(
        required(message = "jobTitle is required"),
        length(min = 1, message = "jobTitle is required")
    )]
    pub job_title: Option<String>,
    #[validate(
        required(message = "department is required"),
        length(min = 1, message = "department is required")
    )]
    pub department: Option<String>,
    pub address: Address,
}

/// A validated set of employee fields, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub job_title: String,
    pub department: String,
    pub address: Address,
}

impl EmployeeForm {
    pub fn into_fields(self) -> Result<EmployeeFields, DomainError> {
        self.validate().map_err(validation_message)?;

        // validate() has already rejected every missing field
        let required = |value: Option<String>| value.unwrap_or_default();
        Ok(EmployeeFields {
            first_name: required(self.first_name),
            last_name: required(self.last_name),
            email: required(self.email),
            phone_number: required(self.phone_number),
            job_title: required(self.job_title),
            department: required(self.department),
            address: self.address,
        })
    }
}

fn validation_message(errors: ValidationErrors) -> DomainError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.dedup();
    DomainError::Validation(messages.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> EmployeeForm {
        EmployeeForm {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone_number: Some("+44 20 7946 0000".to_string()),
            job_title: Some("Engineer".to_string()),
            department: Some("R&D".to_string()),
            address: Address::default(),
        }
    }

    #[test]
    fn test_complete_form_validates() {
        let fields = complete_form().into_fields().unwrap();
        assert_eq!(fields.first_name, "Ada");
        assert_eq!(fields.email, "ada@example.com");
        assert_eq!(fields.address, Address::default());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let form = EmployeeForm {
            department: None,
            ..complete_form()
        };
        match form.into_fields() {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "department is required"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_field_is_rejected() {
        let form = EmployeeForm {
            first_name: Some(String::new()),
            ..complete_form()
        };
        assert!(matches!(
            form.into_fields(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_email_is_rejected() {
        let form = EmployeeForm {
            email: Some("not-an-email".to_string()),
            ..complete_form()
        };
        match form.into_fields() {
            Err(DomainError::Validation(msg)) => {
                assert_eq!(msg, "email must be a valid email address")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_errors_are_joined_in_stable_order() {
        let form = EmployeeForm {
            last_name: None,
            job_title: None,
            ..complete_form()
        };
        match form.into_fields() {
            Err(DomainError::Validation(msg)) => {
                assert_eq!(msg, "jobTitle is required, lastName is required")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_keeps_picture_when_none_supplied() {
        let now = Utc::now();
        let fields = complete_form().into_fields().unwrap();
        let mut employee = Employee::new(
            "id-1".to_string(),
            fields.clone(),
            Some("uploads/old.png".to_string()),
            now,
        );

        let replaced = employee.apply(fields, None, now);
        assert_eq!(replaced, None);
        assert_eq!(employee.profile_picture.as_deref(), Some("uploads/old.png"));
    }

    #[test]
    fn test_apply_returns_superseded_picture() {
        let now = Utc::now();
        let fields = complete_form().into_fields().unwrap();
        let mut employee = Employee::new(
            "id-1".to_string(),
            fields.clone(),
            Some("uploads/old.png".to_string()),
            now,
        );

        let replaced = employee.apply(fields, Some("uploads/new.png".to_string()), now);
        assert_eq!(replaced.as_deref(), Some("uploads/old.png"));
        assert_eq!(employee.profile_picture.as_deref(), Some("uploads/new.png"));
    }

    #[test]
    fn test_address_components_by_form_key() {
        let mut address = Address::default();
        assert!(address.set_component("postalCode", "12345".to_string()));
        assert!(address.set_component("city", "Paris".to_string()));
        assert!(!address.set_component("planet", "Earth".to_string()));
        assert_eq!(address.postal_code.as_deref(), Some("12345"));
        assert_eq!(address.city.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_employee_serializes_camel_case() {
        let fields = complete_form().into_fields().unwrap();
        let employee = Employee::new("id-1".to_string(), fields, None, Utc::now());
        let json = serde_json::to_value(&employee).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["phoneNumber"], "+44 20 7946 0000");
        assert!(json["profilePicture"].is_null());
        assert!(json.get("createdAt").is_some());
    }
}

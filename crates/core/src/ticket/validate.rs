//! Create-request validation.

use std::fmt;

use serde::Serialize;

use super::CreateTicketRequest;

pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 80;
pub const DESCRIPTION_MIN: usize = 20;
pub const DESCRIPTION_MAX: usize = 500;

/// Per-field validation messages for a create request.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ValidationErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [self.title.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Option<String> {
    let len = value.trim().chars().count();
    if len == 0 {
        Some(format!("{} is required", field))
    } else if len < min {
        Some(format!("{} must be at least {} characters", field, min))
    } else if len > max {
        Some(format!("{} must be at most {} characters", field, max))
    } else {
        None
    }
}

/// Validate a create request. Lengths are measured after trimming whitespace.
pub fn validate_create_request(request: &CreateTicketRequest) -> Result<(), ValidationErrors> {
    let errors = ValidationErrors {
        title: check_length("Title", &request.title, TITLE_MIN, TITLE_MAX),
        description: check_length(
            "Description",
            &request.description,
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
        ),
    };

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::Priority;

    fn request(title: &str, description: &str) -> CreateTicketRequest {
        CreateTicketRequest::new(title, description, Priority::Regular)
    }

    #[test]
    fn test_valid_request() {
        let r = request("Cannot login", "User cannot login after password reset");
        assert!(validate_create_request(&r).is_ok());
    }

    #[test]
    fn test_missing_fields() {
        let errors = validate_create_request(&request("   ", "")).unwrap_err();
        assert_eq!(errors.title.as_deref(), Some("Title is required"));
        assert_eq!(errors.description.as_deref(), Some("Description is required"));
        assert_eq!(
            errors.to_string(),
            "Title is required; Description is required"
        );
    }

    #[test]
    fn test_too_short() {
        let errors = validate_create_request(&request("abcd", "too short")).unwrap_err();
        assert_eq!(
            errors.title.as_deref(),
            Some("Title must be at least 5 characters")
        );
        assert_eq!(
            errors.description.as_deref(),
            Some("Description must be at least 20 characters")
        );
    }

    #[test]
    fn test_too_long() {
        let long_title = "x".repeat(TITLE_MAX + 1);
        let long_description = "y".repeat(DESCRIPTION_MAX + 1);
        let errors = validate_create_request(&request(&long_title, &long_description)).unwrap_err();
        assert_eq!(
            errors.title.as_deref(),
            Some("Title must be at most 80 characters")
        );
        assert_eq!(
            errors.description.as_deref(),
            Some("Description must be at most 500 characters")
        );
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let r = request(&"t".repeat(TITLE_MIN), &"d".repeat(DESCRIPTION_MAX));
        assert!(validate_create_request(&r).is_ok());
    }

    #[test]
    fn test_whitespace_is_trimmed_before_measuring() {
        let r = request("  abcd  ", "A description that is long enough");
        let errors = validate_create_request(&r).unwrap_err();
        assert!(errors.title.is_some());
        assert!(errors.description.is_none());
    }
}

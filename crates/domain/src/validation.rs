//! Field-level validation results.
//!
//! Rules are plain functions returning `Result<T, FieldError>`, or
//! `#[derive(Validate)]` attributes on the store's insert shapes. A caller
//! runs all of them, collects failures into [`ValidationErrors`] and only
//! proceeds to side effects when nothing failed.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single failed rule, addressed by field path (`line_items[2].quantity`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every failed rule of one request, grouped by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure.
    pub fn push(&mut self, error: FieldError) {
        self.0.entry(error.field).or_default().push(error.message);
    }

    /// Records the failure of `result`, if any, and passes the value through.
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error);
                None
            }
        }
    }

    /// Records every field failure reported by a `Validate` derive.
    pub fn absorb(&mut self, result: Result<(), validator::ValidationErrors>) {
        let Err(errors) = result else {
            return;
        };
        for (field, failures) in errors.field_errors() {
            for failure in failures {
                let message = failure
                    .message
                    .as_ref()
                    .map_or_else(|| failure.code.to_string(), ToString::to_string);
                self.push(FieldError::new(field.to_string(), message));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for one field.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns `value` if nothing failed, or the collected failures.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut converted = Self::new();
        converted.absorb(Err(errors));
        converted
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.push(error);
        errors
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_collects_failures_and_passes_values() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.check::<i32>(Ok(3)), Some(3));
        assert_eq!(
            errors.check::<i32>(Err(FieldError::new("quantity", "too small"))),
            None
        );
        assert_eq!(errors.field("quantity").unwrap(), ["too small"]);
        assert!(errors.finish(|| ()).is_err());
    }

    #[test]
    fn test_finish_returns_value_when_clean() {
        let errors = ValidationErrors::new();
        assert_eq!(errors.finish(|| 42).unwrap(), 42);
    }

    #[test]
    fn test_display_lists_every_message() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError::new("b", "second"));
        errors.push(FieldError::new("a", "first"));
        assert_eq!(errors.to_string(), "a: first; b: second");
    }

    #[test]
    fn test_serializes_as_field_map() {
        let errors: ValidationErrors = FieldError::new("customer_id", "customer not found").into();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"customer_id": ["customer not found"]}));
    }

    #[test]
    fn test_absorbs_derived_field_errors() {
        let mut derived = validator::ValidationErrors::new();
        derived.add(
            "email",
            validator::ValidationError::new("email").with_message("enter a valid email address".into()),
        );
        derived.add("name", validator::ValidationError::new("blank"));

        let mut errors = ValidationErrors::new();
        errors.absorb(Ok(()));
        assert!(errors.is_empty());

        errors.absorb(Err(derived));
        assert_eq!(errors.field("email").unwrap(), ["enter a valid email address"]);
        assert_eq!(errors.field("name").unwrap(), ["blank"]);
    }
}

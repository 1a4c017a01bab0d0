//! Shared validation helpers for feature commands and queries

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldValidationError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },
    #[error("{field} must be at most {max_length} characters")]
    TooLong {
        field: &'static str,
        max_length: usize,
    },
}

/// Required text with a maximum length counted in characters
///
/// Whitespace-only values count as empty. The length bound applies to the
/// value as given, matching what the column stores.
pub fn validate_required_text(
    field: &'static str,
    value: &str,
    max_length: usize,
) -> Result<(), FieldValidationError> {
    if value.trim().is_empty() {
        return Err(FieldValidationError::Required { field });
    }
    if value.chars().count() > max_length {
        return Err(FieldValidationError::TooLong { field, max_length });
    }
    Ok(())
}

/// Like [`validate_required_text`] but `None` passes
pub fn validate_optional_text(
    field: &'static str,
    value: Option<&str>,
    max_length: usize,
) -> Result<(), FieldValidationError> {
    match value {
        Some(value) => validate_required_text(field, value, max_length),
        None => Ok(()),
    }
}

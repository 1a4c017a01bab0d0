//! Shared utilities and types for feature modules
//!
//! - **pagination**: keyset cursor and list limit parameters
//! - **validation**: input validation utilities
//! - **test_helpers**: test fixtures (test-only)

pub mod pagination;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use pagination::{CursorMetadata, CursorParams, ListLimit};
pub use validation::{validate_optional_text, validate_required_text, FieldValidationError};

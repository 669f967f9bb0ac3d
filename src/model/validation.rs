//! Input validation for product drafts and patches.
//!
//! Validation runs before the registry touches its state, so a rejected request never
//! leaves a half-applied mutation behind.

use thiserror::Error;

/// Errors raised when create or update input is malformed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// The product title is empty or whitespace.
    #[error("Title is required")]
    MissingTitle,

    /// A numeric field is outside its allowed range (or not a finite number).
    #[error("Invalid {field}: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub(crate) fn check_range(
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < min || v > max => Err(ValidationError::OutOfRange {
            field,
            value: v,
            min,
            max,
        }),
        _ => Ok(()),
    }
}

pub(crate) fn check_title(title: Option<&str>) -> Result<(), ValidationError> {
    match title {
        Some(t) if t.trim().is_empty() => Err(ValidationError::MissingTitle),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_accepts_bounds_and_absent_values() {
        assert!(check_range("rating", Some(0.0), 0.0, 5.0).is_ok());
        assert!(check_range("rating", Some(5.0), 0.0, 5.0).is_ok());
        assert!(check_range("rating", None, 0.0, 5.0).is_ok());
    }

    #[test]
    fn test_range_rejects_out_of_bounds_and_nan() {
        assert!(matches!(
            check_range("discountPercentage", Some(101.0), 0.0, 100.0),
            Err(ValidationError::OutOfRange { field: "discountPercentage", .. })
        ));
        assert!(check_range("price", Some(f64::NAN), 0.0, f64::MAX).is_err());
        assert!(check_range("price", Some(-0.5), 0.0, f64::MAX).is_err());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        assert_eq!(check_title(Some("   ")), Err(ValidationError::MissingTitle));
        assert!(check_title(Some("Lamp")).is_ok());
    }
}

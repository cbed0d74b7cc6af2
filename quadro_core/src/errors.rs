//! # Error Types
//!
//! Structured error types for quadro_core. Failures fall into distinct
//! categories so callers can tell a bad input apart from an impossible
//! calculation or a defective reference table without inspecting strings.
//!
//! | Kind          | Variants                                                         |
//! |---------------|------------------------------------------------------------------|
//! | Validation    | `ValidationFailed`, `InvalidInput`                               |
//! | Calculation   | `NoSuitableBreaker`, `NoSuitableConductor`, `TableKeyOutOfRange`, `CalculationFailed` |
//! | Consistency   | `ConsistencyCheckFailed`                                         |
//! | Persistence   | `FileError`, `FileLocked`, `SerializationError`, `VersionMismatch` |
//! | Internal      | `Internal`                                                       |
//!
//! ## Example
//!
//! ```rust
//! use quadro_core::errors::{CalcError, CalcResult, ErrorKind, FieldErrors};
//!
//! fn validate_power(power_w: f64) -> CalcResult<()> {
//!     let mut errors = FieldErrors::new();
//!     if power_w <= 0.0 {
//!         errors.insert("power_w".to_string(), "Power must be positive".to_string());
//!     }
//!     CalcError::from_field_errors(errors)
//! }
//!
//! let err = validate_power(-5.0).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for quadro_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Field name → human readable message, ordered by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Broad failure category of a [`CalcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad or missing user input, detected before any calculation
    Validation,
    /// Well-formed input that no table entry can satisfy
    Calculation,
    /// A successful selection failed the final cross-check (table defect)
    Consistency,
    /// Project file I/O
    Persistence,
    /// Unexpected condition
    Internal,
}

/// Structured error type for dimensioning and project operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// One or more input fields are invalid; every offending field is listed
    #[error("Validation failed: {}", format_field_errors(.errors))]
    ValidationFailed { errors: FieldErrors },

    /// A single input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Design current exceeds the largest standard breaker rating
    #[error("No suitable breaker: design current {design_current_a:.2} A exceeds {largest_rating_a} A")]
    NoSuitableBreaker {
        design_current_a: f64,
        largest_rating_a: f64,
    },

    /// No tabulated section carries both the design current and the breaker rating
    #[error(
        "No suitable conductor: need {required_a:.2} A ({method}, {loaded_conductors} loaded conductors), \
         largest section gives {largest_capacity_a:.2} A"
    )]
    NoSuitableConductor {
        required_a: f64,
        method: String,
        loaded_conductors: u8,
        largest_capacity_a: f64,
    },

    /// A correction-table key lies outside the tabulated range
    #[error("Table key out of range: {table} has no entry for {key} (tabulated {min}..={max})")]
    TableKeyOutOfRange {
        table: String,
        key: f64,
        min: f64,
        max: f64,
    },

    /// Calculation failed for another reason
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// Final cross-check failed after every selection succeeded
    #[error("Consistency check failed: {check} ({detail})")]
    ConsistencyCheckFailed { check: String, detail: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CalcError::Internal {
            message: message.into(),
        }
    }

    /// Create a ValidationFailed error with a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), message.into());
        CalcError::ValidationFailed { errors }
    }

    /// `Ok(())` when `errors` is empty, otherwise `ValidationFailed`.
    pub fn from_field_errors(errors: FieldErrors) -> CalcResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CalcError::ValidationFailed { errors })
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConsistencyCheckFailed error
    pub fn consistency(check: impl Into<String>, detail: impl Into<String>) -> Self {
        CalcError::ConsistencyCheckFailed {
            check: check.into(),
            detail: detail.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Failure category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::ValidationFailed { .. } | CalcError::InvalidInput { .. } => ErrorKind::Validation,
            CalcError::NoSuitableBreaker { .. }
            | CalcError::NoSuitableConductor { .. }
            | CalcError::TableKeyOutOfRange { .. }
            | CalcError::CalculationFailed { .. } => ErrorKind::Calculation,
            CalcError::ConsistencyCheckFailed { .. } => ErrorKind::Consistency,
            CalcError::FileError { .. }
            | CalcError::FileLocked { .. }
            | CalcError::SerializationError { .. }
            | CalcError::VersionMismatch { .. } => ErrorKind::Persistence,
            CalcError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Per-field messages for validation errors.
    ///
    /// `InvalidInput` is reported as a single-entry map so a form can attach
    /// it to the offending input. Other kinds attach to the
    /// circuit as a whole and return `None`.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            CalcError::ValidationFailed { errors } => Some(errors.clone()),
            CalcError::InvalidInput { field, reason, .. } => {
                Some(FieldErrors::from([(field.clone(), reason.clone())]))
            }
            _ => None,
        }
    }

    /// Whether retrying later may succeed (another user holds the lock)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::ValidationFailed { .. } => "VALIDATION_FAILED",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::NoSuitableBreaker { .. } => "NO_SUITABLE_BREAKER",
            CalcError::NoSuitableConductor { .. } => "NO_SUITABLE_CONDUCTOR",
            CalcError::TableKeyOutOfRange { .. } => "TABLE_KEY_OUT_OF_RANGE",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::ConsistencyCheckFailed { .. } => "CONSISTENCY_CHECK_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::field("power_w", "Power must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("ValidationFailed"));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::internal("boom").error_code(), "INTERNAL_ERROR");
        let err = CalcError::NoSuitableBreaker {
            design_current_a: 700.0,
            largest_rating_a: 630.0,
        };
        assert_eq!(err.error_code(), "NO_SUITABLE_BREAKER");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CalcError::field("voltage_v", "bad").kind(), ErrorKind::Validation);
        assert_eq!(
            CalcError::calculation_failed("dimensioning", "x").kind(),
            ErrorKind::Calculation
        );
        assert_eq!(CalcError::consistency("Iz >= In", "x").kind(), ErrorKind::Consistency);
        assert_eq!(
            CalcError::file_locked("a.qdr", "someone", "now").kind(),
            ErrorKind::Persistence
        );
        assert_eq!(CalcError::internal("boom").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_only_lock_contention_is_recoverable() {
        assert!(CalcError::file_locked("a.qdr", "someone", "now").is_recoverable());
        assert!(!CalcError::file_error("read", "a.qdr", "denied").is_recoverable());
        assert!(!CalcError::field("power_w", "bad").is_recoverable());
    }

    #[test]
    fn test_from_field_errors() {
        assert!(CalcError::from_field_errors(FieldErrors::new()).is_ok());

        let mut errors = FieldErrors::new();
        errors.insert("power_w".into(), "Power must be positive".into());
        errors.insert("voltage_v".into(), "Unsupported voltage".into());
        let err = CalcError::from_field_errors(errors).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.len(), 2);
        assert!(err.to_string().contains("power_w: Power must be positive"));
    }

    #[test]
    fn test_whole_circuit_errors_have_no_field_map() {
        let err = CalcError::NoSuitableBreaker {
            design_current_a: 700.0,
            largest_rating_a: 630.0,
        };
        assert!(err.field_errors().is_none());
        assert!(err.to_string().contains("700.00 A"));
    }
}

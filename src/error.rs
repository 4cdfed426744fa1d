//! Unified error types for the patient record service.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the record service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Candidate record failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Record store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A single field of a candidate record violated its constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field `{field}`: {reason}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable description of the violation.
    pub reason: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Record store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A query argument is outside its allowed set.
    #[error("invalid {param} `{value}`: expected one of {allowed}")]
    InvalidArgument {
        /// Parameter name.
        param: &'static str,
        /// Value that was supplied.
        value: String,
        /// Allowed values, comma separated.
        allowed: &'static str,
    },

    /// No patient with this id.
    #[error("no patient is available with id {id}")]
    NotFound {
        /// The unknown id.
        id: String,
    },

    /// A patient with this id already exists.
    #[error("patient id {id} already exists")]
    DuplicateId {
        /// The colliding id.
        id: String,
    },

    /// The backing file could not be read or written.
    #[error("storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable {
        /// Path of the backing file.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },
}

impl StoreError {
    /// Build a `StorageUnavailable` for `path` from any displayable cause.
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        StoreError::StorageUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-friendly label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidArgument { .. } => "invalid_argument",
            StoreError::NotFound { .. } => "not_found",
            StoreError::DuplicateId { .. } => "duplicate_id",
            StoreError::StorageUnavailable { .. } => "storage_unavailable",
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field() {
        let err = ValidationError::new("age", "must be less than 100");
        assert_eq!(err.to_string(), "invalid field `age`: must be less than 100");
    }

    #[test]
    fn store_error_messages() {
        let err = StoreError::InvalidArgument {
            param: "sort_by",
            value: "age".to_string(),
            allowed: "height, weight, bmi",
        };
        assert_eq!(
            err.to_string(),
            "invalid sort_by `age`: expected one of height, weight, bmi"
        );
        assert_eq!(err.kind(), "invalid_argument");

        let err = StoreError::unavailable("/tmp/patients.json", "file not found");
        assert_eq!(
            err.to_string(),
            "storage unavailable at /tmp/patients.json: file not found"
        );
    }

    #[test]
    fn config_failures_are_service_errors() {
        let vars = [("PORT".to_string(), "not-a-port".to_string())];
        let err = ServiceError::from(envy::from_iter::<_, crate::Config>(vars).unwrap_err());
        assert!(matches!(err, ServiceError::Config(_)));
        assert!(err.to_string().starts_with("configuration error"));

        let err = ServiceError::InvalidConfig("PORT must be non-zero".into());
        assert_eq!(err.to_string(), "invalid configuration: PORT must be non-zero");
    }

    #[test]
    fn service_error_wraps_store_error() {
        let err: ServiceError = StoreError::NotFound { id: "P404".into() }.into();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound { .. })));
        assert_eq!(err.to_string(), "no patient is available with id P404");
    }
}

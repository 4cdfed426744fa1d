//! Patient record model.
//!
//! This module handles:
//! - Patient types and their persisted/serialized shapes
//! - Field validation of raw request input
//! - Derived health metrics (BMI and verdict)

pub mod health;
pub mod types;
pub mod validation;

pub use health::{bmi, Verdict, VerdictRule};
pub use types::{
    Gender, NewPatient, Patient, PatientDetails, PatientRecord, PatientUpdate, PatientView,
};
pub use validation::{apply_update, validate, validate_stored, validate_value};

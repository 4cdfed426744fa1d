//! Patient record types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::health::{self, Verdict, VerdictRule};

/// Patient gender.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

/// Persisted attributes of a patient; everything except the id.
///
/// `height` and `weight` default to zero when absent from a stored document
/// so that hand-edited files still load and sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientDetails {
    /// Full name.
    #[schema(example = "Ananya Verma")]
    pub name: String,
    /// City of residence.
    #[schema(example = "Guwahati")]
    pub city: String,
    /// Age in years, 1..=99.
    #[schema(example = 28)]
    pub age: u32,
    /// Gender.
    pub gender: Gender,
    /// Height in meters.
    #[serde(default)]
    #[schema(example = 1.65)]
    pub height: f64,
    /// Weight in kilograms.
    #[serde(default)]
    #[schema(example = 90.0)]
    pub weight: f64,
}

impl PatientDetails {
    /// Body-mass-index rounded to two decimals.
    pub fn bmi(&self) -> f64 {
        health::bmi(self.height, self.weight)
    }

    /// Weight-category verdict under `rule`.
    pub fn verdict(&self, rule: VerdictRule) -> Verdict {
        rule.classify(self.bmi())
    }

    /// Attach derived metrics.
    pub fn view(&self, rule: VerdictRule) -> PatientView {
        PatientView {
            details: self.clone(),
            bmi: self.bmi(),
            verdict: self.verdict(rule),
        }
    }
}

/// A validated patient: key plus persisted attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    /// Unique, immutable id.
    pub id: String,
    /// Persisted attributes.
    pub details: PatientDetails,
}

impl Patient {
    /// Create a patient from its parts.
    pub fn new(id: impl Into<String>, details: PatientDetails) -> Self {
        Self {
            id: id.into(),
            details,
        }
    }

    /// Attach derived metrics, keeping the id.
    pub fn record(&self, rule: VerdictRule) -> PatientRecord {
        PatientRecord {
            id: self.id.clone(),
            view: self.details.view(rule),
        }
    }
}

/// Patient attributes with derived metrics, as returned in the collection dump.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PatientView {
    /// Persisted attributes.
    #[serde(flatten)]
    pub details: PatientDetails,
    /// Body-mass-index.
    #[schema(example = 33.06)]
    pub bmi: f64,
    /// Weight category.
    pub verdict: Verdict,
}

/// A single patient with id and derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PatientRecord {
    /// Patient id.
    #[schema(example = "P001")]
    pub id: String,
    /// Attributes and derived metrics.
    #[serde(flatten)]
    pub view: PatientView,
}

/// Request body accepted by `POST /create`.
///
/// Only used to describe the body in the OpenAPI document; the handler
/// validates the raw JSON object so errors can name the offending field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPatient {
    /// Patient id.
    #[schema(example = "P001")]
    pub id: String,
    /// Persisted attributes.
    #[serde(flatten)]
    pub details: PatientDetails,
}

/// Request body accepted by `PUT /edit/{patient_id}`; every field optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PatientUpdate {
    /// New name.
    pub name: Option<String>,
    /// New city.
    pub city: Option<String>,
    /// New age.
    pub age: Option<u32>,
    /// New gender.
    pub gender: Option<Gender>,
    /// New height in meters.
    pub height: Option<f64>,
    /// New weight in kilograms.
    pub weight: Option<f64>,
}

//! In-memory patient collection keyed by id.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::StoreError;
use crate::patient::{Patient, PatientDetails, PatientView, VerdictRule};

/// Attribute a sorted view orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    /// Height in meters.
    Height,
    /// Weight in kilograms.
    Weight,
    /// Derived body-mass-index.
    Bmi,
}

impl SortKey {
    /// Accepted spellings, for error messages.
    pub const ALLOWED: &'static str = "height, weight, bmi";

    /// Parse a query value.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        Self::from_str(raw).map_err(|_| StoreError::InvalidArgument {
            param: "sort_by",
            value: raw.to_string(),
            allowed: Self::ALLOWED,
        })
    }

    /// Value of this attribute for `details`.
    pub fn value(self, details: &PatientDetails) -> f64 {
        match self {
            SortKey::Height => details.height,
            SortKey::Weight => details.weight,
            SortKey::Bmi => details.bmi(),
        }
    }
}

/// Direction of a sorted view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    /// Accepted spellings, for error messages.
    pub const ALLOWED: &'static str = "asc, desc";

    /// Parse a query value.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        Self::from_str(raw).map_err(|_| StoreError::InvalidArgument {
            param: "order",
            value: raw.to_string(),
            allowed: Self::ALLOWED,
        })
    }
}

/// All patients, keyed by id, in load/insertion order.
///
/// Serializes as a single JSON object `{id: details}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientCollection {
    entries: IndexMap<String, PatientDetails>,
}

impl PatientCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of patients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Iterate patients in load order.
    pub fn iter(&self) -> impl Iterator<Item = Patient> + '_ {
        self.entries
            .iter()
            .map(|(id, details)| Patient::new(id.clone(), details.clone()))
    }

    /// Look up a patient by id.
    pub fn get(&self, id: &str) -> Result<Patient, StoreError> {
        self.entries
            .get(id)
            .map(|details| Patient::new(id, details.clone()))
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Insert a new patient. The collection is untouched on `DuplicateId`.
    pub fn insert(&mut self, patient: Patient) -> Result<(), StoreError> {
        if self.entries.contains_key(&patient.id) {
            return Err(StoreError::DuplicateId { id: patient.id });
        }
        self.entries.insert(patient.id, patient.details);
        Ok(())
    }

    /// Replace the attributes of an existing patient in place.
    pub fn replace(&mut self, patient: Patient) -> Result<(), StoreError> {
        match self.entries.get_mut(&patient.id) {
            Some(details) => {
                *details = patient.details;
                Ok(())
            }
            None => Err(StoreError::NotFound { id: patient.id }),
        }
    }

    /// Remove a patient, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Result<Patient, StoreError> {
        self.entries
            .shift_remove(id)
            .map(|details| Patient::new(id, details))
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Patients ordered by `key`.
    ///
    /// The sort is stable in both directions: equal keys keep load order.
    pub fn sorted(&self, key: SortKey, order: SortOrder) -> Vec<Patient> {
        let mut patients: Vec<Patient> = self.iter().collect();
        patients.sort_by(|a, b| {
            let ordering = key.value(&a.details).total_cmp(&key.value(&b.details));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        patients
    }

    /// Every patient with derived metrics, keyed by id.
    pub fn views(&self, rule: VerdictRule) -> IndexMap<String, PatientView> {
        self.entries
            .iter()
            .map(|(id, details)| (id.clone(), details.view(rule)))
            .collect()
    }
}

impl FromIterator<Patient> for PatientCollection {
    /// Later duplicates overwrite earlier ones.
    fn from_iter<I: IntoIterator<Item = Patient>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|p| (p.id, p.details)).collect(),
        }
    }
}

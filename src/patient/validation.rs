//! Validation of raw JSON input into [`Patient`] values.
//!
//! Validation runs on the untyped JSON object rather than through a serde
//! derive so that every failure can name the field that caused it.

use std::str::FromStr;

use serde_json::{Map, Value};

use super::types::{Gender, Patient, PatientDetails};
use crate::error::ValidationError;

/// Exclusive lower bound on age.
pub const MIN_AGE_EXCLUSIVE: i64 = 0;
/// Exclusive upper bound on age.
pub const MAX_AGE_EXCLUSIVE: i64 = 100;

/// Fields a client may change through an update.
pub const MUTABLE_FIELDS: [&str; 6] = ["name", "city", "age", "gender", "height", "weight"];

/// Validate a request body that must be a JSON object.
pub fn validate_value(body: &Value) -> Result<Patient, ValidationError> {
    let fields = as_object(body)?;
    validate(fields)
}

/// Validate every field of a candidate patient.
///
/// Unknown keys are ignored.
pub fn validate(fields: &Map<String, Value>) -> Result<Patient, ValidationError> {
    let id = non_empty_string(fields, "id")?;
    let name = non_empty_string(fields, "name")?;
    let city = non_empty_string(fields, "city")?;
    let age = age(fields)?;
    let gender = gender(fields)?;
    let height = positive_float(fields, "height")?;
    let weight = positive_float(fields, "weight")?;

    Ok(Patient::new(
        id,
        PatientDetails {
            name,
            city,
            age,
            gender,
            height,
            weight,
        },
    ))
}

/// Merge `changes` over an existing patient and validate the result.
///
/// `changes` may hold any subset of [`MUTABLE_FIELDS`]; an `id` key is
/// rejected because ids are immutable.
pub fn apply_update(existing: &Patient, changes: &Value) -> Result<Patient, ValidationError> {
    let changes = as_object(changes)?;

    if changes.contains_key("id") {
        return Err(ValidationError::new("id", "is immutable and cannot be updated"));
    }

    let mut merged = match serde_json::to_value(&existing.details) {
        Ok(Value::Object(map)) => map,
        _ => return Err(ValidationError::new("body", "stored record is not an object")),
    };
    merged.insert("id".to_string(), Value::String(existing.id.clone()));

    for field in MUTABLE_FIELDS {
        if let Some(value) = changes.get(field) {
            merged.insert(field.to_string(), value.clone());
        }
    }

    validate(&merged)
}

/// Check a record read back from storage against the same field rules.
///
/// Missing `height`/`weight` load as zero, so zero is accepted there; a
/// negative or non-finite value is not.
pub fn validate_stored(details: &PatientDetails) -> Result<(), ValidationError> {
    for (field, value) in [("name", &details.name), ("city", &details.city)] {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "must not be empty"));
        }
    }

    let age = i64::from(details.age);
    if age <= MIN_AGE_EXCLUSIVE || age >= MAX_AGE_EXCLUSIVE {
        return Err(ValidationError::new(
            "age",
            format!("must be between {MIN_AGE_EXCLUSIVE} and {MAX_AGE_EXCLUSIVE} exclusive"),
        ));
    }

    for (field, value) in [("height", details.height), ("weight", details.weight)] {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::new(field, "must not be negative"));
        }
    }

    Ok(())
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object()
        .ok_or_else(|| ValidationError::new("body", "expected a JSON object"))
}

fn required<'a>(fields: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(field, "field required")),
        Some(value) => Ok(value),
    }
}

fn non_empty_string(fields: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    let value = required(fields, field)?
        .as_str()
        .ok_or_else(|| ValidationError::new(field, "must be a string"))?;

    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(value.to_string())
}

fn age(fields: &Map<String, Value>) -> Result<u32, ValidationError> {
    let value = required(fields, "age")?;

    let age = match value.as_i64() {
        Some(age) => age,
        None => match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => return Err(ValidationError::new("age", "must be an integer")),
        },
    };

    if age <= MIN_AGE_EXCLUSIVE {
        return Err(ValidationError::new(
            "age",
            format!("must be greater than {MIN_AGE_EXCLUSIVE}"),
        ));
    }
    if age >= MAX_AGE_EXCLUSIVE {
        return Err(ValidationError::new(
            "age",
            format!("must be less than {MAX_AGE_EXCLUSIVE}"),
        ));
    }

    u32::try_from(age).map_err(|_| ValidationError::new("age", "out of range"))
}

fn gender(fields: &Map<String, Value>) -> Result<Gender, ValidationError> {
    let raw = required(fields, "gender")?
        .as_str()
        .ok_or_else(|| ValidationError::new("gender", "must be a string"))?;

    Gender::from_str(raw)
        .map_err(|_| ValidationError::new("gender", "must be one of 'male', 'female'"))
}

fn positive_float(fields: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
    let value = required(fields, field)?
        .as_f64()
        .ok_or_else(|| ValidationError::new(field, "must be a number"))?;

    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be finite"));
    }
    if value <= 0.0 {
        return Err(ValidationError::new(field, "must be greater than 0"));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "id": "P001",
            "name": "Ananya Verma",
            "city": "Guwahati",
            "age": 28,
            "gender": "female",
            "height": 1.65,
            "weight": 90.0,
        })
    }

    fn field_error(body: Value) -> String {
        validate_value(&body).unwrap_err().field
    }

    fn with(field: &str, value: Value) -> Value {
        let mut body = valid_body();
        body[field] = value;
        body
    }

    fn without(field: &str) -> Value {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove(field);
        body
    }

    #[test]
    fn accepts_valid_patient() {
        let patient = validate_value(&valid_body()).unwrap();
        assert_eq!(patient.id, "P001");
        assert_eq!(patient.details.age, 28);
        assert_eq!(patient.details.gender, Gender::Female);
        assert_eq!(patient.details.bmi(), 33.06);
    }

    #[test]
    fn missing_fields_are_named() {
        for field in ["id", "name", "city", "age", "gender", "height", "weight"] {
            assert_eq!(field_error(without(field)), field);
        }
        assert_eq!(field_error(with("name", Value::Null)), "name");
    }

    #[test]
    fn wrong_types_are_named() {
        assert_eq!(field_error(with("id", json!(1))), "id");
        assert_eq!(field_error(with("age", json!("28"))), "age");
        assert_eq!(field_error(with("age", json!(28.5))), "age");
        assert_eq!(field_error(with("height", json!("tall"))), "height");
        assert_eq!(field_error(with("gender", json!(true))), "gender");
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert_eq!(field_error(with("name", json!(""))), "name");
        assert_eq!(field_error(with("city", json!("   "))), "city");
    }

    #[test]
    fn age_bounds_are_exclusive() {
        assert_eq!(field_error(with("age", json!(0))), "age");
        assert_eq!(field_error(with("age", json!(100))), "age");
        assert_eq!(field_error(with("age", json!(-3))), "age");
        assert!(validate_value(&with("age", json!(1))).is_ok());
        assert!(validate_value(&with("age", json!(99))).is_ok());
        assert_eq!(
            validate_value(&with("age", json!(42.0))).unwrap().details.age,
            42
        );
    }

    #[test]
    fn gender_outside_set_is_rejected() {
        assert_eq!(field_error(with("gender", json!("other"))), "gender");
        assert_eq!(field_error(with("gender", json!("Female"))), "gender");
    }

    #[test]
    fn measurements_must_be_positive() {
        assert_eq!(field_error(with("height", json!(0))), "height");
        assert_eq!(field_error(with("weight", json!(-70.0))), "weight");
        assert!(validate_value(&with("height", json!(2))).is_ok());
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert_eq!(field_error(json!([1, 2, 3])), "body");
    }

    #[test]
    fn update_merges_and_revalidates() {
        let existing = validate_value(&valid_body()).unwrap();

        let updated = apply_update(&existing, &json!({"weight": 60.0, "city": "Delhi"})).unwrap();
        assert_eq!(updated.id, "P001");
        assert_eq!(updated.details.city, "Delhi");
        assert_eq!(updated.details.weight, 60.0);
        assert_eq!(updated.details.name, "Ananya Verma");

        let err = apply_update(&existing, &json!({"age": 150})).unwrap_err();
        assert_eq!(err.field, "age");

        let err = apply_update(&existing, &json!({"id": "P002"})).unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn stored_records_follow_field_rules() {
        let patient = validate_value(&valid_body()).unwrap();
        assert_eq!(validate_stored(&patient.details), Ok(()));

        let mut unmeasured = patient.details.clone();
        unmeasured.height = 0.0;
        unmeasured.weight = 0.0;
        assert_eq!(validate_stored(&unmeasured), Ok(()));

        let mut blank = patient.details.clone();
        blank.city = "  ".into();
        assert_eq!(validate_stored(&blank).unwrap_err().field, "city");

        let mut old = patient.details.clone();
        old.age = 100;
        assert_eq!(validate_stored(&old).unwrap_err().field, "age");

        let mut negative = patient.details;
        negative.weight = -70.0;
        assert_eq!(validate_stored(&negative).unwrap_err().field, "weight");
    }
}

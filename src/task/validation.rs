use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use super::schema::{is_schema_field, is_timestamp_field, FieldFormat, FieldType, TASK_FIELDS};

/// Field name -> error message. Empty means the candidate is valid.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every required, client-supplied field must be present
    Create,
    /// Partial update: only supplied fields are checked
    Modify,
}

/// A key outside the schema carrying a non-string value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Arbitrary attribute '{key}' must be a string.")]
pub struct ExtensionFieldError {
    pub key: String,
}

/// Check a candidate document against the task schema.
///
/// Each field keeps at most one message: when several rules fail on the same
/// field, the last rule checked wins.
pub fn validate(candidate: &Map<String, Value>, mode: ValidationMode) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for spec in TASK_FIELDS {
        let Some(value) = candidate.get(spec.name) else {
            if mode == ValidationMode::Create && spec.required && !spec.server_assigned {
                errors.insert(
                    spec.name.to_string(),
                    format!("'{}' is a required field.", spec.name),
                );
            }
            continue;
        };

        if !spec.field_type.matches(value) {
            errors.insert(
                spec.name.to_string(),
                format!(
                    "'{}' must be of type {}, but got {}.",
                    spec.name,
                    spec.field_type,
                    FieldType::of(value)
                ),
            );
        }

        match spec.format {
            Some(FieldFormat::CalendarDate) => {
                let valid = value.as_str().map(is_calendar_date).unwrap_or(false);
                if !valid {
                    errors.insert(
                        spec.name.to_string(),
                        format!("'{}' must be in YYYY-MM-DD format.", spec.name),
                    );
                }
            }
            None => {}
        }
    }

    errors
}

/// Reject the first key that is neither a schema field nor a server timestamp
/// and whose value is not a string.
pub fn check_extension_fields(document: &Map<String, Value>) -> Result<(), ExtensionFieldError> {
    match document
        .iter()
        .find(|(key, value)| !is_schema_field(key) && !is_timestamp_field(key) && !value.is_string())
    {
        Some((key, _)) => Err(ExtensionFieldError { key: key.clone() }),
        None => Ok(()),
    }
}

/// Strict `YYYY-MM-DD`: zero padded, exactly ten characters, a real calendar day
pub fn is_calendar_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 4 && *i != 7)
        .all(|(_, b)| b.is_ascii_digit());

    digits_ok && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

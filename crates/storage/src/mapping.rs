//! Wire conversion between domain types and remote field maps.
//!
//! On the wire, tri-state flags are 0/1 integers (absent when never
//! written), timestamps are RFC 3339 strings, and credential fields are
//! named `password`, `salt`, and `reg_date`. Domain types never see that
//! encoding; it begins and ends here.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use revise_core::model::{PointKey, ProgressPoint, SubjectId, UserRecord};

use crate::store::{Document, FieldMap};

pub const FIELD_SUBJECT_ID: &str = "subject_id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_IS_MASTERED: &str = "is_mastered";
pub const FIELD_IS_DIFFICULT: &str = "is_difficult";
pub const FIELD_UPDATE_AT: &str = "update_at";

pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_SALT: &str = "salt";
pub const FIELD_REG_DATE: &str = "reg_date";
pub const FIELD_USER_COUNT: &str = "user_count";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MappingError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid value in field {0}")]
    InvalidField(&'static str),
}

/// Partial field map for a progress push.
///
/// Only the flags the caller actually supplied are encoded, so a merge
/// write leaves the other flag untouched on the remote record.
#[must_use]
pub fn progress_update_fields(
    key: &PointKey,
    mastered: Option<bool>,
    difficult: Option<bool>,
    updated_at: DateTime<Utc>,
) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(
        FIELD_SUBJECT_ID.to_string(),
        Value::from(key.subject().as_str()),
    );
    fields.insert(FIELD_TITLE.to_string(), Value::from(key.title()));
    fields.insert(
        FIELD_UPDATE_AT.to_string(),
        Value::from(updated_at.to_rfc3339()),
    );
    if let Some(flag) = mastered {
        fields.insert(FIELD_IS_MASTERED.to_string(), flag_to_wire(flag));
    }
    if let Some(flag) = difficult {
        fields.insert(FIELD_IS_DIFFICULT.to_string(), flag_to_wire(flag));
    }
    fields
}

/// Decode one scanned progress document.
///
/// Flags decode tolerantly (integer 0/1, boolean, or absent). A missing or
/// unparseable timestamp decodes to the epoch; pull folding only reads the
/// flags, so a bad timestamp must not invalidate the record.
///
/// # Errors
///
/// Returns `MappingError` if the subject or title is missing or invalid.
pub fn progress_from_document(doc: &Document) -> Result<ProgressPoint, MappingError> {
    let subject = required_str(&doc.fields, FIELD_SUBJECT_ID)?;
    let subject =
        SubjectId::new(subject).map_err(|_| MappingError::InvalidField(FIELD_SUBJECT_ID))?;
    let title = required_str(&doc.fields, FIELD_TITLE)?;

    let updated_at = doc
        .fields
        .get(FIELD_UPDATE_AT)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map_or(DateTime::UNIX_EPOCH, |t| t.with_timezone(&Utc));

    let mut point = ProgressPoint::new(PointKey::new(subject, title), updated_at);
    point.mastered = wire_to_flag(doc.fields.get(FIELD_IS_MASTERED));
    point.difficult = wire_to_flag(doc.fields.get(FIELD_IS_DIFFICULT));
    Ok(point)
}

/// Encode a credential record for storage.
#[must_use]
pub fn user_record_fields(record: &UserRecord) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(
        FIELD_PASSWORD.to_string(),
        Value::from(record.secret_hash.as_str()),
    );
    fields.insert(FIELD_SALT.to_string(), Value::from(record.salt.as_str()));
    fields.insert(
        FIELD_REG_DATE.to_string(),
        Value::from(record.registered_at.to_rfc3339()),
    );
    fields
}

/// Decode a stored credential record.
///
/// # Errors
///
/// Returns `MappingError` if a required field is missing or invalid.
pub fn user_record_from_fields(fields: &FieldMap) -> Result<UserRecord, MappingError> {
    let secret_hash = required_str(fields, FIELD_PASSWORD)?.to_string();
    let salt = required_str(fields, FIELD_SALT)?.to_string();
    let registered_at = required_str(fields, FIELD_REG_DATE)?;
    let registered_at = DateTime::parse_from_rfc3339(registered_at)
        .map_err(|_| MappingError::InvalidField(FIELD_REG_DATE))?
        .with_timezone(&Utc);

    Ok(UserRecord {
        secret_hash,
        salt,
        registered_at,
    })
}

/// Decode the global stats counter; an absent field reads as zero.
#[must_use]
pub fn user_count_from_fields(fields: &FieldMap) -> i64 {
    fields
        .get(FIELD_USER_COUNT)
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

fn flag_to_wire(flag: bool) -> Value {
    Value::from(i64::from(flag))
}

fn wire_to_flag(value: Option<&Value>) -> Option<bool> {
    match value {
        Some(Value::Number(n)) => n.as_i64().map(|v| v == 1),
        Some(Value::Bool(b)) => Some(*b),
        _ => None,
    }
}

fn required_str<'a>(fields: &'a FieldMap, name: &'static str) -> Result<&'a str, MappingError> {
    fields
        .get(name)
        .ok_or(MappingError::MissingField(name))?
        .as_str()
        .ok_or(MappingError::InvalidField(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::time::fixed_now;
    use serde_json::json;

    fn key(subject: &str, title: &str) -> PointKey {
        PointKey::new(SubjectId::new(subject).unwrap(), title)
    }

    #[test]
    fn push_fields_include_only_supplied_flags() {
        let fields = progress_update_fields(&key("math", "X"), Some(true), None, fixed_now());
        assert_eq!(fields.get(FIELD_IS_MASTERED), Some(&json!(1)));
        assert!(!fields.contains_key(FIELD_IS_DIFFICULT));
        assert_eq!(fields.get(FIELD_SUBJECT_ID), Some(&json!("math")));
        assert_eq!(fields.get(FIELD_TITLE), Some(&json!("X")));
        assert!(fields.contains_key(FIELD_UPDATE_AT));
    }

    #[test]
    fn flags_coerce_to_zero_and_one() {
        let fields =
            progress_update_fields(&key("math", "X"), Some(false), Some(true), fixed_now());
        assert_eq!(fields.get(FIELD_IS_MASTERED), Some(&json!(0)));
        assert_eq!(fields.get(FIELD_IS_DIFFICULT), Some(&json!(1)));
    }

    #[test]
    fn round_trips_through_a_document() {
        let fields = progress_update_fields(&key("math", "X"), Some(true), Some(false), fixed_now());
        let doc = Document {
            id: key("math", "X").doc_id(),
            fields,
        };

        let point = progress_from_document(&doc).unwrap();
        assert_eq!(point.key.key(), "math_X");
        assert_eq!(point.mastered, Some(true));
        assert_eq!(point.difficult, Some(false));
        assert_eq!(point.updated_at, fixed_now());
    }

    #[test]
    fn absent_flags_decode_as_unset() {
        let mut fields = FieldMap::new();
        fields.insert(FIELD_SUBJECT_ID.into(), json!("math"));
        fields.insert(FIELD_TITLE.into(), json!("X"));
        let doc = Document {
            id: "d".into(),
            fields,
        };

        let point = progress_from_document(&doc).unwrap();
        assert_eq!(point.mastered, None);
        assert_eq!(point.difficult, None);
        assert_eq!(point.updated_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn missing_subject_is_rejected() {
        let mut fields = FieldMap::new();
        fields.insert(FIELD_TITLE.into(), json!("X"));
        let doc = Document {
            id: "d".into(),
            fields,
        };

        assert_eq!(
            progress_from_document(&doc),
            Err(MappingError::MissingField(FIELD_SUBJECT_ID))
        );
    }

    #[test]
    fn credential_record_round_trips() {
        let record = UserRecord::new("hunter22", "salt-a", fixed_now());
        let fields = user_record_fields(&record);
        let decoded = user_record_from_fields(&fields).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn user_count_defaults_to_zero() {
        assert_eq!(user_count_from_fields(&FieldMap::new()), 0);
        let mut fields = FieldMap::new();
        fields.insert(FIELD_USER_COUNT.into(), json!(7));
        assert_eq!(user_count_from_fields(&fields), 7);
    }
}

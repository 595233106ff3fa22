//! Version snapshots and their stored form.

use crate::error::{CoreError, CoreResult};
use crate::types::{fields, now_millis, Status, VersionKey, DEFAULT_LOCALE};
use polydoc_storage::{Fields, Record, RecordId, Value};
use serde::{Deserialize, Serialize};

/// Identifier of a version snapshot.
pub type VersionId = RecordId;

/// An immutable snapshot of one document in one locale.
///
/// Only `status` changes after creation, and only through the version
/// store's transition operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// Globally unique identifier.
    pub id: VersionId,
    /// Logical document identifier.
    pub document_id: String,
    /// Schema the document belongs to.
    pub schema_name: String,
    /// Locale tag.
    pub locale: String,
    /// Position in the (document, schema, locale) history, starting at 1.
    pub version_number: u64,
    /// Lifecycle status.
    pub status: Status,
    /// Document field values at snapshot time.
    pub data: Fields,
    /// Creation time (unix millis).
    pub created_at: u64,
    /// Creating user.
    pub created_by: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl Version {
    /// Returns the partition this version belongs to.
    pub fn key(&self) -> VersionKey {
        VersionKey::new(&self.document_id, &self.schema_name, &self.locale)
    }

    /// Encodes this version as a storage record.
    pub fn to_record(&self) -> Record {
        let mut record = Record::with_id(self.id);
        record
            .set(fields::DOCUMENT_ID, self.document_id.as_str())
            .set(fields::SCHEMA_NAME, self.schema_name.as_str())
            .set(fields::LOCALE, self.locale.as_str())
            .set(fields::VERSION_NUMBER, to_integer(self.version_number))
            .set(fields::STATUS, self.status)
            .set(fields::DATA, self.data.clone())
            .set(fields::CREATED_AT, to_integer(self.created_at));
        if let Some(by) = &self.created_by {
            record.set(fields::CREATED_BY, by.as_str());
        }
        if let Some(notes) = &self.notes {
            record.set(fields::NOTES, notes.as_str());
        }
        record
    }
}

impl TryFrom<Record> for Version {
    type Error = CoreError;

    fn try_from(record: Record) -> CoreResult<Self> {
        let id = record.id();
        let mut stored = record.into_fields();

        let data = match stored.remove(fields::DATA) {
            Some(Value::Map(data)) => data,
            None | Some(Value::Null) => Fields::new(),
            Some(other) => {
                return Err(CoreError::malformed_record(format!(
                    "version {id}: data must be a map, got {other:?}"
                )))
            }
        };

        let version_number = required_integer(&stored, id, fields::VERSION_NUMBER)?;
        if version_number == 0 {
            return Err(CoreError::malformed_record(format!(
                "version {id}: version numbers start at 1"
            )));
        }

        Ok(Self {
            id,
            document_id: required_text(&stored, id, fields::DOCUMENT_ID)?,
            schema_name: required_text(&stored, id, fields::SCHEMA_NAME)?,
            locale: required_text(&stored, id, fields::LOCALE)?,
            version_number,
            status: required_text(&stored, id, fields::STATUS)?.parse()?,
            data,
            created_at: match stored.get(fields::CREATED_AT) {
                Some(_) => required_integer(&stored, id, fields::CREATED_AT)?,
                None => 0,
            },
            created_by: optional_text(&stored, fields::CREATED_BY),
            notes: optional_text(&stored, fields::NOTES),
        })
    }
}

fn required_text(fields: &Fields, id: RecordId, name: &str) -> CoreResult<String> {
    fields
        .get(name)
        .and_then(Value::as_text)
        .map(str::to_string)
        .ok_or_else(|| CoreError::malformed_record(format!("version {id}: {name} must be text")))
}

fn required_integer(fields: &Fields, id: RecordId, name: &str) -> CoreResult<u64> {
    fields
        .get(name)
        .and_then(Value::as_integer)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| {
            CoreError::malformed_record(format!("version {id}: {name} must be a non-negative integer"))
        })
}

fn optional_text(fields: &Fields, name: &str) -> Option<String> {
    fields.get(name).and_then(Value::as_text).map(str::to_string)
}

fn to_integer(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Parameters of a version to create.
///
/// Defaults: status `draft`, locale `en`, no author, no notes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct NewVersion {
    /// Logical document identifier.
    pub document_id: String,
    /// Schema the document belongs to.
    pub schema_name: String,
    /// Document field values to snapshot.
    pub data: Fields,
    /// Initial status.
    pub status: Status,
    /// Creating user.
    pub created_by: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Locale tag.
    pub locale: String,
}

impl NewVersion {
    /// Starts a draft snapshot of `data` in the default locale.
    pub fn new(document_id: impl Into<String>, schema_name: impl Into<String>, data: Fields) -> Self {
        Self {
            document_id: document_id.into(),
            schema_name: schema_name.into(),
            data,
            status: Status::Draft,
            created_by: None,
            notes: None,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Sets the initial status.
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Sets the creating user.
    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = Some(user.into());
        self
    }

    /// Sets the notes.
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Returns the partition the new version will join.
    pub fn key(&self) -> VersionKey {
        VersionKey::new(&self.document_id, &self.schema_name, &self.locale)
    }

    pub(crate) fn into_version(self, version_number: u64) -> Version {
        Version {
            id: VersionId::new(),
            document_id: self.document_id,
            schema_name: self.schema_name,
            locale: self.locale,
            version_number,
            status: self.status,
            data: self.data,
            created_at: now_millis(),
            created_by: self.created_by,
            notes: self.notes,
        }
    }
}

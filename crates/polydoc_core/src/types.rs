//! Core type definitions for polydoc.

use crate::error::CoreError;
use polydoc_storage::{Filter, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Locale used when a schema has no localization configured.
pub const DEFAULT_LOCALE: &str = "en";

/// Stored field names shared by document rows and version snapshots.
pub mod fields {
    /// Logical document identifier shared by all locale/status rows.
    pub const DOCUMENT_ID: &str = "documentId";
    /// Locale tag of a row or version.
    pub const LOCALE: &str = "locale";
    /// Lifecycle status of a row or version.
    pub const STATUS: &str = "status";
    /// Time a row was published.
    pub const PUBLISHED_AT: &str = "publishedAt";
    /// Creation time (unix millis).
    pub const CREATED_AT: &str = "createdAt";
    /// Last update time (unix millis).
    pub const UPDATED_AT: &str = "updatedAt";
    /// Creating user.
    pub const CREATED_BY: &str = "createdBy";
    /// Last updating user.
    pub const UPDATED_BY: &str = "updatedBy";
    /// Schema a version belongs to.
    pub const SCHEMA_NAME: &str = "schemaName";
    /// Version number within (document, schema, locale).
    pub const VERSION_NUMBER: &str = "versionNumber";
    /// Snapshot payload of a version.
    pub const DATA: &str = "data";
    /// Free-form notes on a version.
    pub const NOTES: &str = "notes";

    /// Fields owned by the store rather than by a schema.
    ///
    /// These never take part in uniqueness partitioning.
    pub const SYSTEM: &[&str] = &[
        polydoc_storage::ID_FIELD,
        DOCUMENT_ID,
        LOCALE,
        STATUS,
        PUBLISHED_AT,
        CREATED_AT,
        UPDATED_AT,
        CREATED_BY,
        UPDATED_BY,
    ];

    /// Returns true if `name` is a system field.
    pub fn is_system(name: &str) -> bool {
        SYSTEM.contains(&name)
    }
}

/// Lifecycle status of a document row or version.
///
/// Versions move strictly forward: `draft -> published -> archived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Work in progress.
    Draft,
    /// Live.
    Published,
    /// Retired; terminal.
    Archived,
}

impl Status {
    /// Returns the stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
            Status::Archived => "archived",
        }
    }

    /// Returns true if a version may move from `self` to `next`.
    ///
    /// No state may be skipped and `archived` is terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Draft, Status::Published) | (Status::Published, Status::Archived)
        )
    }

    /// Returns a filter matching this status.
    pub fn filter(self) -> Filter {
        Filter::eq(fields::STATUS, self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            "archived" => Ok(Status::Archived),
            other => Err(CoreError::malformed_record(format!("unknown status {other:?}"))),
        }
    }
}

impl From<Status> for Value {
    fn from(status: Status) -> Self {
        Value::from(status.as_str())
    }
}

/// The partition that version numbering and retention operate on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKey {
    /// Logical document identifier.
    pub document_id: String,
    /// Schema (collection type) name.
    pub schema_name: String,
    /// Locale tag.
    pub locale: String,
}

impl VersionKey {
    /// Creates a new version key.
    pub fn new(
        document_id: impl Into<String>,
        schema_name: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            schema_name: schema_name.into(),
            locale: locale.into(),
        }
    }

    /// Returns a filter matching every version in this partition.
    pub fn filter(&self) -> Filter {
        Filter::all_of([
            Filter::eq(fields::DOCUMENT_ID, self.document_id.as_str()),
            Filter::eq(fields::SCHEMA_NAME, self.schema_name.as_str()),
            Filter::eq(fields::LOCALE, self.locale.as_str()),
        ])
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.schema_name, self.document_id, self.locale)
    }
}

/// Returns the current time in unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydoc_storage::Record;

    #[test]
    fn status_round_trips_through_text() {
        for status in [Status::Draft, Status::Published, Status::Archived] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("deleted".parse::<Status>().is_err());
    }

    #[test]
    fn status_transitions() {
        assert!(Status::Draft.can_transition_to(Status::Published));
        assert!(Status::Published.can_transition_to(Status::Archived));
        assert!(!Status::Draft.can_transition_to(Status::Archived));
        assert!(!Status::Archived.can_transition_to(Status::Draft));
        assert!(!Status::Archived.can_transition_to(Status::Published));
        assert!(!Status::Published.can_transition_to(Status::Draft));
    }

    #[test]
    fn version_key_filter() {
        let key = VersionKey::new("doc-1", "post", "en");
        let hit = Record::new()
            .with(fields::DOCUMENT_ID, "doc-1")
            .with(fields::SCHEMA_NAME, "post")
            .with(fields::LOCALE, "en");
        let miss = hit.clone().with(fields::LOCALE, "fr");
        assert!(key.filter().matches(&hit));
        assert!(!key.filter().matches(&miss));
        assert_eq!(key.to_string(), "post/doc-1/en");
    }

    #[test]
    fn system_fields() {
        assert!(fields::is_system("documentId"));
        assert!(fields::is_system("id"));
        assert!(!fields::is_system("slug"));
    }
}

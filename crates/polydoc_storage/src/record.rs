//! Records and record identifiers.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Reserved field name under which a record's identifier is addressable
/// in filters, sorts and projections.
pub const ID_FIELD: &str = "id";

/// Named field values of a record.
pub type Fields = BTreeMap<String, Value>;

/// Unique identifier for a stored record.
///
/// Record IDs are UUIDs that are:
/// - Globally unique within a store
/// - Immutable once assigned
/// - Rendered as hyphenated text when used as a field value
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a record ID from its text form.
    ///
    /// Returns `None` if the text is not a structurally valid UUID.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }

    /// Converts to a UUID.
    #[must_use]
    pub const fn to_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the identifier as a field value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Text(self.0.to_string())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = crate::StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::StorageError::invalid_id(s))
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

/// A stored record: an identifier plus named field values.
///
/// Missing fields read as [`Value::Null`]. The `id` field is virtual; it
/// is never part of [`Record::fields`] and cannot be overwritten by a
/// patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    #[serde(default)]
    fields: Fields,
}

impl Record {
    /// Creates an empty record with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(RecordId::new())
    }

    /// Creates an empty record with the given identifier.
    #[must_use]
    pub fn with_id(id: RecordId) -> Self {
        Self {
            id,
            fields: Fields::new(),
        }
    }

    /// Creates a record with a fresh identifier from existing fields.
    ///
    /// A stray `id` entry in `fields` is discarded.
    #[must_use]
    pub fn from_fields(mut fields: Fields) -> Self {
        fields.remove(ID_FIELD);
        Self {
            id: RecordId::new(),
            fields,
        }
    }

    /// Returns the record identifier.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the value of a field, or `None` if it is not set.
    ///
    /// Use [`Record::field`] to address the virtual `id` field as well.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the value of a field, including the virtual `id` field.
    ///
    /// Missing fields read as `Null`.
    pub fn field(&self, name: &str) -> Cow<'_, Value> {
        if name == ID_FIELD {
            return Cow::Owned(self.id.to_value());
        }
        match self.fields.get(name) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(Value::Null),
        }
    }

    /// Returns the text value of a field, if it is text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_text)
    }

    /// Sets a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        if name != ID_FIELD {
            self.fields.insert(name, value.into());
        }
        self
    }

    /// Sets a field value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Returns all stored fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns mutable access to all stored fields.
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Consumes the record, returning its fields.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Merges a patch into this record. Patch entries overwrite existing
    /// fields; an `id` entry in the patch is ignored.
    pub fn merge(&mut self, patch: &Fields) {
        for (name, value) in patch {
            if name != ID_FIELD {
                self.fields.insert(name.clone(), value.clone());
            }
        }
    }

    /// Returns a copy of this record restricted to the given fields.
    ///
    /// The identifier is always kept.
    #[must_use]
    pub fn project(&self, names: &[String]) -> Record {
        let fields = names
            .iter()
            .filter_map(|n| self.fields.get(n).map(|v| (n.clone(), v.clone())))
            .collect();
        Record {
            id: self.id,
            fields,
        }
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

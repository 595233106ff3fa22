//! Field-level comparison of version payloads.

use polydoc_storage::{Fields, Value};
use serde::Serialize;

/// One top-level field difference between two payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum FieldChange {
    /// Present only in the newer payload.
    Added {
        /// Field name.
        field: String,
        /// New value.
        value: Value,
    },
    /// Present only in the older payload.
    Removed {
        /// Field name.
        field: String,
        /// Old value.
        value: Value,
    },
    /// Present in both with different values.
    Changed {
        /// Field name.
        field: String,
        /// Old value.
        from: Value,
        /// New value.
        to: Value,
    },
}

impl FieldChange {
    /// Returns the field this change concerns.
    pub fn field(&self) -> &str {
        match self {
            FieldChange::Added { field, .. }
            | FieldChange::Removed { field, .. }
            | FieldChange::Changed { field, .. } => field,
        }
    }
}

/// Lists the differences from `old` to `new`, ordered by field name.
pub fn compare(old: &Fields, new: &Fields) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    for (field, before) in old {
        match new.get(field) {
            None => changes.push(FieldChange::Removed {
                field: field.clone(),
                value: before.clone(),
            }),
            Some(after) if after != before => changes.push(FieldChange::Changed {
                field: field.clone(),
                from: before.clone(),
                to: after.clone(),
            }),
            Some(_) => {}
        }
    }
    for (field, after) in new {
        if !old.contains_key(field) {
            changes.push(FieldChange::Added {
                field: field.clone(),
                value: after.clone(),
            });
        }
    }
    changes.sort_by(|a, b| a.field().cmp(b.field()));
    changes
}

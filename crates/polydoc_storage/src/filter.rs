//! Filters, sort specifications and find options.

use crate::error::{StorageError, StorageResult};
use crate::record::{Record, RecordId, ID_FIELD};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A predicate over records.
///
/// Equality treats a missing field as `Null`. Range operators only match
/// values of the same kind as the operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches every record.
    All,
    /// Field equals value.
    Eq(String, Value),
    /// Field does not equal value.
    Ne(String, Value),
    /// Field equals one of the values.
    In(String, Vec<Value>),
    /// Field is greater than value.
    Gt(String, Value),
    /// Field is greater than or equal to value.
    Gte(String, Value),
    /// Field is less than value.
    Lt(String, Value),
    /// Field is less than or equal to value.
    Lte(String, Value),
    /// Field is (or is not) present with a non-null value.
    Exists(String, bool),
    /// All sub-filters match.
    And(Vec<Filter>),
    /// At least one sub-filter matches.
    Or(Vec<Filter>),
}

impl Filter {
    /// Field equals value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// Field does not equal value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    /// Field equals one of the values.
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Field is greater than value.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt(field.into(), value.into())
    }

    /// Field is greater than or equal to value.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(field.into(), value.into())
    }

    /// Field is less than value.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(field.into(), value.into())
    }

    /// Field is less than or equal to value.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte(field.into(), value.into())
    }

    /// Field is present with a non-null value.
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists(field.into(), true)
    }

    /// Matches records by identifier.
    pub fn id(id: RecordId) -> Self {
        Self::Eq(ID_FIELD.to_string(), id.to_value())
    }

    /// Conjunction of two filters, flattening nested `And`s and dropping `All`.
    #[must_use]
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, Filter::And(mut b)) => {
                b.insert(0, f);
                Filter::And(b)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Conjunction of many filters.
    pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Filter {
        filters.into_iter().fold(Filter::All, Filter::and)
    }

    /// Evaluates this filter against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => *record.field(field) == *value,
            Filter::Ne(field, value) => *record.field(field) != *value,
            Filter::In(field, values) => {
                let actual = record.field(field);
                values.iter().any(|v| *actual == *v)
            }
            Filter::Gt(field, value) => compare(record, field, value) == Some(Ordering::Greater),
            Filter::Gte(field, value) => matches!(
                compare(record, field, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(field, value) => compare(record, field, value) == Some(Ordering::Less),
            Filter::Lte(field, value) => matches!(
                compare(record, field, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::Exists(field, expected) => !record.field(field).is_null() == *expected,
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }

    /// Checks that every identifier operand in this filter is structurally
    /// valid.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidId`] for the first operand on the `id`
    /// field that is not a parseable record identifier.
    pub fn validate_ids(&self) -> StorageResult<()> {
        match self {
            Filter::Eq(field, value)
            | Filter::Ne(field, value)
            | Filter::Gt(field, value)
            | Filter::Gte(field, value)
            | Filter::Lt(field, value)
            | Filter::Lte(field, value)
                if field == ID_FIELD =>
            {
                check_id(value)
            }
            Filter::In(field, values) if field == ID_FIELD => values.iter().try_for_each(check_id),
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().try_for_each(Filter::validate_ids)
            }
            _ => Ok(()),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

fn compare(record: &Record, field: &str, value: &Value) -> Option<Ordering> {
    let actual = record.field(field);
    if actual.same_kind(value) {
        Some((*actual).cmp(value))
    } else {
        None
    }
}

fn check_id(value: &Value) -> StorageResult<()> {
    match value {
        Value::Text(text) if RecordId::parse(text).is_some() => Ok(()),
        Value::Text(text) => Err(StorageError::invalid_id(text.clone())),
        other => Err(StorageError::invalid_id(format!("{other:?}"))),
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec(Vec<(String, SortOrder)>);

impl SortSpec {
    /// Sort ascending by one field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self(vec![(field.into(), SortOrder::Ascending)])
    }

    /// Sort descending by one field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self(vec![(field.into(), SortOrder::Descending)])
    }

    /// Adds a secondary key.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.0.push((field.into(), order));
        self
    }

    /// Returns the sort keys.
    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.0
    }

    /// Returns true if no sort key is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compares two records under this specification.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for (field, order) in &self.0 {
            let (x, y) = (a.field(field), b.field(field));
            let ord = (*x).cmp(&*y);
            let ord = match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Options for a find call: filter, sort, pagination and projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Which records to return.
    pub filter: Filter,
    /// Result ordering; insertion order when empty.
    pub sort: SortSpec,
    /// Maximum number of records to return.
    pub limit: Option<u64>,
    /// Number of matching records to skip.
    pub skip: Option<u64>,
    /// Fields to keep; all fields when `None`.
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    /// Creates options matching the given filter.
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Sets the sort specification.
    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the maximum number of records.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of records to skip.
    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the projection.
    #[must_use]
    pub fn projection(mut self, fields: Vec<String>) -> Self {
        self.projection = Some(fields);
        self
    }
}

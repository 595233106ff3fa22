//! Locale resolution for localized fields.
//!
//! A localized field is stored as a map from locale tag to value, e.g.
//! `{"en": "Hello", "fr": "Bonjour"}`. Reading it under a locale returns
//! that locale's value, falling back to the schema's default locale, and
//! finally to the field kind's zero value.

use crate::error::{CoreError, CoreResult};
use crate::schema::{FieldKind, SchemaDescriptor};
use polydoc_storage::{Fields, Record, Value};
use std::collections::BTreeSet;

/// Resolves a stored field value for `requested`.
///
/// - A locale map yields `map[requested]`, else `map[default]`, else
///   `kind.zero()`. Null entries count as absent.
/// - `Null` yields `kind.zero()`.
/// - Any other value is already single-locale and is returned as-is.
pub fn resolve(value: &Value, requested: &str, default: &str, kind: FieldKind) -> Value {
    match value {
        Value::Map(by_locale) => by_locale
            .get(requested)
            .filter(|v| !v.is_null())
            .or_else(|| by_locale.get(default).filter(|v| !v.is_null()))
            .cloned()
            .unwrap_or_else(|| kind.zero()),
        Value::Null => kind.zero(),
        other => other.clone(),
    }
}

/// Returns the locale every document of `schema` must be complete in.
pub fn schema_default_locale(schema: &SchemaDescriptor) -> &str {
    schema.default_locale()
}

/// A read view of one record under an active locale.
///
/// The active locale belongs to the view, not to the schema, so views of
/// different documents never interfere.
#[derive(Debug, Clone)]
pub struct LocaleContext<'a> {
    record: &'a Record,
    schema: &'a SchemaDescriptor,
    locale: String,
}

impl<'a> LocaleContext<'a> {
    /// Creates a view in the schema's default locale.
    pub fn new(record: &'a Record, schema: &'a SchemaDescriptor) -> Self {
        Self {
            record,
            schema,
            locale: schema.default_locale().to_string(),
        }
    }

    /// Returns a view of the same record under `locale`.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Returns the active locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Reads a field under the active locale.
    ///
    /// Localized fields are resolved with default-locale fallback; other
    /// fields are returned as stored (`Null` when missing).
    pub fn get(&self, field: &str) -> Value {
        let raw = self.record.field(field);
        match self.schema.field(field) {
            Some(descriptor) if descriptor.localized => resolve(
                &raw,
                &self.locale,
                self.schema.default_locale(),
                descriptor.kind,
            ),
            _ => raw.into_owned(),
        }
    }

    /// Returns every stored field with localized fields resolved, plus
    /// any schema field the record lacks set to its zero value when
    /// localized.
    pub fn resolved_fields(&self) -> Fields {
        let mut out: Fields = self
            .record
            .fields()
            .keys()
            .map(|name| (name.clone(), self.get(name)))
            .collect();
        for descriptor in self.schema.fields.iter().filter(|f| f.localized) {
            out.entry(descriptor.name.clone())
                .or_insert_with(|| descriptor.kind.zero());
        }
        out
    }
}

/// Writes one locale column of a localized field.
///
/// A missing or single-locale value is replaced by a locale map.
pub fn set_localized(record: &mut Record, field: &str, locale: &str, value: impl Into<Value>) {
    let mut by_locale = match record.remove(field) {
        Some(Value::Map(map)) => map,
        _ => Default::default(),
    };
    by_locale.insert(locale.to_string(), value.into());
    record.set(field, Value::Map(by_locale));
}

/// Returns the locales that hold a value for at least one localized field.
pub fn available_locales(record: &Record, schema: &SchemaDescriptor) -> Vec<String> {
    let mut locales = BTreeSet::new();
    for descriptor in schema.fields.iter().filter(|f| f.localized) {
        if let Some(Value::Map(by_locale)) = record.get(&descriptor.name) {
            locales.extend(
                by_locale
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(locale, _)| locale.clone()),
            );
        }
    }
    locales.into_iter().collect()
}

/// Checks that every required field has a value.
///
/// Localized fields stored as locale maps are only checked in the default
/// locale's column, whatever locale the caller is working in: documents
/// may be incomplete in other locales but never in the default one.
///
/// # Errors
///
/// Returns [`CoreError::MissingRequiredField`] for the first required
/// field without a value.
pub fn validate_required(record: &Record, schema: &SchemaDescriptor) -> CoreResult<()> {
    let default = schema.default_locale();
    for descriptor in schema.fields.iter().filter(|f| f.required) {
        let present = match record.get(&descriptor.name) {
            Some(Value::Map(by_locale)) if descriptor.localized => {
                by_locale.get(default).is_some_and(is_filled)
            }
            Some(value) => is_filled(value),
            None => false,
        };
        if !present {
            return Err(CoreError::missing_required(&descriptor.name, default));
        }
    }
    Ok(())
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Text(s) => !s.is_empty(),
        _ => true,
    }
}

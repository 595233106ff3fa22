//! Static schema descriptors.
//!
//! A [`SchemaDescriptor`] enumerates the fields of one content type and
//! the flags the versioning core cares about (unique, required,
//! localized). Descriptors are built once at startup and passed
//! explicitly to the partitioner and the locale resolver.

use crate::error::{CoreError, CoreResult};
use crate::types::{fields, DEFAULT_LOCALE};
use polydoc_storage::{IndexDefinition, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Value kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 text.
    Text,
    /// Signed integer.
    Integer,
    /// Boolean.
    Bool,
    /// List of values.
    Array,
    /// Nested object.
    Map,
}

impl FieldKind {
    /// The value a field of this kind reads as when it has no value in
    /// any applicable locale.
    #[must_use]
    pub fn zero(self) -> Value {
        match self {
            FieldKind::Text => Value::Text(String::new()),
            FieldKind::Integer => Value::Integer(0),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Array => Value::Array(Vec::new()),
            FieldKind::Map => Value::Map(BTreeMap::new()),
        }
    }
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Value kind.
    pub kind: FieldKind,
    /// Explicitly declared unique.
    #[serde(default)]
    pub unique: bool,
    /// Carries an implicit unique index (e.g. a slug).
    #[serde(default)]
    pub unique_index: bool,
    /// Must be present before a save succeeds.
    #[serde(default)]
    pub required: bool,
    /// Stored as a locale-to-value map.
    #[serde(default)]
    pub localized: bool,
}

impl FieldDescriptor {
    /// Creates a plain field of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            unique: false,
            unique_index: false,
            required: false,
            localized: false,
        }
    }

    /// Creates a text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Creates an integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// Creates a boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    /// Marks the field unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the field as carrying an implicit unique index.
    #[must_use]
    pub fn unique_index(mut self) -> Self {
        self.unique_index = true;
        self
    }

    /// Marks the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field localized.
    #[must_use]
    pub fn localized(mut self) -> Self {
        self.localized = true;
        self
    }

    /// Returns true if the field is unique either way.
    pub fn is_unique(&self) -> bool {
        self.unique || self.unique_index
    }
}

/// Locale configuration of a localized schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationConfig {
    /// Supported locale tags.
    pub locales: Vec<String>,
    /// Locale every document must be complete in.
    pub default_locale: String,
}

/// Explicit description of one content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Logical collection/type name.
    pub name: String,
    /// Locale configuration; `None` for single-language schemas.
    #[serde(default)]
    pub localization: Option<LocalizationConfig>,
    /// Whether documents of this schema keep version history.
    #[serde(default)]
    pub versioning: bool,
    /// Schema fields.
    pub fields: Vec<FieldDescriptor>,
    /// Additional declared indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl SchemaDescriptor {
    /// Starts building a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: SchemaDescriptor {
                name: name.into(),
                localization: None,
                versioning: false,
                fields: Vec::new(),
                indexes: Vec::new(),
            },
        }
    }

    /// Returns true if the schema has localization configured.
    pub fn is_localized(&self) -> bool {
        self.localization.is_some()
    }

    /// Returns the default locale, or [`DEFAULT_LOCALE`] for
    /// single-language schemas.
    pub fn default_locale(&self) -> &str {
        self.localization
            .as_ref()
            .map_or(DEFAULT_LOCALE, |l| l.default_locale.as_str())
    }

    /// Returns the supported locales.
    pub fn locales(&self) -> Vec<&str> {
        match &self.localization {
            Some(l) => l.locales.iter().map(String::as_str).collect(),
            None => vec![DEFAULT_LOCALE],
        }
    }

    /// Returns true if `locale` is supported.
    pub fn supports_locale(&self, locale: &str) -> bool {
        self.locales().contains(&locale)
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Standalone unique indexes the schema's unique fields would get
    /// without partitioning.
    pub fn standalone_indexes(&self) -> Vec<IndexDefinition> {
        self.fields
            .iter()
            .filter(|f| f.is_unique())
            .map(|f| IndexDefinition::new(standalone_index_name(&f.name), [f.name.as_str()]).unique())
            .collect()
    }

    /// Checks the schema for configuration errors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if:
    /// - The name is empty or a field name is empty or duplicated
    /// - Localization lists no locales, or the default locale is not one of them
    /// - A field is localized on a schema without localization
    /// - A declared index is empty or references an unknown field
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::configuration("schema name must not be empty"));
        }

        if let Some(l10n) = &self.localization {
            if l10n.locales.is_empty() {
                return Err(CoreError::configuration(format!(
                    "schema {} enables localization without locales",
                    self.name
                )));
            }
            if !l10n.locales.contains(&l10n.default_locale) {
                return Err(CoreError::configuration(format!(
                    "default locale {} of schema {} is not among its locales {:?}",
                    l10n.default_locale, self.name, l10n.locales
                )));
            }
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(CoreError::configuration(format!(
                    "schema {} has a field without a name",
                    self.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CoreError::configuration(format!(
                    "schema {} declares field {} twice",
                    self.name, field.name
                )));
            }
            if field.localized && !self.is_localized() {
                return Err(CoreError::configuration(format!(
                    "field {} of schema {} is localized but the schema is not",
                    field.name, self.name
                )));
            }
        }

        for index in &self.indexes {
            if index.fields.is_empty() {
                return Err(CoreError::configuration(format!(
                    "index {} of schema {} has no fields",
                    index.name, self.name
                )));
            }
            if let Some(unknown) = index
                .fields
                .iter()
                .find(|f| !seen.contains(f.as_str()) && !fields::is_system(f))
            {
                return Err(CoreError::configuration(format!(
                    "index {} of schema {} references unknown field {}",
                    index.name, self.name, unknown
                )));
            }
        }

        Ok(())
    }
}

/// Name of the standalone unique index for `field`.
pub fn standalone_index_name(field: &str) -> String {
    format!("{field}_unique")
}

/// Builder for [`SchemaDescriptor`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: SchemaDescriptor,
}

impl SchemaBuilder {
    /// Enables localization.
    #[must_use]
    pub fn localized<S: Into<String>>(
        mut self,
        locales: impl IntoIterator<Item = S>,
        default_locale: impl Into<String>,
    ) -> Self {
        self.schema.localization = Some(LocalizationConfig {
            locales: locales.into_iter().map(Into::into).collect(),
            default_locale: default_locale.into(),
        });
        self
    }

    /// Enables version history.
    #[must_use]
    pub fn versioned(mut self) -> Self {
        self.schema.versioning = true;
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.schema.fields.push(field);
        self
    }

    /// Declares an index.
    #[must_use]
    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.schema.indexes.push(index);
        self
    }

    /// Validates and returns the schema.
    ///
    /// # Errors
    ///
    /// See [`SchemaDescriptor::validate`].
    pub fn build(self) -> CoreResult<SchemaDescriptor> {
        self.schema.validate()?;
        Ok(self.schema)
    }
}

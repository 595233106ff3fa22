//! Property-based test generators using proptest.
//!
//! Provides strategies for generating documents, payloads and write
//! sequences that respect the store's invariants.

use polydoc_core::Status;
use polydoc_storage::{Fields, Value};
use proptest::prelude::*;

/// Locales the generators draw from; `en` is the default.
pub const LOCALES: &[&str] = &["en", "fr", "de"];

/// Strategy for generating locale tags.
pub fn locale_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(LOCALES).prop_map(str::to_string)
}

/// Strategy for generating logical document identifiers.
pub fn document_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("doc-[a-z0-9]{1,8}").expect("Invalid regex")
}

/// Strategy for generating statuses.
pub fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Draft),
        Just(Status::Published),
        Just(Status::Archived),
    ]
}

/// Strategy for generating scalar field values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-zA-Z0-9 ]{0,24}".prop_map(Value::Text),
    ]
}

/// Strategy for generating a localized value: a map from locale to text.
pub fn localized_value_strategy() -> impl Strategy<Value = Value> {
    (
        prop::sample::subsequence(LOCALES, 0..=LOCALES.len()),
        prop::collection::vec("[a-zA-Z ]{1,16}", LOCALES.len()),
    )
        .prop_map(|(locales, texts)| Value::map(locales.into_iter().zip(texts)))
}

/// Strategy for generating document payloads.
///
/// Field names never collide with system fields.
pub fn fields_strategy() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map("f_[a-z]{1,8}", scalar_value_strategy(), 0..8)
}

/// One step in a generated write sequence against a single document.
#[derive(Debug, Clone)]
pub enum VersionOperation {
    /// Snapshot a save in a locale.
    Save {
        /// Locale of the save.
        locale: String,
        /// Saved payload.
        data: Fields,
    },
    /// Publish the latest version of a locale.
    PublishLatest {
        /// Locale to publish.
        locale: String,
    },
    /// Archive the latest version of a locale.
    ArchiveLatest {
        /// Locale to archive.
        locale: String,
    },
}

/// Strategy for generating version operations.
pub fn version_operation_strategy() -> impl Strategy<Value = VersionOperation> {
    prop_oneof![
        4 => (locale_strategy(), fields_strategy())
            .prop_map(|(locale, data)| VersionOperation::Save { locale, data }),
        1 => locale_strategy().prop_map(|locale| VersionOperation::PublishLatest { locale }),
        1 => locale_strategy().prop_map(|locale| VersionOperation::ArchiveLatest { locale }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<VersionOperation>> {
    prop::collection::vec(version_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydoc_core::fields;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn locale_is_known(locale in locale_strategy()) {
            prop_assert!(LOCALES.contains(&locale.as_str()));
        }

        #[test]
        fn payload_avoids_system_fields(data in fields_strategy()) {
            prop_assert!(data.keys().all(|k| !fields::is_system(k)));
        }

        #[test]
        fn localized_value_is_a_map(value in localized_value_strategy()) {
            let map = value.as_map().unwrap();
            prop_assert!(map.keys().all(|k| LOCALES.contains(&k.as_str())));
        }

        #[test]
        fn document_id_has_prefix(id in document_id_strategy()) {
            prop_assert!(id.starts_with("doc-"));
        }
    }
}

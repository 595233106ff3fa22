//! Test fixtures.
//!
//! Provides ready-wired stores, settings and schemas for tests.

use polydoc_core::{
    Documents, FieldDescriptor, InMemorySettings, SchemaDescriptor, SettingsProvider,
    StoreConfig, VersionStore, VersioningSettings,
};
use polydoc_storage::{DocumentStore, Fields, InMemoryStore, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// An in-memory store wired to a version store.
pub struct TestStore {
    /// The storage engine.
    pub store: Arc<InMemoryStore>,
    /// The settings provider; change it to steer the next write.
    pub settings: Arc<InMemorySettings>,
    /// The version store.
    pub versions: Arc<VersionStore>,
}

impl TestStore {
    /// Creates a store with default settings.
    pub fn new() -> Self {
        Self::with_settings(VersioningSettings::default())
    }

    /// Creates a store keeping at most `max_versions` per partition.
    pub fn with_max_versions(max_versions: u32) -> Self {
        Self::with_settings(VersioningSettings {
            max_versions,
            ..VersioningSettings::default()
        })
    }

    /// Creates a store with the given settings.
    pub fn with_settings(settings: VersioningSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let settings = Arc::new(InMemorySettings::with_versioning(&settings));
        let versions = VersionStore::new(
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            Arc::clone(&settings) as Arc<dyn SettingsProvider>,
            StoreConfig::default(),
        )
        .expect("Failed to open version store");
        Self {
            store,
            settings,
            versions: Arc::new(versions),
        }
    }

    /// Registers `schema` and returns its document service.
    pub fn documents(&self, schema: &SchemaDescriptor) -> Documents {
        Documents::register(
            Arc::clone(&self.store) as Arc<dyn DocumentStore>,
            Arc::clone(&self.versions),
            schema,
        )
        .expect("Failed to register schema")
    }

    /// Replaces the versioning settings.
    pub fn set_versioning(&self, settings: VersioningSettings) {
        self.settings.set_versioning(&settings);
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test with a fresh [`TestStore`].
pub fn with_test_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::new();
    f(&store)
}

/// A settings JSON file in a temporary directory.
pub struct SettingsFile {
    /// Path of the file.
    pub path: PathBuf,
    _dir: TempDir,
}

impl SettingsFile {
    /// Writes `settings` as a settings document.
    pub fn new(settings: &VersioningSettings) -> Self {
        Self::raw(&serde_json::json!({ "versioning": settings.to_settings() }).to_string())
    }

    /// Writes `json` verbatim.
    pub fn raw(json: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, json).expect("Failed to write settings file");
        Self { path, _dir: dir }
    }
}

/// Builds a field map from pairs.
pub fn field_map<K, V, I>(pairs: I) -> Fields
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Schemas used across tests.
pub mod schemas {
    use super::*;

    /// A versioned `post` in `en` (default) and `fr` with a localized
    /// required `title` and a unique `slug`.
    pub fn post() -> SchemaDescriptor {
        SchemaDescriptor::builder("post")
            .localized(["en", "fr"], "en")
            .versioned()
            .field(FieldDescriptor::text("title").localized().required())
            .field(FieldDescriptor::text("slug").unique())
            .field(FieldDescriptor::integer("rank"))
            .build()
            .expect("post schema is valid")
    }

    /// A single-language, unversioned `tag` with a unique `name`.
    pub fn tag() -> SchemaDescriptor {
        SchemaDescriptor::builder("tag")
            .field(FieldDescriptor::text("name").unique().required())
            .build()
            .expect("tag schema is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydoc_core::{JsonSettings, NewVersion};

    #[test]
    fn test_store_creates_versions() {
        with_test_store(|t| {
            let v = t
                .versions
                .create_version(NewVersion::new("doc-1", "post", field_map([("title", "Hello")])))
                .unwrap();
            assert_eq!(v.version_number, 1);
            assert_eq!(t.store.len("versions"), 1);
        });
    }

    #[test]
    fn settings_file_round_trips() {
        let settings = VersioningSettings {
            max_versions: 3,
            auto_publish: true,
            ..VersioningSettings::default()
        };
        let file = SettingsFile::new(&settings);
        let provider = JsonSettings::from_path(&file.path).unwrap();
        assert_eq!(VersioningSettings::load(&provider, 20).unwrap(), settings);
    }

    #[test]
    fn schemas_are_valid() {
        assert!(schemas::post().is_localized());
        assert!(!schemas::tag().versioning);
    }
}

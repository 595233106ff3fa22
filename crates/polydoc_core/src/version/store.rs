//! The version store.

use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::query::QueryBuilder;
use crate::settings::{SettingsProvider, VersioningSettings};
use crate::types::{fields, Status, VersionKey};
use crate::version::diff::{compare, FieldChange};
use crate::version::lock::KeyedLocks;
use crate::version::model::{NewVersion, Version};
use crate::version::retention::{CleanupReport, RetentionPolicy};
use polydoc_storage::{
    DocumentStore, Fields, Filter, IndexDefinition, SortOrder, SortSpec, Value, ID_FIELD,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Unique index backing version numbering.
pub const VERSION_NUMBER_INDEX: &str = "documentId_schemaName_locale_versionNumber_unique";

/// Access index over version partitions.
pub const VERSION_PARTITION_INDEX: &str = "documentId_schemaName_locale";

/// Creates, lists and retires version snapshots.
///
/// ## Numbering
///
/// Version numbers are strictly increasing and gap-free per
/// `(documentId, schemaName, locale)`. Writers to one partition are
/// serialized by an in-process lock held across read-increment-write and
/// the retention pass. A unique index on the number backs this up against
/// writers in other processes; a collision there is retried with a fresh
/// number up to [`StoreConfig::version_retry_attempts`] times.
///
/// ## Failure policy
///
/// - `create_version` propagates storage errors
/// - Retention failures after a version was stored are logged, not returned
/// - Status transitions report any failure as `None`
pub struct VersionStore {
    store: Arc<dyn DocumentStore>,
    settings: Arc<dyn SettingsProvider>,
    config: StoreConfig,
    locks: KeyedLocks,
    retention: RetentionPolicy,
}

impl VersionStore {
    /// Opens a version store, declaring its indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the indexes cannot be declared.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        settings: Arc<dyn SettingsProvider>,
        config: StoreConfig,
    ) -> CoreResult<Self> {
        let collection = config.versions_collection.as_str();
        store.ensure_index(
            collection,
            IndexDefinition::new(
                VERSION_NUMBER_INDEX,
                [
                    fields::DOCUMENT_ID,
                    fields::SCHEMA_NAME,
                    fields::LOCALE,
                    fields::VERSION_NUMBER,
                ],
            )
            .unique(),
        )?;
        store.ensure_index(
            collection,
            IndexDefinition::new(
                VERSION_PARTITION_INDEX,
                [fields::DOCUMENT_ID, fields::SCHEMA_NAME, fields::LOCALE],
            ),
        )?;

        Ok(Self {
            retention: RetentionPolicy::new(collection),
            store,
            settings,
            config,
            locks: KeyedLocks::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Reads the current versioning settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or holds invalid values.
    pub fn settings(&self) -> CoreResult<VersioningSettings> {
        VersioningSettings::load(self.settings.as_ref(), self.config.default_max_versions)
    }

    /// Starts a query over the versions collection.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self.store.as_ref(), self.config.versions_collection.as_str())
    }

    /// Stores a new version with the next number in its partition, then
    /// trims the partition to the configured retention cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read, the store fails, or
    /// numbering keeps colliding with other writers.
    pub fn create_version(&self, new: NewVersion) -> CoreResult<Version> {
        let settings = self.settings()?;
        let key = new.key();

        self.locks.with_lock(&key, || {
            let version = self.insert_next(new, &key)?;
            info!(
                partition = %key,
                version = version.version_number,
                status = %version.status,
                "created version"
            );

            match self.retention.enforce(self.store.as_ref(), &key, settings.max_versions) {
                Ok(report) if !report.is_clean() => {
                    warn!(partition = %key, failed = report.failed, "retention left old versions behind");
                }
                Ok(_) => {}
                Err(e) => warn!(partition = %key, error = %e, "retention pass failed"),
            }
            Ok(version)
        })
    }

    fn insert_next(&self, new: NewVersion, key: &VersionKey) -> CoreResult<Version> {
        let attempts = self.config.version_retry_attempts.max(1);
        for attempt in 1..=attempts {
            let next = self.latest_number(key)? + 1;
            let version = new.clone().into_version(next);
            match self
                .store
                .create(&self.config.versions_collection, version.to_record())
            {
                Ok(_) => return Ok(version),
                Err(e) if e.is_duplicate_key() => {
                    debug!(partition = %key, number = next, attempt, "version number taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CoreError::VersionNumberConflict {
            document_id: key.document_id.clone(),
            locale: key.locale.clone(),
            attempts,
        })
    }

    fn latest_number(&self, key: &VersionKey) -> CoreResult<u64> {
        let latest = self
            .query()
            .filter(key.filter())
            .sort(SortSpec::desc(fields::VERSION_NUMBER))
            .exec_one_as::<Version>()?;
        Ok(latest.map_or(0, |v| v.version_number))
    }

    /// Snapshots a document save, choosing the initial status from the
    /// current settings.
    ///
    /// # Errors
    ///
    /// See [`VersionStore::create_version`].
    pub fn record_save(
        &self,
        document_id: &str,
        schema_name: &str,
        data: Fields,
        locale: &str,
        created_by: Option<&str>,
    ) -> CoreResult<Version> {
        let status = self.settings()?.initial_status();
        let mut new = NewVersion::new(document_id, schema_name, data)
            .locale(locale)
            .status(status);
        if let Some(user) = created_by {
            new = new.created_by(user);
        }
        self.create_version(new)
    }

    /// Returns every version of a document across all locales, newest
    /// number first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a stored version is malformed.
    pub fn find_versions(&self, document_id: &str, schema_name: &str) -> CoreResult<Vec<Version>> {
        self.query()
            .filter(document_filter(document_id, schema_name))
            .sort(SortSpec::desc(fields::VERSION_NUMBER).then(fields::LOCALE, SortOrder::Ascending))
            .exec_as()
    }

    /// Returns the versions of a document in one locale, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a stored version is malformed.
    pub fn find_versions_by_locale(
        &self,
        document_id: &str,
        schema_name: &str,
        locale: &str,
    ) -> CoreResult<Vec<Version>> {
        self.query()
            .filter(VersionKey::new(document_id, schema_name, locale).filter())
            .sort(SortSpec::desc(fields::VERSION_NUMBER))
            .exec_as()
    }

    /// Looks up a version by identifier. Malformed identifiers are not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the version is malformed.
    pub fn find_version_by_id(&self, version_id: &str) -> CoreResult<Option<Version>> {
        self.query().filter(id_filter(version_id)).exec_one_as()
    }

    /// Looks up a version by number within its partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the version is malformed.
    pub fn find_version_by_number(
        &self,
        document_id: &str,
        schema_name: &str,
        locale: &str,
        version_number: u64,
    ) -> CoreResult<Option<Version>> {
        self.query()
            .filter(VersionKey::new(document_id, schema_name, locale).filter())
            .version(version_number)
            .exec_one_as()
    }

    /// Returns the highest-numbered version of a partition, optionally
    /// restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the version is malformed.
    pub fn find_latest_version(
        &self,
        document_id: &str,
        schema_name: &str,
        locale: &str,
        status: Option<Status>,
    ) -> CoreResult<Option<Version>> {
        let mut query = self
            .query()
            .filter(VersionKey::new(document_id, schema_name, locale).filter())
            .sort(SortSpec::desc(fields::VERSION_NUMBER));
        if let Some(status) = status {
            query = query.status(status);
        }
        query.exec_one_as()
    }

    /// Sets the status of a version without touching its data or number.
    ///
    /// Returns `None` if the version does not exist or the write failed;
    /// failures are logged.
    pub fn update_version_status(&self, version_id: &str, status: Status) -> Option<Version> {
        self.set_status(id_filter(version_id), version_id, status)
    }

    /// Moves a draft version to `published`.
    ///
    /// Returns `None` if the version does not exist or is not a draft.
    pub fn publish_version(&self, version_id: &str) -> Option<Version> {
        self.transition(version_id, Status::Draft, Status::Published)
    }

    /// Moves a published version to `archived`.
    ///
    /// Returns `None` if the version does not exist or is not published.
    pub fn archive_version(&self, version_id: &str) -> Option<Version> {
        self.transition(version_id, Status::Published, Status::Archived)
    }

    fn transition(&self, version_id: &str, from: Status, to: Status) -> Option<Version> {
        debug_assert!(from.can_transition_to(to));
        // The status condition makes the check and the write one step
        let filter = id_filter(version_id).and(from.filter());
        let updated = self.set_status(filter, version_id, to);
        if updated.is_none() {
            debug!(version = version_id, from = %from, to = %to, "transition rejected");
        }
        updated
    }

    fn set_status(&self, filter: Filter, version_id: &str, status: Status) -> Option<Version> {
        let patch = Fields::from([(fields::STATUS.to_string(), Value::from(status))]);
        match self
            .store
            .update(&self.config.versions_collection, &filter, &patch)
        {
            Ok(Some(record)) => match Version::try_from(record) {
                Ok(version) => {
                    info!(version = version_id, status = %status, "version status updated");
                    Some(version)
                }
                Err(e) => {
                    warn!(version = version_id, error = %e, "updated version is malformed");
                    None
                }
            },
            Ok(None) => None,
            Err(e) if e.is_invalid_id() => None,
            Err(e) => {
                warn!(version = version_id, status = %status, error = %e, "failed to update version status");
                None
            }
        }
    }

    /// Returns the distinct locales holding at least one version of a
    /// document, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_versioned_locales(&self, document_id: &str, schema_name: &str) -> CoreResult<Vec<String>> {
        let records = self
            .query()
            .filter(document_filter(document_id, schema_name))
            .select([fields::LOCALE])
            .exec()?;
        let locales: BTreeSet<String> = records
            .iter()
            .filter_map(|r| r.text(fields::LOCALE).map(str::to_string))
            .collect();
        Ok(locales.into_iter().collect())
    }

    /// Deletes a version. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn delete_version(&self, version_id: &str) -> CoreResult<bool> {
        match self
            .store
            .delete(&self.config.versions_collection, &id_filter(version_id))
        {
            Ok(deleted) => {
                if deleted {
                    info!(version = version_id, "deleted version");
                }
                Ok(deleted)
            }
            Err(e) if e.is_invalid_id() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a new draft carrying the data of an older version.
    ///
    /// History is never rewritten: the restored content gets the next
    /// number in its partition. Returns `None` if the source is not found.
    ///
    /// # Errors
    ///
    /// See [`VersionStore::create_version`].
    pub fn restore_version(&self, version_id: &str, created_by: Option<&str>) -> CoreResult<Option<Version>> {
        let Some(source) = self.find_version_by_id(version_id)? else {
            return Ok(None);
        };
        let mut new = NewVersion::new(source.document_id, source.schema_name, source.data)
            .locale(source.locale)
            .notes(format!("restored from version {}", source.version_number));
        if let Some(user) = created_by {
            new = new.created_by(user);
        }
        self.create_version(new).map(Some)
    }

    /// Lists the field changes from version `from_id` to version `to_id`.
    ///
    /// Returns `None` if either version is not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn compare_versions(&self, from_id: &str, to_id: &str) -> CoreResult<Option<Vec<FieldChange>>> {
        let (Some(from), Some(to)) = (self.find_version_by_id(from_id)?, self.find_version_by_id(to_id)?)
        else {
            return Ok(None);
        };
        Ok(Some(compare(&from.data, &to.data)))
    }

    /// Runs a retention pass for one partition with the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read or the partition
    /// cannot be counted.
    pub fn enforce_retention(&self, key: &VersionKey) -> CoreResult<CleanupReport> {
        let settings = self.settings()?;
        self.locks.with_lock(key, || {
            self.retention.enforce(self.store.as_ref(), key, settings.max_versions)
        })
    }
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore")
            .field("config", &self.config)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

fn document_filter(document_id: &str, schema_name: &str) -> Filter {
    Filter::eq(fields::DOCUMENT_ID, document_id).and(Filter::eq(fields::SCHEMA_NAME, schema_name))
}

fn id_filter(version_id: &str) -> Filter {
    Filter::eq(ID_FIELD, version_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::InMemorySettings;
    use polydoc_storage::{FindOptions, InMemoryStore, Record, StorageResult};
    use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
    use std::thread;

    struct Fixture {
        store: Arc<InMemoryStore>,
        settings: Arc<InMemorySettings>,
        versions: VersionStore,
    }

    fn fixture(max_versions: u32) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let settings = Arc::new(InMemorySettings::with_versioning(&VersioningSettings {
            max_versions,
            ..VersioningSettings::default()
        }));
        let versions = VersionStore::new(store.clone(), settings.clone(), StoreConfig::default()).unwrap();
        Fixture {
            store,
            settings,
            versions,
        }
    }

    fn data(title: &str) -> Fields {
        Fields::from([("title".to_string(), Value::from(title))])
    }

    fn create(versions: &VersionStore, locale: &str, title: &str) -> Version {
        versions
            .create_version(NewVersion::new("doc-1", "post", data(title)).locale(locale))
            .unwrap()
    }

    #[test]
    fn numbers_start_at_one_and_increase() {
        let f = fixture(20);
        let numbers: Vec<_> = (0..4).map(|i| create(&f.versions, "en", &i.to_string()).version_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);

        // Locales are numbered independently
        assert_eq!(create(&f.versions, "fr", "x").version_number, 1);
    }

    #[test]
    fn concurrent_writers_get_distinct_numbers() {
        let f = fixture(0);
        let versions = Arc::new(f.versions);
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let versions = Arc::clone(&versions);
                thread::spawn(move || create(&versions, "en", &i.to_string()).version_number)
            })
            .collect();
        let mut numbers: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=16).collect::<Vec<_>>());
    }

    #[test]
    fn retention_runs_after_create() {
        let f = fixture(2);
        for title in ["a", "b", "c"] {
            create(&f.versions, "en", title);
        }
        let numbers: Vec<_> = f
            .versions
            .find_versions("doc-1", "post")
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, vec![3, 2]);
    }

    #[test]
    fn settings_are_reread_on_every_create() {
        let f = fixture(5);
        for title in ["a", "b", "c", "d"] {
            create(&f.versions, "en", title);
        }
        f.settings.set_versioning(&VersioningSettings {
            max_versions: 1,
            ..VersioningSettings::default()
        });
        let latest = create(&f.versions, "en", "e");
        let remaining = f.versions.find_versions_by_locale("doc-1", "post", "en").unwrap();
        assert_eq!(remaining, vec![latest]);
    }

    #[test]
    fn failed_retention_still_returns_the_version() {
        let f = fixture(1);
        let first = create(&f.versions, "en", "a");
        f.store.fail_deletes_for(first.id);
        let second = create(&f.versions, "en", "b");
        assert_eq!(second.version_number, 2);
        assert_eq!(f.versions.find_versions("doc-1", "post").unwrap().len(), 2);

        f.store.clear_faults();
        let report = f.versions.enforce_retention(&second.key()).unwrap();
        assert_eq!(report.deleted, 1);
    }

    #[test]
    fn create_propagates_storage_errors() {
        let f = fixture(20);
        f.store.set_offline(true);
        let result = f
            .versions
            .create_version(NewVersion::new("doc-1", "post", data("a")));
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }

    /// Hides the versions collection from the next `stale` reads, the way
    /// a writer in another process is invisible until its insert lands.
    struct StaleReads {
        inner: InMemoryStore,
        stale: AtomicU32,
    }

    impl DocumentStore for StaleReads {
        fn create(&self, collection: &str, record: Record) -> StorageResult<Record> {
            self.inner.create(collection, record)
        }
        fn find(&self, collection: &str, options: &FindOptions) -> StorageResult<Vec<Record>> {
            let hide = self
                .stale
                .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if hide {
                return Ok(Vec::new());
            }
            self.inner.find(collection, options)
        }
        fn count(&self, collection: &str, filter: &Filter) -> StorageResult<u64> {
            self.inner.count(collection, filter)
        }
        fn update(&self, collection: &str, filter: &Filter, patch: &Fields) -> StorageResult<Option<Record>> {
            self.inner.update(collection, filter, patch)
        }
        fn delete(&self, collection: &str, filter: &Filter) -> StorageResult<bool> {
            self.inner.delete(collection, filter)
        }
        fn ensure_index(&self, collection: &str, index: IndexDefinition) -> StorageResult<()> {
            self.inner.ensure_index(collection, index)
        }
        fn drop_index(&self, collection: &str, name: &str) -> StorageResult<bool> {
            self.inner.drop_index(collection, name)
        }
        fn indexes(&self, collection: &str) -> StorageResult<Vec<IndexDefinition>> {
            self.inner.indexes(collection)
        }
    }

    fn stale_store(config: StoreConfig) -> (Arc<StaleReads>, VersionStore) {
        let store = Arc::new(StaleReads {
            inner: InMemoryStore::new(),
            stale: AtomicU32::new(0),
        });
        let versions = VersionStore::new(store.clone(), Arc::new(InMemorySettings::new()), config).unwrap();
        (store, versions)
    }

    #[test]
    fn numbering_collision_is_retried() {
        let (store, versions) = stale_store(StoreConfig::default());
        create(&versions, "en", "a");

        store.stale.store(2, AtomicOrdering::SeqCst);
        let v = create(&versions, "en", "b");
        assert_eq!(v.version_number, 2);
        assert_eq!(versions.find_versions("doc-1", "post").unwrap().len(), 2);
    }

    #[test]
    fn numbering_collision_gives_up_after_retries() {
        let (store, versions) = stale_store(StoreConfig::default().version_retry_attempts(2));
        create(&versions, "en", "a");

        store.stale.store(5, AtomicOrdering::SeqCst);
        let err = versions
            .create_version(NewVersion::new("doc-1", "post", data("b")))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::VersionNumberConflict { attempts: 2, ref document_id, .. } if document_id == "doc-1"
        ));
        assert_eq!(versions.config().version_retry_attempts, 2);
    }

    #[test]
    fn lookups() {
        let f = fixture(20);
        let v1 = create(&f.versions, "en", "a");
        let v2 = create(&f.versions, "en", "b");
        let fr = create(&f.versions, "fr", "c");

        let id = v1.id.to_string();
        assert_eq!(f.versions.find_version_by_id(&id).unwrap(), Some(v1.clone()));
        assert_eq!(f.versions.find_version_by_id("not-an-id").unwrap(), None);
        assert_eq!(
            f.versions.find_version_by_id(&polydoc_storage::RecordId::new().to_string()).unwrap(),
            None
        );

        assert_eq!(
            f.versions.find_version_by_number("doc-1", "post", "en", 2).unwrap(),
            Some(v2.clone())
        );
        assert_eq!(f.versions.find_version_by_number("doc-1", "post", "en", 9).unwrap(), None);

        assert_eq!(
            f.versions.find_latest_version("doc-1", "post", "en", None).unwrap(),
            Some(v2.clone())
        );
        assert_eq!(
            f.versions.find_latest_version("doc-1", "post", "fr", Some(Status::Draft)).unwrap(),
            Some(fr)
        );
        assert_eq!(
            f.versions.find_latest_version("doc-1", "post", "en", Some(Status::Published)).unwrap(),
            None
        );

        assert_eq!(f.versions.find_versions("doc-1", "post").unwrap().len(), 3);
        assert_eq!(f.versions.find_versions_by_locale("doc-1", "post", "en").unwrap(), vec![v2, v1]);
        assert_eq!(f.versions.get_versioned_locales("doc-1", "post").unwrap(), vec!["en", "fr"]);
        assert!(f.versions.get_versioned_locales("doc-2", "post").unwrap().is_empty());
    }

    #[test]
    fn state_machine() {
        let f = fixture(20);
        let v = create(&f.versions, "en", "a");
        let id = v.id.to_string();

        assert!(f.versions.archive_version(&id).is_none());

        let published = f.versions.publish_version(&id).unwrap();
        assert_eq!(published.status, Status::Published);
        assert_eq!(published.data, v.data);
        assert_eq!(published.version_number, v.version_number);
        assert_eq!(published.created_at, v.created_at);

        assert!(f.versions.publish_version(&id).is_none());

        let archived = f.versions.archive_version(&id).unwrap();
        assert_eq!(archived.status, Status::Archived);

        assert!(f.versions.publish_version(&id).is_none());
        assert!(f.versions.archive_version(&id).is_none());
        let stored = f.versions.find_version_by_id(&id).unwrap().unwrap();
        assert_eq!(stored.status, Status::Archived);

        assert!(f.versions.publish_version("garbage").is_none());
    }

    #[test]
    fn status_update_failure_is_none() {
        let f = fixture(20);
        let v = create(&f.versions, "en", "a");
        let id = v.id.to_string();
        f.store.set_offline(true);
        assert!(f.versions.update_version_status(&id, Status::Published).is_none());
        f.store.set_offline(false);
        let updated = f.versions.update_version_status(&id, Status::Published).unwrap();
        assert_eq!(updated.status, Status::Published);
    }

    #[test]
    fn delete_version() {
        let f = fixture(20);
        let v = create(&f.versions, "en", "a");
        let id = v.id.to_string();
        assert!(f.versions.delete_version(&id).unwrap());
        assert!(!f.versions.delete_version(&id).unwrap());
        assert!(!f.versions.delete_version("nope").unwrap());
        assert!(f.versions.find_version_by_id(&id).unwrap().is_none());
    }

    #[test]
    fn record_save_follows_settings() {
        let f = fixture(20);
        let v = f.versions.record_save("doc-1", "post", data("a"), "en", Some("alice")).unwrap();
        assert_eq!(v.status, Status::Draft);
        assert_eq!(v.created_by.as_deref(), Some("alice"));

        f.settings.set_versioning(&VersioningSettings {
            auto_publish: true,
            ..VersioningSettings::default()
        });
        let v = f.versions.record_save("doc-1", "post", data("b"), "en", None).unwrap();
        assert_eq!(v.status, Status::Published);

        // Legacy string booleans behave the same
        f.settings.set("versioning", "autoPublish", "false");
        f.settings.set("versioning", "draftsEnabled", "false");
        let v = f.versions.record_save("doc-1", "post", data("c"), "en", None).unwrap();
        assert_eq!(v.status, Status::Published);
    }

    #[test]
    fn restore_creates_new_version() {
        let f = fixture(20);
        let v1 = create(&f.versions, "en", "first");
        create(&f.versions, "en", "second");

        let restored = f.versions.restore_version(&v1.id.to_string(), Some("bob")).unwrap().unwrap();
        assert_eq!(restored.version_number, 3);
        assert_eq!(restored.data, v1.data);
        assert_eq!(restored.status, Status::Draft);
        assert_eq!(restored.notes.as_deref(), Some("restored from version 1"));
        assert!(f.versions.restore_version("missing", None).unwrap().is_none());
    }

    #[test]
    fn compare_versions() {
        let f = fixture(20);
        let a = create(&f.versions, "en", "first");
        let b = create(&f.versions, "en", "second");
        let changes = f
            .versions
            .compare_versions(&a.id.to_string(), &b.id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(
            changes,
            vec![FieldChange::Changed {
                field: "title".into(),
                from: Value::from("first"),
                to: Value::from("second"),
            }]
        );
        assert!(f.versions.compare_versions("x", &b.id.to_string()).unwrap().is_none());
    }
}

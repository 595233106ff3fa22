//! Document rows of one schema.
//!
//! A logical document is stored as one row per `(documentId, locale,
//! status)`. [`Documents`] maintains those rows for one schema, keeps the
//! partitioned uniqueness constraints in place, and snapshots saves into
//! the [`VersionStore`] when the schema is versioned.

use crate::error::{CoreError, CoreResult};
use crate::locale::{validate_required, LocaleContext};
use crate::partition::{apply, partition, PartitionPlan};
use crate::query::QueryBuilder;
use crate::schema::SchemaDescriptor;
use crate::types::{fields, now_millis, Status};
use crate::version::{NewVersion, Version, VersionStore};
use polydoc_storage::{DocumentStore, Fields, Filter, Record, RecordId, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of saving a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// The stored draft row.
    pub row: Record,
    /// The snapshot taken, for versioned schemas.
    pub version: Option<Version>,
}

impl SaveOutcome {
    /// Returns true if the save went live immediately.
    pub fn published(&self) -> bool {
        self.version
            .as_ref()
            .is_some_and(|v| v.status == Status::Published)
    }
}

/// Document service for one schema.
pub struct Documents {
    store: Arc<dyn DocumentStore>,
    versions: Arc<VersionStore>,
    plan: PartitionPlan,
}

impl Documents {
    /// Registers `schema`: partitions its unique fields and declares the
    /// resulting indexes on the collection named after it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] for an invalid schema, or a
    /// storage error if the indexes cannot be declared.
    pub fn register(
        store: Arc<dyn DocumentStore>,
        versions: Arc<VersionStore>,
        schema: &SchemaDescriptor,
    ) -> CoreResult<Self> {
        let plan = partition(schema)?;
        apply(&plan, store.as_ref(), &schema.name)?;
        info!(
            schema = %schema.name,
            converted = plan.fields_converted.len(),
            versioning = schema.versioning,
            "registered schema"
        );
        Ok(Self {
            store,
            versions,
            plan,
        })
    }

    /// Returns the registered (partitioned) schema.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.plan.schema
    }

    /// Returns the partition plan applied at registration.
    pub fn plan(&self) -> &PartitionPlan {
        &self.plan
    }

    /// Returns the version store.
    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    fn collection(&self) -> &str {
        &self.plan.schema.name
    }

    /// Starts a query over the document rows.
    pub fn list(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self.store.as_ref(), self.collection())
    }

    /// Returns the row of a document in one locale and status.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn find(&self, document_id: &str, locale: &str, status: Status) -> CoreResult<Option<Record>> {
        self.list()
            .filter(Filter::eq(fields::DOCUMENT_ID, document_id))
            .locale(locale)
            .status(status)
            .exec_one()
    }

    /// Reads a document in `locale`.
    ///
    /// Falls back to the default-locale row when the document has no row
    /// in `locale`; localized fields then resolve with default-locale
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn resolve(&self, document_id: &str, locale: &str, status: Status) -> CoreResult<Option<Fields>> {
        let default = self.schema().default_locale();
        let row = match self.find(document_id, locale, status)? {
            Some(row) => Some(row),
            None if locale != default => self.find(document_id, default, status)?,
            None => None,
        };
        Ok(row.map(|row| {
            LocaleContext::new(&row, self.schema())
                .with_locale(locale)
                .resolved_fields()
        }))
    }

    /// Creates or updates the draft row of a document in `locale`, then
    /// snapshots it.
    ///
    /// Required fields are checked in the default locale only: saving a
    /// non-default locale needs a complete default-locale draft, but the
    /// translation itself may be partial. System fields in `data` are
    /// ignored.
    ///
    /// When the current settings publish saves immediately, the published
    /// row is updated as well.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `locale` is not supported by the schema
    /// - A required field is missing in the default locale
    /// - The row would violate a uniqueness constraint
    /// - The store fails
    pub fn save_draft(
        &self,
        document_id: &str,
        locale: &str,
        data: Fields,
        created_by: Option<&str>,
    ) -> CoreResult<SaveOutcome> {
        self.check_locale(locale)?;
        // Settings are resolved before anything is written
        let status = if self.schema().versioning {
            Some(self.versions.settings()?.initial_status())
        } else {
            None
        };
        let data = user_fields(&data);
        let existing = self.find(document_id, locale, Status::Draft)?;

        let mut merged = existing
            .clone()
            .unwrap_or_else(|| new_row(document_id, locale, Status::Draft));
        merged.merge(&data);
        self.check_required(document_id, locale, &merged)?;

        let (row, write) = match existing {
            Some(current) => {
                let mut patch = data;
                patch.insert(fields::UPDATED_AT.to_string(), timestamp());
                if let Some(user) = created_by {
                    patch.insert(fields::UPDATED_BY.to_string(), Value::from(user));
                }
                (self.update_row(&current, &patch)?, RowWrite::Updated(current))
            }
            None => {
                let now = timestamp();
                merged
                    .set(fields::CREATED_AT, now.clone())
                    .set(fields::UPDATED_AT, now);
                if let Some(user) = created_by {
                    merged.set(fields::CREATED_BY, user).set(fields::UPDATED_BY, user);
                }
                let row = self.store.create(self.collection(), merged)?;
                let id = row.id();
                (row, RowWrite::Created(id))
            }
        };
        debug!(schema = %self.collection(), document = document_id, locale, "saved draft");

        let Some(status) = status else {
            return Ok(SaveOutcome { row, version: None });
        };

        let mut writes = vec![write];
        match self.snapshot_save(&mut writes, document_id, locale, &row, status, created_by) {
            Ok(version) => Ok(SaveOutcome {
                row,
                version: Some(version),
            }),
            Err(e) => {
                self.rollback(writes);
                Err(e)
            }
        }
    }

    fn snapshot_save(
        &self,
        writes: &mut Vec<RowWrite>,
        document_id: &str,
        locale: &str,
        row: &Record,
        status: Status,
        created_by: Option<&str>,
    ) -> CoreResult<Version> {
        if status == Status::Published {
            let (_, write) = self.upsert_published(document_id, locale, row)?;
            writes.push(write);
        }
        let mut new = NewVersion::new(document_id, self.collection(), user_fields(row.fields()))
            .locale(locale)
            .status(status);
        if let Some(user) = created_by {
            new = new.created_by(user);
        }
        self.versions.create_version(new)
    }

    /// Copies the draft row of a document in `locale` into its published
    /// row and records a published version.
    ///
    /// Returns `None` if there is no draft to publish. If the version cannot
    /// be recorded the published row is restored to its previous state.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read or the store fails.
    pub fn publish(
        &self,
        document_id: &str,
        locale: &str,
        published_by: Option<&str>,
    ) -> CoreResult<Option<Record>> {
        if self.schema().versioning {
            self.versions.settings()?;
        }
        let Some(draft) = self.find(document_id, locale, Status::Draft)? else {
            return Ok(None);
        };
        let (published, write) = self.upsert_published(document_id, locale, &draft)?;

        if self.schema().versioning {
            let mut new = NewVersion::new(document_id, self.collection(), user_fields(draft.fields()))
                .locale(locale)
                .status(Status::Published);
            if let Some(user) = published_by {
                new = new.created_by(user);
            }
            if let Err(e) = self.versions.create_version(new) {
                self.rollback(vec![write]);
                return Err(e);
            }
        }

        info!(schema = %self.collection(), document = document_id, locale, "published");
        Ok(Some(published))
    }

    fn upsert_published(
        &self,
        document_id: &str,
        locale: &str,
        draft: &Record,
    ) -> CoreResult<(Record, RowWrite)> {
        let mut patch = user_fields(draft.fields());
        let now = timestamp();
        patch.insert(fields::PUBLISHED_AT.to_string(), now.clone());
        patch.insert(fields::UPDATED_AT.to_string(), now.clone());

        match self.find(document_id, locale, Status::Published)? {
            Some(current) => {
                let row = self.update_row(&current, &patch)?;
                Ok((row, RowWrite::Updated(current)))
            }
            None => {
                let mut row = new_row(document_id, locale, Status::Published);
                row.merge(&patch);
                row.set(fields::CREATED_AT, now);
                let row = self.store.create(self.collection(), row)?;
                let id = row.id();
                Ok((row, RowWrite::Created(id)))
            }
        }
    }

    /// Undoes row writes, newest first. Failures are logged; the caller
    /// already has an error to report.
    fn rollback(&self, writes: Vec<RowWrite>) {
        for write in writes.into_iter().rev() {
            let id = write.id();
            let undone = match write {
                RowWrite::Created(id) => self
                    .store
                    .delete(self.collection(), &Filter::id(id))
                    .map(|_| ()),
                RowWrite::Updated(previous) => self
                    .store
                    .delete(self.collection(), &Filter::id(id))
                    .and_then(|_| self.store.create(self.collection(), previous))
                    .map(|_| ()),
            };
            match undone {
                Ok(()) => debug!(schema = %self.collection(), row = %id, "rolled back row write"),
                Err(e) => warn!(schema = %self.collection(), row = %id, error = %e, "failed to roll back row write"),
            }
        }
    }

    fn update_row(&self, current: &Record, patch: &Fields) -> CoreResult<Record> {
        self.store
            .update(self.collection(), &Filter::id(current.id()), patch)?
            .ok_or_else(|| {
                CoreError::invalid_operation(format!(
                    "row {} of {} was deleted during the update",
                    current.id(),
                    self.collection()
                ))
            })
    }

    fn check_locale(&self, locale: &str) -> CoreResult<()> {
        if self.schema().supports_locale(locale) {
            Ok(())
        } else {
            Err(CoreError::invalid_operation(format!(
                "locale {locale} is not supported by schema {}",
                self.collection()
            )))
        }
    }

    fn check_required(&self, document_id: &str, locale: &str, row: &Record) -> CoreResult<()> {
        let default = self.schema().default_locale();
        if locale == default {
            return validate_required(row, self.schema());
        }
        let default_row = self
            .find(document_id, default, Status::Draft)?
            .unwrap_or_else(|| new_row(document_id, default, Status::Draft));
        validate_required(&default_row, self.schema())
    }
}

impl std::fmt::Debug for Documents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Documents")
            .field("schema", &self.plan.schema.name)
            .finish_non_exhaustive()
    }
}

/// A row write that may have to be undone.
enum RowWrite {
    /// A new row was inserted.
    Created(RecordId),
    /// An existing row was patched; holds its previous state.
    Updated(Record),
}

impl RowWrite {
    fn id(&self) -> RecordId {
        match self {
            RowWrite::Created(id) => *id,
            RowWrite::Updated(previous) => previous.id(),
        }
    }
}

fn new_row(document_id: &str, locale: &str, status: Status) -> Record {
    Record::new()
        .with(fields::DOCUMENT_ID, document_id)
        .with(fields::LOCALE, locale)
        .with(fields::STATUS, status)
}

fn user_fields(data: &Fields) -> Fields {
    data.iter()
        .filter(|(name, _)| !fields::is_system(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn timestamp() -> Value {
    Value::from(i64::try_from(now_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::schema::FieldDescriptor;
    use crate::settings::{InMemorySettings, VersioningSettings};
    use polydoc_storage::{InMemoryStore, StorageError};

    struct Fixture {
        settings: Arc<InMemorySettings>,
        docs: Documents,
    }

    fn schema(versioned: bool) -> SchemaDescriptor {
        let builder = SchemaDescriptor::builder("post")
            .localized(["en", "fr"], "en")
            .field(FieldDescriptor::text("title").localized().required())
            .field(FieldDescriptor::text("slug").unique());
        let builder = if versioned { builder.versioned() } else { builder };
        builder.build().unwrap()
    }

    fn fixture(versioned: bool) -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let settings = Arc::new(InMemorySettings::new());
        let versions =
            Arc::new(VersionStore::new(store.clone(), settings.clone(), StoreConfig::default()).unwrap());
        let docs = Documents::register(store, versions, &schema(versioned)).unwrap();
        Fixture { settings, docs }
    }

    fn data(title: &str, slug: &str) -> Fields {
        Fields::from([
            ("title".to_string(), Value::from(title)),
            ("slug".to_string(), Value::from(slug)),
        ])
    }

    #[test]
    fn register_strips_standalone_uniqueness() {
        let f = fixture(true);
        assert_eq!(f.docs.plan().fields_converted, vec!["slug"]);
        assert!(!f.docs.schema().field("slug").unwrap().is_unique());
    }

    #[test]
    fn save_draft_creates_then_updates() {
        let f = fixture(true);
        let first = f.docs.save_draft("doc-1", "en", data("Hello", "hello"), Some("alice")).unwrap();
        assert_eq!(first.version.as_ref().unwrap().version_number, 1);
        assert!(!first.published());
        assert_eq!(first.row.text(fields::CREATED_BY), Some("alice"));

        let second = f.docs.save_draft("doc-1", "en", data("Hi", "hello"), None).unwrap();
        assert_eq!(second.row.id(), first.row.id());
        assert_eq!(second.row.text("title"), Some("Hi"));
        assert_eq!(second.version.unwrap().version_number, 2);
        assert_eq!(f.docs.list().count().unwrap(), 1);
    }

    #[test]
    fn system_fields_in_data_are_ignored() {
        let f = fixture(false);
        let mut input = data("Hello", "hello");
        input.insert(fields::STATUS.to_string(), Value::from("published"));
        input.insert(fields::DOCUMENT_ID.to_string(), Value::from("other"));
        let saved = f.docs.save_draft("doc-1", "en", input, None).unwrap();
        assert_eq!(saved.row.text(fields::STATUS), Some("draft"));
        assert_eq!(saved.row.text(fields::DOCUMENT_ID), Some("doc-1"));
        assert!(saved.version.is_none());
    }

    #[test]
    fn slug_is_scoped_to_default_locale_drafts() {
        let f = fixture(true);
        f.docs.save_draft("a", "en", data("A", "x"), None).unwrap();
        f.docs.save_draft("a", "fr", data("A fr", "x"), None).unwrap();
        f.docs.publish("a", "en", None).unwrap().unwrap();

        let err = f.docs.save_draft("b", "en", data("B", "x"), None).unwrap_err();
        assert!(err.is_duplicate_key());
        assert!(matches!(err, CoreError::Storage(StorageError::DuplicateKey { .. })));
    }

    #[test]
    fn required_fields_checked_in_default_locale() {
        let f = fixture(false);

        // Translation before the default locale is complete
        let err = f.docs.save_draft("doc-1", "fr", data("Bonjour", "bonjour"), None).unwrap_err();
        assert!(matches!(err, CoreError::MissingRequiredField { ref locale, .. } if locale == "en"));

        f.docs.save_draft("doc-1", "en", data("Hello", "hello"), None).unwrap();

        // A partial translation is fine once the default is complete
        let partial = Fields::from([("slug".to_string(), Value::from("bonjour"))]);
        f.docs.save_draft("doc-1", "fr", partial, None).unwrap();

        let err = f.docs.save_draft("doc-2", "en", Fields::new(), None).unwrap_err();
        assert!(matches!(err, CoreError::MissingRequiredField { ref field, .. } if field == "title"));
    }

    #[test]
    fn unsupported_locale_is_rejected() {
        let f = fixture(false);
        let err = f.docs.save_draft("doc-1", "de", data("Hallo", "hallo"), None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
    }

    #[test]
    fn publish_copies_draft() {
        let f = fixture(true);
        assert!(f.docs.publish("doc-1", "en", None).unwrap().is_none());

        f.docs.save_draft("doc-1", "en", data("Hello", "hello"), None).unwrap();
        let published = f.docs.publish("doc-1", "en", Some("editor")).unwrap().unwrap();
        assert_eq!(published.text(fields::STATUS), Some("published"));
        assert_eq!(published.text("title"), Some("Hello"));
        assert!(published.get(fields::PUBLISHED_AT).is_some());

        f.docs.save_draft("doc-1", "en", data("Hello again", "hello"), None).unwrap();
        let republished = f.docs.publish("doc-1", "en", None).unwrap().unwrap();
        assert_eq!(republished.id(), published.id());
        assert_eq!(republished.text("title"), Some("Hello again"));

        let latest = f
            .docs
            .versions()
            .find_latest_version("doc-1", "post", "en", Some(Status::Published))
            .unwrap()
            .unwrap();
        assert_eq!(latest.version_number, 4);
        assert_eq!(latest.created_by, None);
    }

    #[test]
    fn auto_publish_updates_published_row() {
        let f = fixture(true);
        f.settings.set_versioning(&VersioningSettings {
            auto_publish: true,
            ..VersioningSettings::default()
        });
        let outcome = f.docs.save_draft("doc-1", "en", data("Hello", "hello"), None).unwrap();
        assert!(outcome.published());
        assert!(f.docs.find("doc-1", "en", Status::Published).unwrap().is_some());
    }

    #[test]
    fn resolve_falls_back_to_default_locale() {
        let f = fixture(false);
        let mut en = data("Hello", "hello");
        en.insert("title".to_string(), Value::map([("en", "Hello"), ("fr", "Bonjour")]));
        f.docs.save_draft("doc-1", "en", en, None).unwrap();

        // No fr row: the en row is read through the fr locale
        let resolved = f.docs.resolve("doc-1", "fr", Status::Draft).unwrap().unwrap();
        assert_eq!(resolved["title"], Value::from("Bonjour"));

        let resolved = f.docs.resolve("doc-1", "en", Status::Draft).unwrap().unwrap();
        assert_eq!(resolved["title"], Value::from("Hello"));

        assert!(f.docs.resolve("doc-1", "fr", Status::Published).unwrap().is_none());
        assert!(f.docs.resolve("missing", "en", Status::Draft).unwrap().is_none());
    }
}

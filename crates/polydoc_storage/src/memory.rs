//! In-memory storage engine.

use crate::backend::DocumentStore;
use crate::error::{StorageError, StorageResult};
use crate::filter::{Filter, FindOptions};
use crate::index::{IndexDefinition, UniqueIndex};
use crate::record::{Fields, Record, RecordId, ID_FIELD};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Records and indexes of one collection.
#[derive(Debug, Default)]
struct CollectionState {
    /// Records in insertion order.
    records: Vec<Record>,
    /// Declared indexes, each with its key map.
    indexes: Vec<UniqueIndex>,
}

/// An in-memory storage engine.
///
/// This engine keeps every collection in memory and is suitable for:
/// - Unit and integration tests
/// - Command-line tooling and simulations
/// - Ephemeral stores that don't need persistence
///
/// Unique indexes (including partial ones) are enforced on every write.
/// Results without an explicit sort come back in insertion order.
///
/// # Fault injection
///
/// [`InMemoryStore::set_offline`] and [`InMemoryStore::fail_deletes_for`]
/// make operations fail with [`StorageError::Unavailable`], so callers'
/// error paths can be exercised in tests.
///
/// # Thread Safety
///
/// This engine is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use polydoc_storage::{DocumentStore, Filter, InMemoryStore, Record};
///
/// let store = InMemoryStore::new();
/// store.create("posts", Record::new().with("slug", "hello")).unwrap();
/// assert_eq!(store.count("posts", &Filter::All).unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, CollectionState>>,
    offline: AtomicBool,
    failing_deletes: RwLock<HashSet<RecordId>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |c| c.records.len())
    }

    /// Returns true if the collection holds no records.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Returns the names of all collections that have been touched.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Makes every operation fail with [`StorageError::Unavailable`] while
    /// `offline` is true.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes any delete that would remove `id` fail with
    /// [`StorageError::Unavailable`].
    pub fn fail_deletes_for(&self, id: RecordId) {
        self.failing_deletes.write().insert(id);
    }

    /// Clears all injected faults.
    pub fn clear_faults(&self) {
        self.set_offline(false);
        self.failing_deletes.write().clear();
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("store is offline".into()));
        }
        Ok(())
    }
}

impl DocumentStore for InMemoryStore {
    fn create(&self, collection: &str, record: Record) -> StorageResult<Record> {
        self.check_online()?;
        let mut collections = self.collections.write();
        let state = collections.entry(collection.to_string()).or_default();

        let id = record.id();
        if state.records.iter().any(|r| r.id() == id) {
            return Err(StorageError::duplicate_key(collection, ID_FIELD));
        }

        let keys: Vec<Option<Vec<_>>> = state
            .indexes
            .iter()
            .map(|index| index.definition().key_for(&record))
            .collect();

        // Check every index before touching any of them
        for (index, key) in state.indexes.iter().zip(&keys) {
            if let Some(key) = key {
                if !index.admits(key, id) {
                    return Err(StorageError::duplicate_key(collection, &index.definition().name));
                }
            }
        }

        for (index, key) in state.indexes.iter_mut().zip(keys) {
            if let Some(key) = key {
                index.insert(collection, key, id)?;
            }
        }

        state.records.push(record.clone());
        Ok(record)
    }

    fn find(&self, collection: &str, options: &FindOptions) -> StorageResult<Vec<Record>> {
        self.check_online()?;
        options.filter.validate_ids()?;

        let collections = self.collections.read();
        let Some(state) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Record> = state
            .records
            .iter()
            .filter(|r| options.filter.matches(r))
            .collect();

        if !options.sort.is_empty() {
            // Stable sort keeps insertion order among equal keys
            matched.sort_by(|a, b| options.sort.compare(a, b));
        }

        let skip = options.skip.map_or(0, |s| s as usize);
        let limit = options.limit.map_or(usize::MAX, |l| l as usize);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|r| match &options.projection {
                Some(fields) => r.project(fields),
                None => r.clone(),
            })
            .collect())
    }

    fn count(&self, collection: &str, filter: &Filter) -> StorageResult<u64> {
        self.check_online()?;
        filter.validate_ids()?;

        let collections = self.collections.read();
        Ok(collections.get(collection).map_or(0, |state| {
            state.records.iter().filter(|r| filter.matches(r)).count() as u64
        }))
    }

    fn update(&self, collection: &str, filter: &Filter, patch: &Fields) -> StorageResult<Option<Record>> {
        self.check_online()?;
        filter.validate_ids()?;

        let mut collections = self.collections.write();
        let Some(state) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = state.records.iter().position(|r| filter.matches(r)) else {
            return Ok(None);
        };

        let old = &state.records[pos];
        let id = old.id();
        let mut updated = old.clone();
        updated.merge(patch);

        let keys: Vec<(Option<Vec<_>>, Option<Vec<_>>)> = state
            .indexes
            .iter()
            .map(|index| {
                let def = index.definition();
                (def.key_for(old), def.key_for(&updated))
            })
            .collect();

        for (index, (old_key, new_key)) in state.indexes.iter().zip(&keys) {
            if let Some(new_key) = new_key {
                if old_key.as_ref() != Some(new_key) && !index.admits(new_key, id) {
                    return Err(StorageError::duplicate_key(collection, &index.definition().name));
                }
            }
        }

        for (index, (old_key, new_key)) in state.indexes.iter_mut().zip(keys) {
            if old_key == new_key {
                continue;
            }
            if let Some(old_key) = old_key {
                index.remove(&old_key, id);
            }
            if let Some(new_key) = new_key {
                index.insert(collection, new_key, id)?;
            }
        }

        state.records[pos] = updated.clone();
        Ok(Some(updated))
    }

    fn delete(&self, collection: &str, filter: &Filter) -> StorageResult<bool> {
        self.check_online()?;
        filter.validate_ids()?;

        let mut collections = self.collections.write();
        let Some(state) = collections.get_mut(collection) else {
            return Ok(false);
        };

        let doomed: Vec<RecordId> = state
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .map(Record::id)
            .collect();
        if doomed.is_empty() {
            return Ok(false);
        }

        {
            let failing = self.failing_deletes.read();
            if let Some(id) = doomed.iter().find(|id| failing.contains(*id)) {
                return Err(StorageError::Unavailable(format!("delete of {id} refused")));
            }
        }

        let CollectionState { records, indexes } = state;
        records.retain(|r| {
            if !doomed.contains(&r.id()) {
                return true;
            }
            for index in indexes.iter_mut() {
                if let Some(key) = index.definition().key_for(r) {
                    index.remove(&key, r.id());
                }
            }
            false
        });

        Ok(true)
    }

    fn ensure_index(&self, collection: &str, index: IndexDefinition) -> StorageResult<()> {
        self.check_online()?;
        let mut collections = self.collections.write();
        let state = collections.entry(collection.to_string()).or_default();

        if let Some(existing) = state.indexes.iter().find(|i| i.definition().name == index.name) {
            if *existing.definition() == index {
                return Ok(());
            }
            return Err(StorageError::IndexConflict { name: index.name });
        }

        debug!(collection, index = %index.name, unique = index.unique, "creating index");
        let built = UniqueIndex::build(index, collection, &state.records)?;
        state.indexes.push(built);
        Ok(())
    }

    fn drop_index(&self, collection: &str, name: &str) -> StorageResult<bool> {
        self.check_online()?;
        let mut collections = self.collections.write();
        let Some(state) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = state.indexes.len();
        state.indexes.retain(|i| i.definition().name != name);
        let dropped = state.indexes.len() != before;
        if dropped {
            debug!(collection, index = name, "dropped index");
        }
        Ok(dropped)
    }

    fn indexes(&self, collection: &str) -> StorageResult<Vec<IndexDefinition>> {
        self.check_online()?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|state| state.indexes.iter().map(|i| i.definition().clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortSpec;
    use crate::value::Value;

    fn partial_slug_index() -> IndexDefinition {
        IndexDefinition::new("slug_unique_default_draft", ["slug"])
            .unique()
            .partial(Filter::eq("locale", "en").and(Filter::eq("status", "draft")))
    }

    fn row(doc: &str, locale: &str, status: &str, slug: &str) -> Record {
        Record::new()
            .with("documentId", doc)
            .with("locale", locale)
            .with("status", status)
            .with("slug", slug)
    }

    #[test]
    fn create_and_find() {
        let store = InMemoryStore::new();
        let created = store.create("posts", Record::new().with("title", "a")).unwrap();

        let found = store.find_one("posts", &Filter::id(created.id())).unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(store.len("posts"), 1);
    }

    #[test]
    fn find_on_missing_collection_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.find_many("nothing", &Filter::All).unwrap().is_empty());
        assert_eq!(store.count("nothing", &Filter::All).unwrap(), 0);
        assert!(!store.delete("nothing", &Filter::All).unwrap());
    }

    #[test]
    fn duplicate_id_rejected() {
        let store = InMemoryStore::new();
        let record = Record::new();
        store.create("c", record.clone()).unwrap();
        assert!(store.create("c", record).unwrap_err().is_duplicate_key());
    }

    #[test]
    fn malformed_id_is_reported() {
        let store = InMemoryStore::new();
        let err = store.find_one("c", &Filter::eq(ID_FIELD, "bogus")).unwrap_err();
        assert!(err.is_invalid_id());
    }

    #[test]
    fn sort_skip_limit_project() {
        let store = InMemoryStore::new();
        for n in [3, 1, 2, 5, 4] {
            store.create("c", Record::new().with("n", n).with("x", "y")).unwrap();
        }

        let options = FindOptions::new(Filter::All)
            .sort(SortSpec::desc("n"))
            .skip(1)
            .limit(2)
            .projection(vec!["n".into()]);
        let found = store.find("c", &options).unwrap();

        let ns: Vec<_> = found.iter().map(|r| r.field("n").into_owned()).collect();
        assert_eq!(ns, vec![Value::from(4), Value::from(3)]);
        assert!(found.iter().all(|r| r.get("x").is_none()));
    }

    #[test]
    fn update_merges_first_match() {
        let store = InMemoryStore::new();
        store.create("c", Record::new().with("k", 1).with("v", "a")).unwrap();
        store.create("c", Record::new().with("k", 1).with("v", "b")).unwrap();

        let mut patch = Fields::new();
        patch.insert("v".into(), Value::from("z"));
        let updated = store.update("c", &Filter::eq("k", 1), &patch).unwrap().unwrap();
        assert_eq!(updated.text("v"), Some("z"));

        assert_eq!(store.count("c", &Filter::eq("v", "z")).unwrap(), 1);
        assert!(store.update("c", &Filter::eq("k", 2), &patch).unwrap().is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let store = InMemoryStore::new();
        let record = store.create("c", Record::new()).unwrap();
        assert!(store.delete("c", &Filter::id(record.id())).unwrap());
        assert!(!store.delete("c", &Filter::id(record.id())).unwrap());
    }

    #[test]
    fn partial_unique_index_scopes_by_locale_and_status() {
        let store = InMemoryStore::new();
        store.ensure_index("posts", partial_slug_index()).unwrap();

        store.create("posts", row("a", "en", "draft", "x")).unwrap();
        // Same document, other locale
        store.create("posts", row("a", "fr", "draft", "x")).unwrap();
        // Same document, other status
        store.create("posts", row("a", "en", "published", "x")).unwrap();
        // Different document in the constrained partition
        let err = store.create("posts", row("b", "en", "draft", "x")).unwrap_err();
        assert!(err.is_duplicate_key());

        store.create("posts", row("b", "en", "draft", "y")).unwrap();
    }

    #[test]
    fn update_cannot_steal_a_unique_key() {
        let store = InMemoryStore::new();
        store.ensure_index("posts", partial_slug_index()).unwrap();
        store.create("posts", row("a", "en", "draft", "x")).unwrap();
        store.create("posts", row("b", "en", "draft", "y")).unwrap();

        let mut patch = Fields::new();
        patch.insert("slug".into(), Value::from("x"));
        let err = store
            .update("posts", &Filter::eq("documentId", "b"), &patch)
            .unwrap_err();
        assert!(err.is_duplicate_key());

        // Record b is unchanged and its old key still held
        let b = store.find_one("posts", &Filter::eq("documentId", "b")).unwrap().unwrap();
        assert_eq!(b.text("slug"), Some("y"));
        assert!(store.create("posts", row("c", "en", "draft", "y")).is_err());
    }

    #[test]
    fn update_releases_old_key() {
        let store = InMemoryStore::new();
        store.ensure_index("posts", partial_slug_index()).unwrap();
        store.create("posts", row("a", "en", "draft", "x")).unwrap();

        let mut patch = Fields::new();
        patch.insert("slug".into(), Value::from("renamed"));
        store.update("posts", &Filter::eq("documentId", "a"), &patch).unwrap();

        store.create("posts", row("b", "en", "draft", "x")).unwrap();
    }

    #[test]
    fn delete_releases_key() {
        let store = InMemoryStore::new();
        store.ensure_index("posts", partial_slug_index()).unwrap();
        store.create("posts", row("a", "en", "draft", "x")).unwrap();
        store.delete("posts", &Filter::eq("documentId", "a")).unwrap();
        store.create("posts", row("b", "en", "draft", "x")).unwrap();
    }

    #[test]
    fn ensure_index_is_idempotent_and_detects_conflicts() {
        let store = InMemoryStore::new();
        store.ensure_index("c", partial_slug_index()).unwrap();
        store.ensure_index("c", partial_slug_index()).unwrap();
        assert_eq!(store.indexes("c").unwrap().len(), 1);

        let conflicting = IndexDefinition::new("slug_unique_default_draft", ["slug"]);
        assert!(matches!(
            store.ensure_index("c", conflicting),
            Err(StorageError::IndexConflict { .. })
        ));

        assert!(store.drop_index("c", "slug_unique_default_draft").unwrap());
        assert!(!store.drop_index("c", "slug_unique_default_draft").unwrap());
    }

    #[test]
    fn ensure_unique_index_over_conflicting_data_fails() {
        let store = InMemoryStore::new();
        store.create("c", Record::new().with("k", 1)).unwrap();
        store.create("c", Record::new().with("k", 1)).unwrap();
        let result = store.ensure_index("c", IndexDefinition::new("k_unique", ["k"]).unique());
        assert!(result.unwrap_err().is_duplicate_key());
        assert!(store.indexes("c").unwrap().is_empty());
    }

    #[test]
    fn fault_injection() {
        let store = InMemoryStore::new();
        let record = store.create("c", Record::new()).unwrap();

        store.fail_deletes_for(record.id());
        assert!(matches!(
            store.delete("c", &Filter::All),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(store.len("c"), 1);

        store.set_offline(true);
        assert!(store.find_many("c", &Filter::All).is_err());

        store.clear_faults();
        assert!(store.delete("c", &Filter::All).unwrap());
    }

    #[test]
    fn concurrent_creates() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store.create("c", Record::new().with("t", t).with("i", i)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len("c"), 400);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn unique_index_admits_each_key_once(
                slugs in prop::collection::vec("[a-c]{1,2}", 1..40)
            ) {
                let store = InMemoryStore::new();
                store.ensure_index("posts", partial_slug_index()).unwrap();

                let mut seen = HashSet::new();
                for (i, slug) in slugs.iter().enumerate() {
                    let result = store.create("posts", row(&format!("doc-{i}"), "en", "draft", slug));
                    if seen.insert(slug.clone()) {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert!(result.unwrap_err().is_duplicate_key());
                    }
                    // Rows outside the partial filter never collide
                    store.create("posts", row(&format!("doc-{i}"), "fr", "draft", slug)).unwrap();
                }
                prop_assert_eq!(store.len("posts"), seen.len() + slugs.len());
            }

            #[test]
            fn value_order_is_total(a in any::<i64>(), b in "[a-z]{0,4}") {
                let int = Value::Integer(a);
                let text = Value::Text(b);
                prop_assert!(Value::Null < int);
                prop_assert!(int < text);
                prop_assert_eq!(int.cmp(&text), text.cmp(&int).reverse());
            }
        }
    }
}

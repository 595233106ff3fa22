//! Storage port trait definition.

use crate::error::StorageResult;
use crate::filter::{Filter, FindOptions};
use crate::index::IndexDefinition;
use crate::record::{Fields, Record};

/// The persistence contract every polydoc storage engine implements.
///
/// Engines may be backed by a document database or a relational one. The
/// versioning core only assumes the operations below: composite filters,
/// sort, limit/skip, and (partial) unique indexes.
///
/// # Invariants
///
/// - `create` returns the record as stored
/// - Unique indexes are enforced on `create` and `update`
/// - A filter with a malformed `id` operand fails with
///   [`crate::StorageError::InvalidId`]
/// - `delete` of a record that no longer exists is not an error
/// - Engines must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and tooling
pub trait DocumentStore: Send + Sync {
    /// Inserts a new record into `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A record with the same identifier exists
    /// - A unique index would be violated
    /// - The engine is unavailable
    fn create(&self, collection: &str, record: Record) -> StorageResult<Record>;

    /// Returns the records matching `options`, sorted, skipped, limited and
    /// projected as requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter carries a malformed identifier or
    /// the engine is unavailable.
    fn find(&self, collection: &str, options: &FindOptions) -> StorageResult<Vec<Record>>;

    /// Counts the records matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter carries a malformed identifier or
    /// the engine is unavailable.
    fn count(&self, collection: &str, filter: &Filter) -> StorageResult<u64>;

    /// Merges `patch` into the first record matching `filter`.
    ///
    /// Returns the updated record, or `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if a unique index would be violated, the filter
    /// carries a malformed identifier, or the engine is unavailable.
    fn update(&self, collection: &str, filter: &Filter, patch: &Fields) -> StorageResult<Option<Record>>;

    /// Deletes every record matching `filter`.
    ///
    /// Returns `true` if at least one record was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter carries a malformed identifier or
    /// the engine is unavailable.
    fn delete(&self, collection: &str, filter: &Filter) -> StorageResult<bool>;

    /// Declares an index. Declaring an identical index again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An index with the same name but a different definition exists
    /// - Existing records already violate the unique definition
    fn ensure_index(&self, collection: &str, index: IndexDefinition) -> StorageResult<()>;

    /// Drops an index by name. Returns `false` if no such index exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable.
    fn drop_index(&self, collection: &str, name: &str) -> StorageResult<bool>;

    /// Lists the indexes declared on `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable.
    fn indexes(&self, collection: &str) -> StorageResult<Vec<IndexDefinition>>;

    /// Returns the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::find`].
    fn find_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Record>> {
        let options = FindOptions::new(filter.clone()).limit(1);
        Ok(self.find(collection, &options)?.into_iter().next())
    }

    /// Returns every record matching `filter`, in storage order.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::find`].
    fn find_many(&self, collection: &str, filter: &Filter) -> StorageResult<Vec<Record>> {
        self.find(collection, &FindOptions::new(filter.clone()))
    }
}

//! Retention of version history.

use crate::error::CoreResult;
use crate::query::QueryBuilder;
use crate::types::{fields, VersionKey};
use polydoc_storage::{DocumentStore, Filter, SortSpec};
use tracing::{debug, warn};

/// Outcome of one retention pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Versions found in the partition.
    pub examined: u64,
    /// Excess versions removed (or already gone).
    pub deleted: u64,
    /// Excess versions whose deletion failed.
    pub failed: u64,
}

impl CleanupReport {
    /// Returns true if every selected version was removed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Caps the number of versions kept per partition.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    collection: String,
}

impl RetentionPolicy {
    /// Creates a policy over the given versions collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    /// Deletes the oldest versions of `key` beyond `max_versions`.
    ///
    /// A `max_versions` of zero keeps everything. Individual delete
    /// failures are logged and counted; they never stop the pass.
    ///
    /// # Errors
    ///
    /// Returns an error only if counting or selecting the excess fails.
    pub fn enforce(
        &self,
        store: &dyn DocumentStore,
        key: &VersionKey,
        max_versions: u32,
    ) -> CoreResult<CleanupReport> {
        let query = QueryBuilder::new(store, self.collection.as_str()).filter(key.filter());
        let examined = query.count()?;
        let mut report = CleanupReport {
            examined,
            ..CleanupReport::default()
        };

        let max = u64::from(max_versions);
        if max == 0 || examined <= max {
            return Ok(report);
        }

        let excess = examined - max;
        let oldest = query
            .sort(SortSpec::asc(fields::VERSION_NUMBER))
            .limit(excess)
            .exec()?;

        for record in oldest {
            let id = record.id();
            // Concurrent passes may pick the same rows; a missing row is fine
            match store.delete(&self.collection, &Filter::id(id)) {
                Ok(_) => report.deleted += 1,
                Err(e) => {
                    warn!(version = %id, partition = %key, error = %e, "failed to delete old version");
                    report.failed += 1;
                }
            }
        }

        debug!(
            partition = %key,
            examined = report.examined,
            deleted = report.deleted,
            failed = report.failed,
            "retention pass"
        );
        Ok(report)
    }
}

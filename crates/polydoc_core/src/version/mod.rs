//! Version history.
//!
//! Every save of a document in one locale can be snapshotted as an
//! immutable [`Version`]. Versions are numbered `1, 2, 3, ...` per
//! `(documentId, schemaName, locale)` and move through
//! `draft -> published -> archived`. The [`RetentionPolicy`] keeps only
//! the newest `maxVersions` of each partition.

mod diff;
mod lock;
mod model;
mod retention;
mod store;

pub use diff::{compare, FieldChange};
pub use lock::KeyedLocks;
pub use model::{NewVersion, Version, VersionId};
pub use retention::{CleanupReport, RetentionPolicy};
pub use store::{VersionStore, VERSION_NUMBER_INDEX, VERSION_PARTITION_INDEX};

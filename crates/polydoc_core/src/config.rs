//! Store configuration.

/// Default name of the collection holding version snapshots.
pub const DEFAULT_VERSIONS_COLLECTION: &str = "versions";

/// Configuration for the version store.
///
/// This is process-level wiring. Behavioural switches such as drafts and
/// the retention cap come from [`crate::VersioningSettings`], which is
/// re-read at every decision point.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Collection that holds version snapshots.
    pub versions_collection: String,

    /// Retention cap used when the settings provider has no
    /// `maxVersions` entry.
    pub default_max_versions: u32,

    /// How many times version numbering is retried when a concurrent
    /// writer in another process claimed the same number.
    pub version_retry_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            versions_collection: DEFAULT_VERSIONS_COLLECTION.to_string(),
            default_max_versions: 20,
            version_retry_attempts: 3,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the versions collection name.
    #[must_use]
    pub fn versions_collection(mut self, name: impl Into<String>) -> Self {
        self.versions_collection = name.into();
        self
    }

    /// Sets the fallback retention cap.
    #[must_use]
    pub const fn default_max_versions(mut self, value: u32) -> Self {
        self.default_max_versions = value;
        self
    }

    /// Sets the number of numbering attempts (at least one is always made).
    #[must_use]
    pub const fn version_retry_attempts(mut self, value: u32) -> Self {
        self.version_retry_attempts = value;
        self
    }
}

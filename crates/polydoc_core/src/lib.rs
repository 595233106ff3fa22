//! # polydoc Core
//!
//! Versioned, localized document storage on top of the polydoc storage
//! port.
//!
//! This crate provides:
//! - Locale resolution with default-locale fallback ([`locale`])
//! - Uniqueness partitioning for multi-locale, multi-status rows ([`partition`])
//! - A fluent query builder ([`QueryBuilder`])
//! - Version history with gap-free numbering and retention ([`VersionStore`])
//! - A per-schema document service ([`Documents`])
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use polydoc_core::{InMemorySettings, NewVersion, StoreConfig, VersionStore};
//! use polydoc_storage::{Fields, InMemoryStore, Value};
//!
//! let store = Arc::new(InMemoryStore::new());
//! let settings = Arc::new(InMemorySettings::new());
//! let versions = VersionStore::new(store, settings, StoreConfig::default()).unwrap();
//!
//! let data = Fields::from([("title".to_string(), Value::from("Hello"))]);
//! let v1 = versions.create_version(NewVersion::new("doc-1", "post", data.clone())).unwrap();
//! let v2 = versions.create_version(NewVersion::new("doc-1", "post", data)).unwrap();
//! assert_eq!((v1.version_number, v2.version_number), (1, 2));
//!
//! let published = versions.publish_version(&v2.id.to_string()).unwrap();
//! assert_eq!(published.status.as_str(), "published");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod documents;
mod error;
pub mod locale;
pub mod partition;
mod query;
mod schema;
mod settings;
mod types;
mod version;

pub use config::{StoreConfig, DEFAULT_VERSIONS_COLLECTION};
pub use documents::{Documents, SaveOutcome};
pub use error::{CoreError, CoreResult};
pub use locale::{schema_default_locale, LocaleContext};
pub use partition::PartitionPlan;
pub use query::{Page, QueryBuilder};
pub use schema::{
    standalone_index_name, FieldDescriptor, FieldKind, LocalizationConfig, SchemaBuilder,
    SchemaDescriptor,
};
pub use settings::{
    keys, InMemorySettings, JsonSettings, Setting, SettingsProvider, VersioningSettings,
    VERSIONING_GROUP,
};
pub use types::{fields, Status, VersionKey, DEFAULT_LOCALE};
pub use version::{
    CleanupReport, FieldChange, KeyedLocks, NewVersion, RetentionPolicy, Version, VersionId,
    VersionStore, VERSION_NUMBER_INDEX, VERSION_PARTITION_INDEX,
};

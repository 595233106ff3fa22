//! # polydoc Storage
//!
//! The storage port consumed by the polydoc versioning core, plus an
//! in-memory reference engine.
//!
//! This crate is the lowest layer of polydoc. A storage engine only has
//! to understand records, filters, sort/limit/skip and (partial) unique
//! indexes. It knows nothing about locales, statuses or versions; those
//! live in `polydoc_core`.
//!
//! ## Design Principles
//!
//! - Engines are collection-scoped record stores addressed by name
//! - Composite filters, sort and pagination are part of the contract
//! - Unique indexes may carry a partial filter predicate
//! - Must be `Send + Sync` for concurrent access
//! - Malformed identifiers are reported as [`StorageError::InvalidId`]
//!
//! ## Available Engines
//!
//! - [`InMemoryStore`] - For testing, tooling and ephemeral stores
//!
//! ## Example
//!
//! ```rust
//! use polydoc_storage::{DocumentStore, Filter, InMemoryStore, Record};
//!
//! let store = InMemoryStore::new();
//! let record = Record::new().with("title", "hello").with("locale", "en");
//! store.create("posts", record).unwrap();
//!
//! let found = store.find_one("posts", &Filter::eq("locale", "en")).unwrap();
//! assert!(found.is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod filter;
mod index;
mod memory;
mod record;
mod value;

pub use backend::DocumentStore;
pub use error::{StorageError, StorageResult};
pub use filter::{Filter, FindOptions, SortOrder, SortSpec};
pub use index::{IndexDefinition, UniqueIndex};
pub use memory::InMemoryStore;
pub use record::{Fields, Record, RecordId, ID_FIELD};
pub use value::Value;

//! # polydoc Testkit
//!
//! Test utilities for polydoc.
//!
//! This crate provides:
//! - Test fixtures: wired stores, settings files and schemas
//! - Property-based test generators using proptest
//! - Concurrent write drivers for the version store
//!
//! ## Usage
//!
//! ```rust
//! use polydoc_testkit::prelude::*;
//!
//! with_test_store(|t| {
//!     let docs = t.documents(&schemas::post());
//!     let saved = docs
//!         .save_draft("doc-1", "en", field_map([("title", "Hello"), ("slug", "hello")]), None)
//!         .unwrap();
//!     assert_eq!(saved.version.unwrap().version_number, 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;

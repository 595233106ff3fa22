//! Simulate command implementation.
//!
//! Replays saves of a single document against the in-memory engine so the
//! effect of a retention cap can be inspected without a live store.

use polydoc_core::{
    InMemorySettings, StoreConfig, Version, VersionStore, VersioningSettings,
};
use polydoc_storage::{Fields, InMemoryStore, Value};
use serde::Serialize;
use std::sync::Arc;

/// Document the simulation writes to.
const DOCUMENT_ID: &str = "doc-1";

/// Schema the simulation writes to.
const SCHEMA_NAME: &str = "post";

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Number of saves to replay.
    pub saves: u32,
    /// Retention cap; 0 keeps everything.
    pub max_versions: u32,
    /// Locale of the saves.
    pub locale: String,
    /// Publish every save immediately.
    pub auto_publish: bool,
}

/// Outcome of a simulation.
#[derive(Debug, Serialize)]
pub struct SimulateReport {
    /// Saves replayed.
    pub saves: u32,
    /// Versions still stored, newest first.
    pub retained: Vec<Version>,
}

/// Replays the saves and returns what survived retention.
pub fn simulate(options: &SimulateOptions) -> Result<SimulateReport, Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryStore::new());
    let settings = Arc::new(InMemorySettings::with_versioning(&VersioningSettings {
        max_versions: options.max_versions,
        auto_publish: options.auto_publish,
        ..VersioningSettings::default()
    }));
    let versions = VersionStore::new(store, settings, StoreConfig::default())?;

    for revision in 1..=options.saves {
        let data = Fields::from([(
            "title".to_string(),
            Value::from(format!("revision {revision}")),
        )]);
        versions.record_save(DOCUMENT_ID, SCHEMA_NAME, data, &options.locale, Some("simulator"))?;
    }

    let retained = versions.find_versions_by_locale(DOCUMENT_ID, SCHEMA_NAME, &options.locale)?;
    Ok(SimulateReport {
        saves: options.saves,
        retained,
    })
}

/// Runs the simulate command.
pub fn run(options: &SimulateOptions, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = simulate(options)?;

    if format == "json" {
        return super::print_json(&report);
    }

    println!(
        "Replayed {} saves of {}/{} in {} (max versions {})",
        report.saves, SCHEMA_NAME, DOCUMENT_ID, options.locale, options.max_versions
    );
    println!("Retained {} versions:", report.retained.len());
    for version in &report.retained {
        let title = version
            .data
            .get("title")
            .and_then(Value::as_text)
            .unwrap_or("");
        println!(
            "  v{:<4} {:<10} {}",
            version.version_number, version.status.as_str(), title
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydoc_core::Status;

    fn options(saves: u32, max_versions: u32) -> SimulateOptions {
        SimulateOptions {
            saves,
            max_versions,
            locale: "en".to_string(),
            auto_publish: false,
        }
    }

    #[test]
    fn retention_keeps_the_newest() {
        let report = simulate(&options(3, 2)).unwrap();
        let numbers: Vec<u64> = report.retained.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![3, 2]);
    }

    #[test]
    fn zero_cap_keeps_everything() {
        let report = simulate(&options(25, 0)).unwrap();
        assert_eq!(report.retained.len(), 25);
    }

    #[test]
    fn auto_publish_marks_saves_published() {
        let mut opts = options(2, 5);
        opts.auto_publish = true;
        let report = simulate(&opts).unwrap();
        assert!(report
            .retained
            .iter()
            .all(|v| v.status == Status::Published));
    }
}

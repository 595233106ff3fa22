//! Settings command implementation.

use polydoc_core::{JsonSettings, Status, VersioningSettings};
use serde::Serialize;
use std::path::Path;

/// Effective versioning settings of a settings file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsReport {
    /// Parsed settings with defaults filled in.
    #[serde(flatten)]
    pub settings: VersioningSettings,
    /// Status a new save starts in.
    pub initial_status: Status,
}

/// Loads and validates a settings file.
pub fn build_report(
    path: &Path,
    default_max_versions: u32,
) -> Result<SettingsReport, Box<dyn std::error::Error>> {
    let provider = JsonSettings::from_path(path)?;
    let settings = VersioningSettings::load(&provider, default_max_versions)?;
    Ok(SettingsReport {
        settings,
        initial_status: settings.initial_status(),
    })
}

/// Runs the settings command.
pub fn run(
    path: &Path,
    default_max_versions: u32,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = build_report(path, default_max_versions)?;

    if format == "json" {
        return super::print_json(&report);
    }

    let s = &report.settings;
    println!("Settings file: {:?}", path);
    println!("  drafts enabled:   {}", s.drafts_enabled);
    println!("  require approval: {}", s.require_approval);
    println!("  auto publish:     {}", s.auto_publish);
    if s.max_versions == 0 {
        println!("  max versions:     unlimited");
    } else {
        println!("  max versions:     {}", s.max_versions);
    }
    println!("New saves start as: {}", report.initial_status);

    Ok(())
}

//! Partition command implementation.

use polydoc_core::partition::partition;
use polydoc_core::SchemaDescriptor;
use polydoc_storage::IndexDefinition;
use serde::Serialize;
use std::path::Path;

/// Partition plan of one schema file.
#[derive(Debug, Serialize)]
pub struct PartitionReport {
    /// Schema name.
    pub schema: String,
    /// Default locale of the schema.
    pub default_locale: String,
    /// Fields whose uniqueness moved into partial indexes.
    pub fields_converted: Vec<String>,
    /// Indexes dropped before the new ones are declared.
    pub indexes_to_drop: Vec<String>,
    /// Every index the collection carries afterwards.
    pub indexes: Vec<IndexDefinition>,
}

/// Parses `json` as a schema and plans its partitioning.
pub fn build_report(json: &str) -> Result<PartitionReport, Box<dyn std::error::Error>> {
    let schema: SchemaDescriptor = serde_json::from_str(json)?;
    let plan = partition(&schema)?;
    Ok(PartitionReport {
        schema: schema.name.clone(),
        default_locale: schema.default_locale().to_string(),
        fields_converted: plan.fields_converted.clone(),
        indexes_to_drop: plan.indexes_to_drop.clone(),
        indexes: plan.effective_indexes(),
    })
}

/// Runs the partition command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read schema {:?}: {}", path, e))?;
    let report = build_report(&json)?;

    if format == "json" {
        return super::print_json(&report);
    }

    println!("Schema: {} (default locale {})", report.schema, report.default_locale);
    if report.fields_converted.is_empty() {
        println!("No unique fields partitioned");
    } else {
        println!("Partitioned fields: {}", report.fields_converted.join(", "));
    }
    for name in &report.indexes_to_drop {
        println!("  drop   {}", name);
    }
    for index in &report.indexes {
        let kind = if index.unique { "unique" } else { "index" };
        let scope = if index.partial_filter.is_some() {
            " (default-locale drafts only)"
        } else {
            ""
        };
        println!("  {:<6} {} on ({}){}", kind, index.name, index.fields.join(", "), scope);
    }

    Ok(())
}

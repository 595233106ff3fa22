//! Uniqueness partitioning.
//!
//! On localized or versioned schemas one logical document is stored as
//! several rows (one per locale and status). A plain unique index on a
//! field such as `slug` would make those rows collide with each other.
//! The partitioner replaces each such index with a partial unique index
//! that only covers default-locale draft rows, so distinct documents still
//! cannot share a value while the copies of one document can.
//!
//! ```text
//! slug unique            ->  slug_unique_default_draft
//!                            unique (slug)
//!                            where locale = <default> and status = draft
//! ```

use crate::error::CoreResult;
use crate::schema::{standalone_index_name, SchemaDescriptor};
use crate::types::{fields, Status};
use polydoc_storage::{DocumentStore, Filter, IndexDefinition};
use tracing::{debug, info};

/// Name of the unique index enforcing one row per document, locale and status.
pub const IDENTITY_INDEX: &str = "documentId_locale_status_unique";

/// Name of the `(documentId, locale)` access index.
pub const DOCUMENT_LOCALE_INDEX: &str = "documentId_locale";

/// Name of the `(status, locale)` access index.
pub const STATUS_LOCALE_INDEX: &str = "status_locale";

/// Name of the partitioned unique index for `field`.
pub fn partitioned_index_name(field: &str) -> String {
    format!("{field}_unique_default_draft")
}

/// Result of partitioning one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPlan {
    /// The schema with standalone uniqueness stripped from converted fields.
    pub schema: SchemaDescriptor,
    /// Fields whose uniqueness was moved into a partial index.
    pub fields_converted: Vec<String>,
    /// Indexes to declare.
    pub indexes_to_create: Vec<IndexDefinition>,
    /// Names of pre-existing indexes to drop first.
    pub indexes_to_drop: Vec<String>,
}

impl PartitionPlan {
    /// A plan that leaves `schema` as it is.
    pub fn unchanged(schema: SchemaDescriptor) -> Self {
        Self {
            schema,
            fields_converted: Vec::new(),
            indexes_to_create: Vec::new(),
            indexes_to_drop: Vec::new(),
        }
    }

    /// Returns true if partitioning changed nothing.
    pub fn is_unchanged(&self) -> bool {
        self.fields_converted.is_empty()
            && self.indexes_to_create.is_empty()
            && self.indexes_to_drop.is_empty()
    }

    /// Every index the collection should carry once the plan is applied:
    /// the planned indexes, the schema's remaining declared indexes and
    /// standalone indexes of fields that kept their uniqueness.
    pub fn effective_indexes(&self) -> Vec<IndexDefinition> {
        let mut out = self.indexes_to_create.clone();
        for index in self
            .schema
            .indexes
            .iter()
            .cloned()
            .chain(self.schema.standalone_indexes())
        {
            if !out.iter().any(|existing| existing.name == index.name) {
                out.push(index);
            }
        }
        out
    }
}

/// Partitions the unique fields of `schema`.
///
/// Schemas with neither localization nor versioning come back unchanged.
///
/// # Errors
///
/// Returns [`crate::CoreError::Configuration`] if the schema is invalid,
/// e.g. its default locale is not one of its locales.
pub fn partition(schema: &SchemaDescriptor) -> CoreResult<PartitionPlan> {
    schema.validate()?;

    if !schema.is_localized() && !schema.versioning {
        debug!(schema = %schema.name, "schema is neither localized nor versioned");
        return Ok(PartitionPlan::unchanged(schema.clone()));
    }

    let mut plan = PartitionPlan::unchanged(schema.clone());
    let scope = Filter::all_of([
        Filter::eq(fields::LOCALE, schema.default_locale()),
        Status::Draft.filter(),
    ]);

    for field in plan.schema.fields.iter_mut() {
        if !field.is_unique() || fields::is_system(&field.name) {
            continue;
        }
        field.unique = false;
        field.unique_index = false;
        plan.fields_converted.push(field.name.clone());
        plan.indexes_to_create.push(
            IndexDefinition::new(partitioned_index_name(&field.name), [field.name.as_str()])
                .unique()
                .partial(scope.clone()),
        );
        plan.indexes_to_drop.push(standalone_index_name(&field.name));
    }

    // Declared indexes on exactly one converted field would clash with the
    // partitioned index; they go too.
    let converted = plan.fields_converted.clone();
    plan.schema.indexes.retain(|index| {
        let clashes = index.unique
            && matches!(index.fields.as_slice(), [only] if converted.contains(only));
        if clashes && !plan.indexes_to_drop.contains(&index.name) {
            plan.indexes_to_drop.push(index.name.clone());
        }
        !clashes
    });

    plan.indexes_to_create.push(
        IndexDefinition::new(
            IDENTITY_INDEX,
            [fields::DOCUMENT_ID, fields::LOCALE, fields::STATUS],
        )
        .unique(),
    );
    plan.indexes_to_create.push(IndexDefinition::new(
        DOCUMENT_LOCALE_INDEX,
        [fields::DOCUMENT_ID, fields::LOCALE],
    ));
    plan.indexes_to_create.push(IndexDefinition::new(
        STATUS_LOCALE_INDEX,
        [fields::STATUS, fields::LOCALE],
    ));

    debug!(
        schema = %schema.name,
        converted = ?plan.fields_converted,
        "partitioned unique fields"
    );
    Ok(plan)
}

/// Applies `plan` to `collection`: drops the listed indexes (missing ones
/// are ignored), then declares every effective index.
///
/// # Errors
///
/// Returns an error if the store fails or existing rows already violate a
/// new unique index.
pub fn apply(plan: &PartitionPlan, store: &dyn DocumentStore, collection: &str) -> CoreResult<()> {
    for name in &plan.indexes_to_drop {
        let dropped = store.drop_index(collection, name)?;
        debug!(collection, index = %name, dropped, "drop index");
    }

    let indexes = plan.effective_indexes();
    for index in &indexes {
        debug!(collection, index = %index.name, unique = index.unique, "ensure index");
        store.ensure_index(collection, index.clone())?;
    }

    info!(
        collection,
        schema = %plan.schema.name,
        indexes = indexes.len(),
        dropped = plan.indexes_to_drop.len(),
        "partition applied"
    );
    Ok(())
}

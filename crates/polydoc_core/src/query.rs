//! Fluent query construction over a [`DocumentStore`] collection.
//!
//! ```rust
//! use polydoc_core::QueryBuilder;
//! use polydoc_storage::{DocumentStore, Filter, InMemoryStore, Record, SortSpec};
//!
//! let store = InMemoryStore::new();
//! store.create("posts", Record::new().with("locale", "en").with("rank", 2)).unwrap();
//! store.create("posts", Record::new().with("locale", "fr").with("rank", 1)).unwrap();
//!
//! let page = QueryBuilder::new(&store, "posts")
//!     .filter(Filter::gte("rank", 1))
//!     .sort(SortSpec::asc("rank"))
//!     .limit(1)
//!     .skip(1)
//!     .paginate()
//!     .unwrap();
//! assert_eq!(page.total, 2);
//! assert_eq!(page.page, Some(2));
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{fields, Status};
use polydoc_storage::{DocumentStore, Filter, FindOptions, Record, SortSpec, StorageResult};
use tracing::debug;

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Records on this page.
    pub data: Vec<T>,
    /// Matching records across all pages.
    pub total: u64,
    /// One-based page number; set only when both limit and skip are.
    pub page: Option<u64>,
    /// Page size, if limited.
    pub limit: Option<u64>,
}

impl<T> Page<T> {
    /// Converts every item on the page.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            data: self.data.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// A chainable query against one collection.
///
/// Every method consumes and returns the builder. Filters added with
/// [`filter`](Self::filter), [`and`](Self::and), [`or`](Self::or) and the
/// context setters are combined with AND.
///
/// A filter on `id` whose operand is not a valid identifier is a normal
/// not-found case: terminal operations return an empty result instead of
/// an error.
#[derive(Clone)]
#[must_use]
pub struct QueryBuilder<'a> {
    store: &'a dyn DocumentStore,
    collection: String,
    options: FindOptions,
}

impl<'a> QueryBuilder<'a> {
    /// Starts a query matching every record in `collection`.
    pub fn new(store: &'a dyn DocumentStore, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            options: FindOptions::default(),
        }
    }

    /// Replaces the filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.options.filter = filter;
        self
    }

    /// Adds a condition.
    pub fn and(mut self, filter: Filter) -> Self {
        self.options.filter = std::mem::take(&mut self.options.filter).and(filter);
        self
    }

    /// Adds a condition satisfied by any of `filters`.
    pub fn or(self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.and(Filter::Or(filters.into_iter().collect()))
    }

    /// Restricts to records in `locale`.
    pub fn locale(self, locale: &str) -> Self {
        self.and(Filter::eq(fields::LOCALE, locale))
    }

    /// Restricts to records in `status`.
    pub fn status(self, status: Status) -> Self {
        self.and(status.filter())
    }

    /// Restricts to one version number.
    pub fn version(self, number: u64) -> Self {
        self.and(Filter::eq(fields::VERSION_NUMBER, number as i64))
    }

    /// Sets the sort order.
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.options.sort = sort;
        self
    }

    /// Sets the maximum number of results.
    pub fn limit(mut self, limit: u64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Sets the number of results to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    /// Keeps only the given fields (the identifier is always kept).
    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.options.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the options this builder will run with.
    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Runs the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn exec(&self) -> CoreResult<Vec<Record>> {
        let found = self.store.find(&self.collection, &self.options);
        Ok(self.or_not_found(found)?.unwrap_or_default())
    }

    /// Runs the query and returns the first result.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn exec_one(&self) -> CoreResult<Option<Record>> {
        let options = self.options.clone().limit(1);
        let found = self.store.find(&self.collection, &options);
        Ok(self.or_not_found(found)?.and_then(|r| r.into_iter().next()))
    }

    /// Runs the query and converts each record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a record does not convert.
    pub fn exec_as<T>(&self) -> CoreResult<Vec<T>>
    where
        T: TryFrom<Record, Error = CoreError>,
    {
        self.exec()?.into_iter().map(T::try_from).collect()
    }

    /// Runs the query and converts the first result.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the record does not convert.
    pub fn exec_one_as<T>(&self) -> CoreResult<Option<T>>
    where
        T: TryFrom<Record, Error = CoreError>,
    {
        self.exec_one()?.map(T::try_from).transpose()
    }

    /// Counts matching records, ignoring limit and skip.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn count(&self) -> CoreResult<u64> {
        let counted = self.store.count(&self.collection, &self.options.filter);
        Ok(self.or_not_found(counted)?.unwrap_or(0))
    }

    /// Returns true if at least one record matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn exists(&self) -> CoreResult<bool> {
        Ok(self.exec_one()?.is_some())
    }

    /// Runs the query and reports the total alongside the page.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn paginate(&self) -> CoreResult<Page<Record>> {
        let total = self.count()?;
        let data = self.exec()?;
        let page = match (self.options.limit, self.options.skip) {
            (Some(limit), Some(skip)) if limit > 0 => Some(skip / limit + 1),
            _ => None,
        };
        Ok(Page {
            data,
            total,
            page,
            limit: self.options.limit,
        })
    }

    fn or_not_found<T>(&self, result: StorageResult<T>) -> CoreResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_invalid_id() => {
                debug!(collection = %self.collection, error = %e, "malformed identifier, treating as not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("collection", &self.collection)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

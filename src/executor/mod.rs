//! Executor module for InsightQL queries.
//!
//! Provides the [`DatasetSource`] trait the engine queries against, an
//! in-memory catalog implementation, and the result-size cap.

mod engine;
mod helpers;

pub use engine::QueryEngine;
pub use helpers::{compare_values, round2};

use serde::Serialize;

use crate::dataset::{Dataset, DatasetKind};
use crate::error::{QueryError, QueryResult};

/// Maximum number of rows a query may return; anything above this fails the
/// whole query with [`QueryError::ResultTooLarge`].
pub const RESULT_LIMIT: usize = 5000;

/// Trait for dataset catalogs the engine can resolve datasets from.
///
/// The engine only reads: it borrows a dataset immutably for the duration of
/// one query. Serializing catalog mutation against in-flight queries is the
/// implementor's concern.
pub trait DatasetSource {
    /// Resolve a dataset by id.
    fn resolve(&self, id: &str) -> Option<&Dataset>;

    /// Check whether a dataset id is present.
    fn contains(&self, id: &str) -> bool {
        self.resolve(id).is_some()
    }

    /// Summaries of all held datasets.
    fn list(&self) -> Vec<DatasetSummary>;
}

/// Catalog-level view of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub id: String,
    pub kind: DatasetKind,
    pub num_rows: usize,
}

/// In-memory dataset catalog.
#[derive(Default)]
pub struct InMemoryCatalog {
    datasets: Vec<Dataset>,
}

impl InMemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset. The id must be non-blank, free of the `_` reference
    /// separator, and not already present. Returns the ids held afterwards.
    pub fn add(&mut self, dataset: Dataset) -> QueryResult<Vec<String>> {
        Self::check_id(&dataset.id)?;
        if self.contains(&dataset.id) {
            return Err(QueryError::InvalidDataset(format!(
                "Dataset with ID '{}' already added",
                dataset.id
            )));
        }
        self.datasets.push(dataset);
        Ok(self
            .datasets
            .iter()
            .map(|dataset| dataset.id.clone())
            .collect())
    }

    /// Remove a dataset by id, returning the removed id.
    pub fn remove(&mut self, id: &str) -> QueryResult<String> {
        Self::check_id(id)?;
        let position = self
            .datasets
            .iter()
            .position(|dataset| dataset.id == id)
            .ok_or_else(|| QueryError::DatasetNotFound(id.to_string()))?;
        self.datasets.remove(position);
        Ok(id.to_string())
    }

    fn check_id(id: &str) -> QueryResult<()> {
        if id.trim().is_empty() || id.contains('_') {
            return Err(QueryError::InvalidDataset(
                "Dataset ID cannot contain underscore or only whitespace".to_string(),
            ));
        }
        Ok(())
    }
}

impl DatasetSource for InMemoryCatalog {
    fn resolve(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|dataset| dataset.id == id)
    }

    fn list(&self) -> Vec<DatasetSummary> {
        self.datasets
            .iter()
            .map(|dataset| DatasetSummary {
                id: dataset.id.clone(),
                kind: dataset.kind,
                num_rows: dataset.rows.len(),
            })
            .collect()
    }
}

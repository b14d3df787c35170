//! InsightQL Core - Storage-independent query validator and evaluation engine.
//!
//! This crate answers structured queries over two flat, in-memory tabular
//! dataset kinds (academic course sections and campus rooms) using a
//! JSON-shaped query grammar: selection (`WHERE`), grouping and aggregation
//! (`TRANSFORMATIONS`), projection and ordering (`OPTIONS`). Dataset
//! ingestion and persistence are external collaborators; the engine only
//! consumes a [`DatasetSource`].
//!
//! # Main Components
//!
//! - **Field catalog**: which fields exist per dataset kind, numeric or textual
//! - **Query grammar**: validation and binding of the query document
//! - **Engine**: filtering, grouping/aggregation, projection, ordering, and
//!   the 5000-row result cap
//!
//! # Example
//!
//! ```rust
//! use insightql_core::{Dataset, InMemoryCatalog, QueryEngine, Section};
//! use serde_json::json;
//!
//! // Build an in-memory catalog
//! let mut catalog = InMemoryCatalog::new();
//! catalog.add(Dataset::courses("courses", vec![
//!     Section::new("cpsc", "310", "smith", "software eng", "1001", 92.5, 80.0, 4.0, 2.0, 2015.0),
//!     Section::new("math", "100", "jones", "calculus", "1002", 71.0, 120.0, 30.0, 0.0, 2015.0),
//! ])).unwrap();
//!
//! // Evaluate a query
//! let engine = QueryEngine::new(catalog);
//! let rows = engine.evaluate(&json!({
//!     "WHERE": { "GT": { "courses_avg": 90 } },
//!     "OPTIONS": { "COLUMNS": ["courses_dept", "courses_avg"] }
//! })).unwrap();
//! assert_eq!(rows, vec![json!({"courses_dept": "cpsc", "courses_avg": 92.5})]);
//! ```

pub mod dataset;
pub mod error;
pub mod executor;
pub mod fields;
pub mod query;

// Re-export main types for convenience
pub use dataset::{Dataset, DatasetKind, Room, Row, Section};
pub use error::{QueryError, QueryResult};
pub use executor::{
    DatasetSource, DatasetSummary, InMemoryCatalog, QueryEngine, RESULT_LIMIT,
};
pub use fields::{CourseField, Field, FieldKind, FieldValue, RoomField};
pub use query::{
    ApplyColumn, ApplyToken, Column, CompareOp, Filter, GroupKey, Options, Order, Query,
    Transformations, WildcardPattern,
};

//! The query engine: resolve, bind, filter, transform, project, sort, cap.
//!
//! Evaluation is synchronous and single-threaded per query. The source
//! dataset is only borrowed immutably; every output row is built fresh.

use std::collections::{HashMap, HashSet};

use rust_decimal::prelude::{Decimal, FromPrimitive, ToPrimitive};
use serde_json::{Map, Value};
use tracing::debug;

use crate::dataset::Row;
use crate::error::{QueryError, QueryResult};
use crate::fields::FieldValue;
use crate::query::{
    self, ApplyColumn, ApplyToken, BindContext, Column, GroupKey, Order, Query, Transformations,
};

use super::helpers::{compare_values, round2};
use super::{DatasetSource, RESULT_LIMIT};

/// One projected output row, in requested-column order.
type OutputRow = Map<String, Value>;

/// Evaluates query documents against a [`DatasetSource`].
pub struct QueryEngine<D: DatasetSource> {
    source: D,
}

impl<D: DatasetSource> QueryEngine<D> {
    /// Create a new engine over the given dataset source.
    pub fn new(source: D) -> Self {
        Self { source }
    }

    /// Access the underlying dataset source.
    pub fn source(&self) -> &D {
        &self.source
    }

    /// Mutable access to the underlying dataset source, for catalogs that
    /// support add/remove.
    pub fn source_mut(&mut self) -> &mut D {
        &mut self.source
    }

    /// Evaluate a query document.
    ///
    /// # Arguments
    /// * `doc` - The JSON query document (WHERE / OPTIONS / TRANSFORMATIONS)
    ///
    /// # Returns
    /// The ordered, projected output rows as JSON objects
    pub fn evaluate(&self, doc: &Value) -> QueryResult<Vec<Value>> {
        let dataset_id = query::referenced_dataset(doc)?;
        let dataset = self
            .source
            .resolve(&dataset_id)
            .ok_or_else(|| QueryError::DatasetNotFound(dataset_id.clone()))?;
        let ctx = BindContext {
            id: &dataset_id,
            kind: dataset.kind,
        };
        let plan = Query::parse(doc, &ctx)?;
        debug!(dataset = %dataset_id, rows = dataset.rows.len(), "evaluating query");

        let filtered: Vec<&Row> = dataset
            .rows
            .iter()
            .filter(|row| plan.filter.matches(row))
            .collect();

        let mut rows = match &plan.transformations {
            Some(transformations) => {
                let groups = group_rows(&filtered, &transformations.group);
                project_groups(&groups, transformations, &plan.options.columns)
            }
            None => project_rows(&filtered, &plan.options.columns),
        };

        if let Some(order) = &plan.options.order {
            sort_rows(&mut rows, order);
        }

        if rows.len() > RESULT_LIMIT {
            return Err(QueryError::ResultTooLarge(rows.len()));
        }
        debug!(results = rows.len(), "query complete");
        Ok(rows.into_iter().map(Value::Object).collect())
    }
}

/// Stable-partition rows by the canonical string form of the GROUP tuple.
/// Groups keep first-occurrence order; members keep their input order.
fn group_rows<'a>(rows: &[&'a Row], keys: &[GroupKey]) -> Vec<Vec<&'a Row>> {
    let mut groups: Vec<Vec<&Row>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let tuple = keys
            .iter()
            .map(|key| {
                row.get(key.field)
                    .map(|value| value.canonical())
                    .unwrap_or_else(|| "null".to_string())
            })
            .collect::<Vec<_>>()
            .join("|");
        match index.get(&tuple) {
            Some(&position) => groups[position].push(row),
            None => {
                index.insert(tuple, groups.len());
                groups.push(vec![row]);
            }
        }
    }
    groups
}

/// Project grouped pseudo-rows: GROUP values keyed by their qualified
/// reference merged with one entry per apply column.
fn project_groups(
    groups: &[Vec<&Row>],
    transformations: &Transformations,
    columns: &[Column],
) -> Vec<OutputRow> {
    groups
        .iter()
        .map(|group| {
            let mut pseudo: HashMap<&str, Value> = HashMap::new();
            if let Some(first) = group.first() {
                for key in &transformations.group {
                    if let Some(value) = first.get(key.field) {
                        pseudo.insert(key.reference.as_str(), value.to_json());
                    }
                }
            }
            for apply in &transformations.apply {
                pseudo.insert(apply.name.as_str(), compute_aggregate(apply, group).to_json());
            }

            let mut out = OutputRow::new();
            for column in columns {
                if let Some(value) = pseudo.get(column.name.as_str()) {
                    out.insert(column.name.clone(), value.clone());
                }
            }
            out
        })
        .collect()
}

/// Project raw filtered rows onto the requested columns.
fn project_rows(rows: &[&Row], columns: &[Column]) -> Vec<OutputRow> {
    rows.iter()
        .map(|row| {
            let mut out = OutputRow::new();
            for column in columns {
                if let Some(field) = column.field {
                    if let Some(value) = row.get(field) {
                        out.insert(column.name.clone(), value.to_json());
                    }
                }
            }
            out
        })
        .collect()
}

/// Compute one aggregate column over a non-empty group.
fn compute_aggregate(apply: &ApplyColumn, group: &[&Row]) -> FieldValue {
    match apply.token {
        ApplyToken::Max => {
            let mut max = f64::NEG_INFINITY;
            for row in group {
                if let Some(FieldValue::Number(n)) = row.get(apply.field) {
                    if n > max {
                        max = n;
                    }
                }
            }
            FieldValue::Number(max)
        }
        ApplyToken::Min => {
            let mut min = f64::INFINITY;
            for row in group {
                if let Some(FieldValue::Number(n)) = row.get(apply.field) {
                    if n < min {
                        min = n;
                    }
                }
            }
            FieldValue::Number(min)
        }
        ApplyToken::Sum => {
            let mut sum = 0.0;
            for row in group {
                if let Some(FieldValue::Number(n)) = row.get(apply.field) {
                    sum += n;
                }
            }
            FieldValue::Number(round2(sum))
        }
        ApplyToken::Avg => {
            // Decimal accumulation keeps long sums exact before the divide.
            let mut total = Decimal::ZERO;
            let mut count = 0u64;
            for row in group {
                if let Some(FieldValue::Number(n)) = row.get(apply.field) {
                    if let Some(d) = Decimal::from_f64(n) {
                        total += d;
                        count += 1;
                    }
                }
            }
            if count == 0 {
                return FieldValue::Number(0.0);
            }
            let avg = total.to_f64().unwrap_or(0.0) / count as f64;
            FieldValue::Number(round2(avg))
        }
        ApplyToken::Count => {
            let mut seen: HashSet<String> = HashSet::new();
            for row in group {
                if let Some(value) = row.get(apply.field) {
                    seen.insert(value.canonical());
                }
            }
            FieldValue::Number(seen.len() as f64)
        }
    }
}

/// Sort projected rows in place. `Vec::sort_by` is stable, so ties keep the
/// upstream order.
fn sort_rows(rows: &mut [OutputRow], order: &Order) {
    match order {
        Order::Column(key) => rows.sort_by(|a, b| {
            compare_values(
                a.get(key).unwrap_or(&Value::Null),
                b.get(key).unwrap_or(&Value::Null),
            )
        }),
        Order::Keyed { descending, keys } => rows.sort_by(|a, b| {
            for key in keys {
                let ordering = compare_values(
                    a.get(key).unwrap_or(&Value::Null),
                    b.get(key).unwrap_or(&Value::Null),
                );
                if ordering != std::cmp::Ordering::Equal {
                    return if *descending {
                        ordering.reverse()
                    } else {
                        ordering
                    };
                }
            }
            std::cmp::Ordering::Equal
        }),
    }
}

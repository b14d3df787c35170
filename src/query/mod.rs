//! The InsightQL query document grammar.
//!
//! A query is a JSON object with a `WHERE` filter tree, an `OPTIONS` clause
//! (COLUMNS projection plus optional ORDER) and an optional
//! `TRANSFORMATIONS` clause (GROUP plus APPLY aggregates). Parsing here is a
//! single synchronous pass that short-circuits on the first violation and
//! produces a fully bound [`Query`] the executor can run without further
//! checks.

mod filter;
mod options;
mod transform;


pub use filter::{CompareOp, Filter, WildcardPattern};
pub use options::{Column, Options, Order};
pub use transform::{ApplyColumn, ApplyToken, GroupKey, Transformations};

use serde_json::Value;

use crate::dataset::DatasetKind;
use crate::error::{QueryError, QueryResult};
use crate::fields::{Field, FieldKind};

/// Resolution context threaded through the recursive parse: the single
/// dataset every qualified reference must name, and its kind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BindContext<'a> {
    pub id: &'a str,
    pub kind: DatasetKind,
}

impl BindContext<'_> {
    /// Bind a qualified reference (`datasetId_fieldName`) to a catalog field.
    pub fn field(&self, reference: &str) -> QueryResult<Field> {
        let (id, name) = reference.split_once('_').ok_or_else(|| {
            QueryError::invalid(format!("Invalid field reference '{reference}'"))
        })?;
        if id != self.id {
            return Err(QueryError::invalid(format!(
                "Reference '{reference}' does not match dataset '{}'",
                self.id
            )));
        }
        Field::parse(self.kind, name).ok_or_else(|| {
            QueryError::invalid(format!(
                "Unknown field '{name}' for {} dataset",
                self.kind
            ))
        })
    }

    /// Bind a reference that must resolve to a numeric field.
    pub fn numeric_field(&self, reference: &str, operator: &str) -> QueryResult<Field> {
        let field = self.field(reference)?;
        if field.kind() != FieldKind::Numeric {
            return Err(QueryError::invalid(format!(
                "Invalid key type in {operator}"
            )));
        }
        Ok(field)
    }

    /// Bind a reference that must resolve to a textual field.
    pub fn textual_field(&self, reference: &str) -> QueryResult<Field> {
        let field = self.field(reference)?;
        if field.kind() != FieldKind::Textual {
            return Err(QueryError::invalid("Invalid key type in IS"));
        }
        Ok(field)
    }
}

/// A fully validated and bound query, ready for execution.
#[derive(Debug)]
pub struct Query {
    pub filter: Filter,
    pub options: Options,
    pub transformations: Option<Transformations>,
}

impl Query {
    /// Parse and bind a query document against a resolved dataset.
    pub(crate) fn parse(doc: &Value, ctx: &BindContext) -> QueryResult<Query> {
        let obj = doc
            .as_object()
            .ok_or_else(|| QueryError::invalid("Query must be a JSON object"))?;

        let where_clause = obj
            .get("WHERE")
            .ok_or_else(|| QueryError::invalid("Query missing WHERE clause"))?;
        let filter = Filter::parse(where_clause, ctx)?;

        let transformations = match obj.get("TRANSFORMATIONS") {
            Some(value) => Some(Transformations::parse(value, ctx)?),
            None => None,
        };

        let options_value = obj
            .get("OPTIONS")
            .ok_or_else(|| QueryError::invalid("Query missing OPTIONS clause"))?;
        let options = Options::parse(options_value, ctx, transformations.as_ref())?;

        Ok(Query {
            filter,
            options,
            transformations,
        })
    }
}

/// Validate the top-level shape of a query document and resolve the single
/// dataset id every qualified reference in it names.
///
/// References are gathered from comparison leaves, COLUMNS, GROUP, APPLY
/// field arguments and ORDER keys; the grammar container keys themselves are
/// never treated as references. More than one distinct dataset id, or none at
/// all, is an invalid query.
pub fn referenced_dataset(doc: &Value) -> QueryResult<String> {
    let obj = doc
        .as_object()
        .ok_or_else(|| QueryError::invalid("Query must be a JSON object"))?;
    if obj.len() > 3 {
        return Err(QueryError::invalid("Excess keys in query"));
    }
    for key in obj.keys() {
        if !matches!(key.as_str(), "WHERE" | "OPTIONS" | "TRANSFORMATIONS") {
            return Err(QueryError::invalid(format!(
                "Unexpected top-level key '{key}'"
            )));
        }
    }
    if !obj.contains_key("WHERE") {
        return Err(QueryError::invalid("Query missing WHERE clause"));
    }
    if !obj.contains_key("OPTIONS") {
        return Err(QueryError::invalid("Query missing OPTIONS clause"));
    }

    let mut references: Vec<&str> = Vec::new();

    if let Some(where_clause) = obj.get("WHERE") {
        collect_filter_references(where_clause, &mut references);
    }

    if let Some(options) = obj.get("OPTIONS").and_then(Value::as_object) {
        if let Some(columns) = options.get("COLUMNS").and_then(Value::as_array) {
            references.extend(
                columns
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|column| column.contains('_')),
            );
        }
        match options.get("ORDER") {
            Some(Value::String(key)) if key.contains('_') => references.push(key),
            Some(Value::Object(order)) => {
                if let Some(keys) = order.get("keys").and_then(Value::as_array) {
                    references.extend(
                        keys.iter()
                            .filter_map(Value::as_str)
                            .filter(|key| key.contains('_')),
                    );
                }
            }
            _ => {}
        }
    }

    if let Some(transformations) = obj.get("TRANSFORMATIONS").and_then(Value::as_object) {
        if let Some(group) = transformations.get("GROUP").and_then(Value::as_array) {
            references.extend(group.iter().filter_map(Value::as_str));
        }
        if let Some(apply) = transformations.get("APPLY").and_then(Value::as_array) {
            for entry in apply.iter().filter_map(Value::as_object) {
                for token_obj in entry.values().filter_map(Value::as_object) {
                    references.extend(token_obj.values().filter_map(Value::as_str));
                }
            }
        }
    }

    let mut dataset: Option<&str> = None;
    for reference in references {
        let (id, _) = reference.split_once('_').ok_or_else(|| {
            QueryError::invalid(format!("Invalid field reference '{reference}'"))
        })?;
        if id.is_empty() {
            return Err(QueryError::invalid(format!(
                "Invalid field reference '{reference}'"
            )));
        }
        match dataset {
            None => dataset = Some(id),
            Some(current) if current != id => {
                return Err(QueryError::invalid(
                    "Query references more than one dataset",
                ));
            }
            Some(_) => {}
        }
    }

    dataset
        .map(str::to_string)
        .ok_or_else(|| QueryError::invalid("Query does not reference any dataset"))
}

/// Gather comparison-leaf references from a WHERE subtree: any object key
/// whose value is a scalar is a candidate reference; containers are walked.
fn collect_filter_references<'a>(value: &'a Value, references: &mut Vec<&'a str>) {
    match value {
        Value::Object(obj) => {
            for (key, nested) in obj {
                if nested.is_number() || nested.is_string() {
                    references.push(key);
                } else {
                    collect_filter_references(nested, references);
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                collect_filter_references(entry, references);
            }
        }
        _ => {}
    }
}

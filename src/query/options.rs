//! OPTIONS parsing: COLUMNS projection and ORDER.

use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::fields::Field;

use super::{BindContext, Transformations};

/// One requested output column. `field` is bound on the raw-rows path; on
/// the transformed path values are looked up by name in the group pseudo-row.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub field: Option<Field>,
}

/// The requested ordering of the final rows.
#[derive(Debug, Clone)]
pub enum Order {
    /// A single column, ascending.
    Column(String),
    /// A direction plus one or more tie-break keys. `descending` reverses
    /// the sense of every comparison, not just the first key.
    Keyed {
        descending: bool,
        keys: Vec<String>,
    },
}

/// A validated OPTIONS clause.
#[derive(Debug, Clone)]
pub struct Options {
    pub columns: Vec<Column>,
    pub order: Option<Order>,
}

impl Options {
    pub(crate) fn parse(
        value: &Value,
        ctx: &BindContext,
        transformations: Option<&Transformations>,
    ) -> QueryResult<Options> {
        let obj = value
            .as_object()
            .ok_or_else(|| QueryError::invalid("OPTIONS must be an object"))?;
        if obj.len() > 2 {
            return Err(QueryError::invalid(
                "OPTIONS must be an object with at most 2 keys",
            ));
        }
        for key in obj.keys() {
            if !matches!(key.as_str(), "COLUMNS" | "ORDER") {
                return Err(QueryError::invalid("Query has second key that is not ORDER"));
            }
        }

        let columns_value = obj
            .get("COLUMNS")
            .ok_or_else(|| QueryError::invalid("OPTIONS missing COLUMNS"))?;
        let columns = Self::parse_columns(columns_value, ctx, transformations)?;
        let order = match obj.get("ORDER") {
            Some(order_value) => Some(Self::parse_order(order_value, &columns)?),
            None => None,
        };
        Ok(Options { columns, order })
    }

    fn parse_columns(
        value: &Value,
        ctx: &BindContext,
        transformations: Option<&Transformations>,
    ) -> QueryResult<Vec<Column>> {
        let entries = value
            .as_array()
            .filter(|entries| !entries.is_empty())
            .ok_or_else(|| QueryError::invalid("COLUMNS must be a non-empty array"))?;

        entries
            .iter()
            .map(|entry| {
                let name = entry
                    .as_str()
                    .ok_or_else(|| QueryError::invalid("COLUMNS entries must be strings"))?;
                let field = match transformations {
                    // On grouped output only GROUP keys and apply columns
                    // exist; a bare dataset field is not defined on a group.
                    Some(transformations) => {
                        let in_group = transformations
                            .group
                            .iter()
                            .any(|key| key.reference == name);
                        let in_apply = transformations
                            .apply
                            .iter()
                            .any(|column| column.name == name);
                        if !in_group && !in_apply {
                            return Err(QueryError::invalid(format!(
                                "Column '{name}' must appear in GROUP or APPLY"
                            )));
                        }
                        None
                    }
                    None => Some(ctx.field(name)?),
                };
                Ok(Column {
                    name: name.to_string(),
                    field,
                })
            })
            .collect()
    }

    fn parse_order(value: &Value, columns: &[Column]) -> QueryResult<Order> {
        let requested = |name: &str| columns.iter().any(|column| column.name == name);

        match value {
            Value::String(key) => {
                if !requested(key) {
                    return Err(QueryError::invalid("ORDER key must be in COLUMNS"));
                }
                Ok(Order::Column(key.clone()))
            }
            Value::Object(order) => {
                if order.len() != 2 || !order.contains_key("dir") || !order.contains_key("keys") {
                    return Err(QueryError::invalid(
                        "ORDER must contain exactly the keys dir and keys",
                    ));
                }
                let dir = order
                    .get("dir")
                    .and_then(Value::as_str)
                    .ok_or_else(|| QueryError::invalid("dir must be a string"))?;
                let descending = match dir {
                    "UP" => false,
                    "DOWN" => true,
                    _ => return Err(QueryError::invalid("Invalid direction key")),
                };
                let keys = order
                    .get("keys")
                    .and_then(Value::as_array)
                    .filter(|keys| !keys.is_empty())
                    .ok_or_else(|| {
                        QueryError::invalid("keys in ORDER must be a non-empty array")
                    })?;
                let keys = keys
                    .iter()
                    .map(|key| {
                        let key = key
                            .as_str()
                            .ok_or_else(|| QueryError::invalid("ORDER keys must be strings"))?;
                        if !requested(key) {
                            return Err(QueryError::invalid("ORDER key must be in COLUMNS"));
                        }
                        Ok(key.to_string())
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(Order::Keyed { descending, keys })
            }
            _ => Err(QueryError::invalid("Invalid ORDER type")),
        }
    }
}

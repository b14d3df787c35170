//! TRANSFORMATIONS parsing: GROUP keys and APPLY aggregate columns.

use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::fields::{Field, FieldKind};

use super::BindContext;

/// The five aggregation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Sum,
    Count,
}

impl ApplyToken {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "MAX" => Some(Self::Max),
            "MIN" => Some(Self::Min),
            "AVG" => Some(Self::Avg),
            "SUM" => Some(Self::Sum),
            "COUNT" => Some(Self::Count),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Avg => "AVG",
            Self::Sum => "SUM",
            Self::Count => "COUNT",
        }
    }
}

/// One GROUP entry: the qualified reference as written, plus its bound field.
#[derive(Debug, Clone)]
pub struct GroupKey {
    pub reference: String,
    pub field: Field,
}

/// One APPLY entry: a unique aggregate-column name, the token and the field
/// it aggregates.
#[derive(Debug, Clone)]
pub struct ApplyColumn {
    pub name: String,
    pub token: ApplyToken,
    pub field: Field,
}

/// A validated TRANSFORMATIONS clause.
#[derive(Debug, Clone)]
pub struct Transformations {
    pub group: Vec<GroupKey>,
    pub apply: Vec<ApplyColumn>,
}

impl Transformations {
    pub(crate) fn parse(value: &Value, ctx: &BindContext) -> QueryResult<Transformations> {
        let obj = value
            .as_object()
            .ok_or_else(|| QueryError::invalid("TRANSFORMATIONS must be an object"))?;
        if obj.len() != 2 {
            return Err(QueryError::invalid(
                "TRANSFORMATIONS has incorrect number of keys",
            ));
        }
        let group_value = obj
            .get("GROUP")
            .ok_or_else(|| QueryError::invalid("TRANSFORMATIONS missing GROUP"))?;
        let apply_value = obj
            .get("APPLY")
            .ok_or_else(|| QueryError::invalid("TRANSFORMATIONS missing APPLY"))?;

        let group = Self::parse_group(group_value, ctx)?;
        let apply = Self::parse_apply(apply_value, ctx)?;
        Ok(Transformations { group, apply })
    }

    fn parse_group(value: &Value, ctx: &BindContext) -> QueryResult<Vec<GroupKey>> {
        let entries = value
            .as_array()
            .filter(|entries| !entries.is_empty())
            .ok_or_else(|| QueryError::invalid("GROUP must be a non-empty array"))?;
        entries
            .iter()
            .map(|entry| {
                let reference = entry
                    .as_str()
                    .ok_or_else(|| QueryError::invalid("GROUP entries must be strings"))?;
                Ok(GroupKey {
                    reference: reference.to_string(),
                    field: ctx.field(reference)?,
                })
            })
            .collect()
    }

    fn parse_apply(value: &Value, ctx: &BindContext) -> QueryResult<Vec<ApplyColumn>> {
        let entries = value
            .as_array()
            .ok_or_else(|| QueryError::invalid("APPLY must be an array"))?;

        let mut columns: Vec<ApplyColumn> = Vec::with_capacity(entries.len());
        for entry in entries {
            let obj = entry
                .as_object()
                .filter(|obj| obj.len() == 1)
                .ok_or_else(|| {
                    QueryError::invalid("Apply entry must be an object with exactly one key")
                })?;
            let (name, token_value) = obj
                .iter()
                .next()
                .ok_or_else(|| QueryError::invalid("Apply entry must have exactly one key"))?;

            if name.is_empty() {
                return Err(QueryError::invalid("Apply key cannot be empty"));
            }
            if name.contains('_') {
                return Err(QueryError::invalid(
                    "Apply key has invalid characters (underscore)",
                ));
            }
            if columns.iter().any(|column| &column.name == name) {
                return Err(QueryError::invalid(format!("Duplicate apply key '{name}'")));
            }

            let token_obj = token_value
                .as_object()
                .filter(|obj| obj.len() == 1)
                .ok_or_else(|| {
                    QueryError::invalid("Apply token must be an object with exactly one key")
                })?;
            let (token_name, field_value) = token_obj
                .iter()
                .next()
                .ok_or_else(|| QueryError::invalid("Apply token must have exactly one key"))?;

            let token = ApplyToken::parse(token_name).ok_or_else(|| {
                QueryError::invalid(format!("Invalid apply token '{token_name}'"))
            })?;
            let reference = field_value
                .as_str()
                .ok_or_else(|| QueryError::invalid("Apply field must be a string"))?;
            let field = ctx.field(reference)?;
            if token != ApplyToken::Count && field.kind() != FieldKind::Numeric {
                return Err(QueryError::invalid(format!(
                    "{} requires a numeric field",
                    token.name()
                )));
            }

            columns.push(ApplyColumn {
                name: name.clone(),
                token,
                field,
            });
        }
        Ok(columns)
    }
}

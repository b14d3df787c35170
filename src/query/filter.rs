//! The filter compiler: WHERE clause → row predicate.
//!
//! A WHERE clause is compiled into a closed [`Filter`] sum type with every
//! reference bound and every wildcard pattern pre-compiled, so evaluation is
//! a pure structural match over one row with no further validation.

use regex::Regex;
use serde_json::Value;

use crate::dataset::Row;
use crate::error::{QueryError, QueryResult};
use crate::fields::{Field, FieldValue};

use super::BindContext;

/// Numeric comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Eq,
}

/// A compiled filter tree.
#[derive(Debug, Clone)]
pub enum Filter {
    /// The empty WHERE clause; accepts every row.
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        op: CompareOp,
        field: Field,
        value: f64,
    },
    Matches {
        field: Field,
        pattern: WildcardPattern,
    },
}

impl Filter {
    /// Compile a WHERE clause. `{}` compiles to [`Filter::All`].
    pub(crate) fn parse(value: &Value, ctx: &BindContext) -> QueryResult<Filter> {
        let obj = value
            .as_object()
            .ok_or_else(|| QueryError::invalid("WHERE must be an object"))?;
        if obj.is_empty() {
            return Ok(Filter::All);
        }
        Self::parse_node(value, ctx)
    }

    fn parse_node(value: &Value, ctx: &BindContext) -> QueryResult<Filter> {
        let obj = value
            .as_object()
            .filter(|obj| obj.len() == 1)
            .ok_or_else(|| {
                QueryError::invalid("Filter must be an object with exactly one key")
            })?;
        let (key, body) = obj
            .iter()
            .next()
            .ok_or_else(|| QueryError::invalid("Filter must have exactly one key"))?;

        match key.as_str() {
            "AND" => Ok(Filter::And(Self::parse_children(body, "AND", ctx)?)),
            "OR" => Ok(Filter::Or(Self::parse_children(body, "OR", ctx)?)),
            "NOT" => {
                if body.is_array() {
                    return Err(QueryError::invalid("NOT must be an object"));
                }
                Ok(Filter::Not(Box::new(Self::parse_node(body, ctx)?)))
            }
            "LT" => Self::parse_comparison(CompareOp::Lt, "LT", body, ctx),
            "GT" => Self::parse_comparison(CompareOp::Gt, "GT", body, ctx),
            "EQ" => Self::parse_comparison(CompareOp::Eq, "EQ", body, ctx),
            "IS" => Self::parse_wildcard(body, ctx),
            other => Err(QueryError::invalid(format!("Invalid filter key '{other}'"))),
        }
    }

    fn parse_children(body: &Value, key: &str, ctx: &BindContext) -> QueryResult<Vec<Filter>> {
        let children = body
            .as_array()
            .filter(|children| !children.is_empty())
            .ok_or_else(|| QueryError::invalid(format!("{key} must be a non-empty array")))?;
        children
            .iter()
            .map(|child| Self::parse_node(child, ctx))
            .collect()
    }

    fn parse_comparison(
        op: CompareOp,
        key: &str,
        body: &Value,
        ctx: &BindContext,
    ) -> QueryResult<Filter> {
        let (reference, literal) = Self::leaf_entry(key, body)?;
        let value = literal.as_f64().ok_or_else(|| {
            QueryError::invalid(format!("Invalid value type in {key}, should be number"))
        })?;
        let field = ctx.numeric_field(reference, key)?;
        Ok(Filter::Compare { op, field, value })
    }

    fn parse_wildcard(body: &Value, ctx: &BindContext) -> QueryResult<Filter> {
        let (reference, literal) = Self::leaf_entry("IS", body)?;
        let pattern = literal
            .as_str()
            .ok_or_else(|| QueryError::invalid("Invalid value type in IS, should be string"))?;
        let field = ctx.textual_field(reference)?;
        Ok(Filter::Matches {
            field,
            pattern: WildcardPattern::compile(pattern)?,
        })
    }

    fn leaf_entry<'a>(key: &str, body: &'a Value) -> QueryResult<(&'a str, &'a Value)> {
        let obj = body
            .as_object()
            .filter(|obj| obj.len() == 1)
            .ok_or_else(|| {
                QueryError::invalid(format!("{key} should only have 1 key"))
            })?;
        obj.iter()
            .next()
            .map(|(reference, literal)| (reference.as_str(), literal))
            .ok_or_else(|| QueryError::invalid(format!("{key} should only have 1 key")))
    }

    /// Evaluate this filter against one row.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::All => true,
            Filter::And(children) => children.iter().all(|child| child.matches(row)),
            Filter::Or(children) => children.iter().any(|child| child.matches(row)),
            Filter::Not(inner) => !inner.matches(row),
            Filter::Compare { op, field, value } => match row.get(*field) {
                Some(FieldValue::Number(n)) => match op {
                    CompareOp::Lt => n < *value,
                    CompareOp::Gt => n > *value,
                    CompareOp::Eq => n == *value,
                },
                _ => false,
            },
            Filter::Matches { field, pattern } => match row.get(*field) {
                Some(FieldValue::Text(text)) => pattern.is_match(&text),
                _ => false,
            },
        }
    }
}

/// An anchored wildcard pattern for `IS`.
///
/// `*` stands for "zero or more of any character" and may only appear as the
/// first and/or last character; matching is exact otherwise, with no case
/// folding. Compiled once into a regex at parse time.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    regex: Regex,
}

impl WildcardPattern {
    pub fn compile(pattern: &str) -> QueryResult<WildcardPattern> {
        let mut literal = pattern;
        let leading = literal.starts_with('*');
        if leading {
            literal = &literal[1..];
        }
        let trailing = literal.ends_with('*');
        if trailing {
            literal = &literal[..literal.len() - 1];
        }
        if literal.contains('*') {
            return Err(QueryError::invalid(
                "Asterisks (*) can only be the first or last characters of input strings",
            ));
        }

        let mut anchored = String::from("^");
        if leading {
            anchored.push_str(".*");
        }
        anchored.push_str(&regex::escape(literal));
        if trailing {
            anchored.push_str(".*");
        }
        anchored.push('$');

        let regex = Regex::new(&anchored)
            .map_err(|err| QueryError::invalid(format!("Invalid IS pattern: {err}")))?;
        Ok(WildcardPattern { regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

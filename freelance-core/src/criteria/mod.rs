//! Query-string filters (`field.operator=value`) and their SQL rendering.

mod render;

use crate::common::error::{MarketError, Result};
use crate::storage::codec::{encode_instant, parse_instant};
use crate::storage::schema::{FieldKind, LinkTable, Table};
use rusqlite::types::Value;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Specified,
    Contains,
    DoesNotContain,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl FromStr for Operator {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            "specified" => Operator::Specified,
            "contains" => Operator::Contains,
            "doesNotContain" => Operator::DoesNotContain,
            "greaterThan" => Operator::GreaterThan,
            "lessThan" => Operator::LessThan,
            "greaterThanOrEqual" => Operator::GreaterThanOrEqual,
            "lessThanOrEqual" => Operator::LessThanOrEqual,
            other => return Err(MarketError::InvalidCriteria(format!("unknown operator '{other}'"))),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals(Value),
    NotEquals(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Specified(bool),
    Contains(String),
    DoesNotContain(String),
    GreaterThan(Value),
    LessThan(Value),
    GreaterThanOrEqual(Value),
    LessThanOrEqual(Value),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Column of the entity's own table.
    Column(&'static str),
    /// Target-id column of a link table.
    Link(LinkTable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub target: Target,
    pub filter: Filter,
}

/// Conjunction of conditions over one entity table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    conditions: Vec<Condition>,
    distinct: bool,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, target: Target, filter: Filter) -> Self {
        self.push(Condition { target, filter });
        self
    }

    pub fn column_equals(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.and(Target::Column(column), Filter::Equals(value.into()))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn distinct(&self) -> bool {
        self.distinct
    }

    /// Parses `field.operator=value` pairs for `table`.
    ///
    /// Keys without an operator (`page`, `size`, `sort`) and unknown fields are
    /// skipped. Repeated `in`/`notIn` keys accumulate values.
    pub fn from_query(table: &Table, pairs: &[(String, String)]) -> Result<Self> {
        let mut criteria = Criteria::default();

        for (key, raw) in pairs {
            if key == "distinct" {
                criteria.distinct = parse_bool(key, raw)?;
                continue;
            }
            let Some((field, op)) = key.rsplit_once('.') else {
                continue;
            };

            let (target, kind) = if let Some(column) = table.column(field) {
                (Target::Column(column.name), column.kind)
            } else if let Some(link) = table.link(field) {
                (Target::Link(link), FieldKind::Long)
            } else {
                debug!(entity = table.entity, field, "ignoring filter on unknown field");
                continue;
            };

            let operator: Operator = op.parse()?;
            let filter = build_filter(key, operator, kind, raw)?;
            criteria.push(Condition { target, filter });
        }

        Ok(criteria)
    }

    fn push(&mut self, condition: Condition) {
        let mergeable = self.conditions.iter().position(|c| {
            c.target == condition.target
                && matches!(
                    (&c.filter, &condition.filter),
                    (Filter::In(_), Filter::In(_)) | (Filter::NotIn(_), Filter::NotIn(_))
                )
        });
        match (mergeable, condition.filter) {
            (Some(index), Filter::In(more)) | (Some(index), Filter::NotIn(more)) => {
                if let Filter::In(values) | Filter::NotIn(values) = &mut self.conditions[index].filter {
                    values.extend(more);
                }
            }
            (_, filter) => self.conditions.push(Condition {
                target: condition.target,
                filter,
            }),
        }
    }
}

fn build_filter(key: &str, operator: Operator, kind: FieldKind, raw: &str) -> Result<Filter> {
    let reject = || {
        MarketError::InvalidCriteria(format!(
            "operator in '{key}' is not supported for {} fields",
            kind.name()
        ))
    };

    Ok(match operator {
        Operator::Equals => Filter::Equals(parse_value(key, kind, raw)?),
        Operator::NotEquals => Filter::NotEquals(parse_value(key, kind, raw)?),
        Operator::In => Filter::In(parse_list(key, kind, raw)?),
        Operator::NotIn => Filter::NotIn(parse_list(key, kind, raw)?),
        Operator::Specified => Filter::Specified(parse_bool(key, raw)?),
        Operator::Contains | Operator::DoesNotContain => {
            if kind != FieldKind::Text {
                return Err(reject());
            }
            if operator == Operator::Contains {
                Filter::Contains(raw.to_string())
            } else {
                Filter::DoesNotContain(raw.to_string())
            }
        }
        Operator::GreaterThan
        | Operator::LessThan
        | Operator::GreaterThanOrEqual
        | Operator::LessThanOrEqual => {
            if !kind.supports_range() {
                return Err(reject());
            }
            let value = parse_value(key, kind, raw)?;
            match operator {
                Operator::GreaterThan => Filter::GreaterThan(value),
                Operator::LessThan => Filter::LessThan(value),
                Operator::GreaterThanOrEqual => Filter::GreaterThanOrEqual(value),
                _ => Filter::LessThanOrEqual(value),
            }
        }
    })
}

fn parse_list(key: &str, kind: FieldKind, raw: &str) -> Result<Vec<Value>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| parse_value(key, kind, item))
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(invalid_value(key, other, "boolean")),
    }
}

fn invalid_value(key: &str, raw: &str, kind: &str) -> MarketError {
    MarketError::InvalidCriteria(format!("'{raw}' is not a valid {kind} for '{key}'"))
}

fn parse_value(key: &str, kind: FieldKind, raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    let fail = || invalid_value(key, raw, kind.name());
    Ok(match kind {
        FieldKind::Long => Value::Integer(trimmed.parse::<i64>().map_err(|_| fail())?),
        FieldKind::Integer => Value::Integer(i64::from(trimmed.parse::<i32>().map_err(|_| fail())?)),
        FieldKind::Double => {
            let f = trimmed.parse::<f64>().map_err(|_| fail())?;
            if !f.is_finite() {
                return Err(fail());
            }
            Value::Real(f)
        }
        FieldKind::Boolean => Value::Integer(i64::from(parse_bool(key, trimmed)?)),
        FieldKind::Text => Value::Text(raw.to_string()),
        FieldKind::Instant => Value::Text(encode_instant(&parse_instant(trimmed).map_err(|_| fail())?)),
        FieldKind::Enum(values) => {
            if !values.contains(&trimmed) {
                return Err(fail());
            }
            Value::Text(trimmed.to_string())
        }
    })
}

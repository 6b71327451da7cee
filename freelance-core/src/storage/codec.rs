//! Conversions between Rust field types and SQLite values.

use crate::common::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;

/// Fixed-width UTC timestamp; text order equals chronological order.
const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub trait SqlColumn: Sized {
    fn decode(value: Value) -> std::result::Result<Self, String>;
    fn encode(&self) -> Value;
}

/// Reads a column by name and decodes it.
pub fn read<T: SqlColumn>(row: &Row<'_>, column: &str) -> Result<T> {
    let value: Value = row.get(column)?;
    T::decode(value).map_err(|e| MarketError::Decode(format!("column '{column}': {e}")))
}

pub fn encode_instant(ts: &DateTime<Utc>) -> String {
    ts.format(INSTANT_FORMAT).to_string()
}

pub fn parse_instant(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("invalid instant '{text}': {e}"))
}

fn unexpected(expected: &str, value: &Value) -> String {
    format!("expected {expected}, found {:?}", value.data_type())
}

impl SqlColumn for String {
    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(unexpected("text", &other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl SqlColumn for i64 {
    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(unexpected("integer", &other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Integer(*self)
    }
}

impl SqlColumn for i32 {
    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Integer(i) => i32::try_from(i).map_err(|e| e.to_string()),
            other => Err(unexpected("integer", &other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl SqlColumn for f64 {
    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(unexpected("real", &other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Real(*self)
    }
}

impl SqlColumn for bool {
    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Integer(i) => Ok(i != 0),
            other => Err(unexpected("boolean", &other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl SqlColumn for DateTime<Utc> {
    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Text(s) => parse_instant(&s),
            other => Err(unexpected("timestamp text", &other)),
        }
    }

    fn encode(&self) -> Value {
        Value::Text(encode_instant(self))
    }
}

impl<T: SqlColumn> SqlColumn for Option<T> {
    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }

    fn encode(&self) -> Value {
        match self {
            Some(v) => v.encode(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn instants_sort_as_text() {
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 11, 2, 3, 4, 5).unwrap();
        assert!(encode_instant(&early) < encode_instant(&late));
        assert_eq!(encode_instant(&early), "2024-01-02T03:04:05.000000Z");
        assert_eq!(DateTime::<Utc>::decode(early.encode()).unwrap(), early);
    }

    #[test]
    fn options_map_null() {
        assert_eq!(Option::<String>::decode(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::None.encode(), Value::Null);
        assert_eq!(Option::<i64>::decode(Value::Integer(7)).unwrap(), Some(7));
    }

    #[test]
    fn booleans_are_integers() {
        assert_eq!(true.encode(), Value::Integer(1));
        assert!(!bool::decode(Value::Integer(0)).unwrap());
        assert!(bool::decode(Value::Text("yes".into())).is_err());
    }

    #[test]
    fn reals_accept_integer_storage() {
        assert_eq!(f64::decode(Value::Integer(3)).unwrap(), 3.0);
    }
}

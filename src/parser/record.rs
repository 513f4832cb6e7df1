use rusqlite::types::{ToSql, ToSqlOutput, Value as SqliteValue, ValueRef};
use serde_json::{Map, Value};

use crate::error::{FailureReason, ValidationError};
use crate::schema::{Column, ColumnType, TableSchema};

/// A source record: column name to raw value, as handed over by the provider
pub type RawRecord = Map<String, Value>;

/// A validated row ready for insertion, values in `schema.columns` order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub values: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }

    /// Read a column value back out of SQLite
    pub fn from_value_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                SqlValue::Text(String::from_utf8_lossy(t).into_owned())
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(SqliteValue::Null),
            SqlValue::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Real(r) => write!(f, "{}", r),
            SqlValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Validate a raw record against a table schema.
///
/// Columns are checked in declaration order and the first violation is
/// returned. Keys the schema does not declare (including any `id`) are
/// ignored.
pub fn validate_record(
    record: &RawRecord,
    schema: &TableSchema,
    record_index: usize,
) -> Result<ParsedRow, ValidationError> {
    let mut values = Vec::with_capacity(schema.columns.len());

    for col in schema.columns {
        let raw = record.get(col.name);
        let value = extract_value(raw, col).map_err(|reason| ValidationError {
            table: schema.name.to_string(),
            record_index,
            field: col.name.to_string(),
            reason,
            value: raw.filter(|v| !is_blank(v)).map(|v| v.to_string()),
        })?;
        values.push(value);
    }

    Ok(ParsedRow { values })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn extract_value(raw: Option<&Value>, col: &Column) -> Result<SqlValue, FailureReason> {
    let v = match raw {
        Some(v) if !is_blank(v) => v,
        _ if col.nullable => return Ok(SqlValue::Null),
        _ => return Err(FailureReason::Missing),
    };

    match col.col_type {
        ColumnType::Integer => parse_integer(v).map(SqlValue::Integer),
        ColumnType::Real => parse_real(v).map(SqlValue::Real),
        ColumnType::Text => match v {
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
            _ => Err(FailureReason::NotText),
        },
    }
}

fn parse_integer(v: &Value) -> Result<i64, FailureReason> {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => integral_float(n.as_f64()),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Ok(i),
                Err(_) => integral_float(s.parse::<f64>().ok()),
            }
        }
        _ => Err(FailureReason::NotAnInteger),
    }
}

/// 12.0 is an integer; 12.5 and anything outside i64 are not
fn integral_float(f: Option<f64>) -> Result<i64, FailureReason> {
    match f {
        Some(f)
            if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
        {
            Ok(f as i64)
        }
        _ => Err(FailureReason::NotAnInteger),
    }
}

fn parse_real(v: &Value) -> Result<f64, FailureReason> {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match f {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(FailureReason::NotANumber),
    }
}

//! Row parameter values.
//!
//! The builder never inspects a [`Value`]; it only counts values per row and
//! forwards them to the executor in submission order.

use miniserde::json::{Number, Value as JsonValue};

/// SQL parameter values.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Text value.
    String(String),
    /// Binary value.
    Bytes(Vec<u8>),
}

impl Value {
    /// Convert a scalar from a miniserde JSON value.
    ///
    /// Returns `None` for arrays, objects, and unsigned integers that do not
    /// fit in an `i64`.
    ///
    /// # Example
    ///
    /// ```
    /// use sql_bulk::Value;
    /// use miniserde::json::{Number, Value as JsonValue};
    ///
    /// let json = JsonValue::Number(Number::I64(42));
    /// assert_eq!(Value::from_json(&json), Some(Value::Int(42)));
    ///
    /// let json: JsonValue = miniserde::json::from_str("[1, 2]").unwrap();
    /// assert_eq!(Value::from_json(&json), None);
    /// ```
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        match json {
            JsonValue::Null => Some(Self::Null),
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(n) => match n {
                Number::I64(i) => Some(Self::Int(*i)),
                Number::U64(u) => i64::try_from(*u).ok().map(Self::Int),
                Number::F64(f) => Some(Self::Float(*f)),
            },
            JsonValue::String(s) => Some(Self::String(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(feature = "rusqlite")]
impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};

        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Self::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Self::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

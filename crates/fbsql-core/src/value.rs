//! Tagged scalar values and the SQL literal escaping primitive.
//!
//! [`Value`] is the unit of data exchanged with the driver: statement
//! parameters, row cells, and the inputs to query generation all use it.
//! Absence is not a value — a column missing from a record means "do not
//! touch this column", while [`Value::Null`] means "set to SQL NULL".

use chrono::NaiveDateTime;

/// A typed scalar exchanged with the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Integer (SMALLINT, INTEGER, BIGINT).
    Int(i64),
    /// Floating point (FLOAT, DOUBLE PRECISION).
    Double(f64),
    /// Text (CHAR, VARCHAR, BLOB SUB_TYPE TEXT).
    Text(String),
    /// Date/time (DATE, TIME, TIMESTAMP). Naive: the server expects local
    /// time with no zone designator.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view, if this value is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating-point view. Integers widen losslessly for small magnitudes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text view, if this value is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Date/time view, if this value is a timestamp.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Render a value as an embeddable SQL literal.
///
/// Text is single-quoted with embedded quotes doubled; timestamps render as
/// quoted `YYYY-MM-DD HH:MM:SS`; NULL renders as the bare keyword. This is
/// the leaf dependency of the query generator and search-term builder, which
/// embed literals rather than bind parameters.
pub fn escape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Int(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Text(v) => quote(v),
        Value::Timestamp(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S")),
    }
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

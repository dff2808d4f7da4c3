use std::cmp::Ordering;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::ordered_map::OrderedMap;
use crate::schema::schema::{ColumnDefinition, ColumnType};

/// Stringified primary-key value
pub type RecordId = String;

/// Column name -> value, in column order
pub type Record = OrderedMap<Value>;

/// Scalar stored in a record field or produced by a literal.
///
/// There is no null: a column without a value is simply absent from the
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(#[serde(serialize_with = "serialize_float")] f64),
    Boolean(bool),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Turn a raw literal token into a value.
    ///
    /// Quotes are checked first so that `'123'` stays text, then booleans,
    /// then integers, then floats with a single decimal point. Everything
    /// else (including `-5` and digit runs too long for a finite float) is
    /// text.
    pub fn coerce_literal(raw: &str) -> Value {
        let token = raw.trim();
        if let Some(inner) = strip_matching_quotes(token) {
            return Value::Text(inner.to_string());
        }
        if token.eq_ignore_ascii_case("TRUE") {
            return Value::Boolean(true);
        }
        if token.eq_ignore_ascii_case("FALSE") {
            return Value::Boolean(false);
        }
        if is_ascii_digits(token) {
            if let Ok(i) = token.parse::<i64>() {
                return Value::Integer(i);
            }
        }
        if token.matches('.').count() <= 1 && is_ascii_digits(&token.replacen('.', "", 1)) {
            if let Ok(f) = token.parse::<f64>() {
                if f.is_finite() {
                    return Value::Float(f);
                }
            }
        }
        Value::Text(token.to_string())
    }

    /// Check that this value can be stored in `column`.
    pub fn validate_against(&self, column: &ColumnDefinition) -> Result<()> {
        let ok = match column.column_type {
            ColumnType::Int => self.as_integer().is_some(),
            ColumnType::Float => self.as_number().map(f64::is_finite).unwrap_or(false),
            ColumnType::Boolean => self.as_boolean().is_some(),
            ColumnType::Text | ColumnType::Date => true,
        };

        if ok {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::TypeMismatch,
                format!("Column '{}' must be {}", column.name, column.column_type),
            ))
        }
    }

    /// Convert a validated value to the representation of `column_type`.
    pub fn conform_to(self, column_type: ColumnType) -> Value {
        let converted = match column_type {
            ColumnType::Int => self.as_integer().map(Value::Integer),
            ColumnType::Float => self.as_number().map(Value::Float),
            ColumnType::Boolean => self.as_boolean().map(Value::Boolean),
            ColumnType::Text | ColumnType::Date => None,
        };
        converted.unwrap_or(self)
    }

    /// Integer reading: floats truncate, booleans are 1/0, text must parse.
    /// Floats outside the `i64` range have no integer reading.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            // i64::MAX as f64 rounds up to 2^63, which is already out of range
            Value::Float(f) if *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Some(f.trunc() as i64)
            }
            Value::Float(_) => None,
            Value::Boolean(b) => Some(*b as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Numeric reading used by range comparisons
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Only TRUE, FALSE, 1 and 0 (any case) read as booleans
    pub fn as_boolean(&self) -> Option<bool> {
        let shown = self.to_string();
        if shown.eq_ignore_ascii_case("TRUE") || shown == "1" {
            Some(true)
        } else if shown.eq_ignore_ascii_case("FALSE") || shown == "0" {
            Some(false)
        } else {
            None
        }
    }

    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Integer(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Boolean(b) => !b,
            Value::Text(s) => s.is_empty(),
        }
    }

    /// Ordering for ORDER BY: string comparison of the displayed value,
    /// so `10` sorts before `9`.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

/// Non-finite floats have no JSON number form; they are written as text
/// so the data file stays loadable.
fn serialize_float<S: serde::Serializer>(f: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if f.is_finite() {
        serializer.serialize_f64(*f)
    } else {
        serializer.serialize_str(&f.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            // Keep a fractional part so 1.0 never reads as the integer 1
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// `'abc'` or `"abc"` -> `abc`; anything else -> None
pub fn strip_matching_quotes(token: &str) -> Option<&str> {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return Some(&token[1..token.len() - 1]);
        }
    }
    None
}

/// Quote-stripped text of a literal token, as written
pub fn unquote(token: &str) -> &str {
    let token = token.trim();
    strip_matching_quotes(token).unwrap_or(token)
}

fn is_ascii_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

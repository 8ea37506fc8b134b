use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrialError};

/// A dynamically typed value handed out by fixtures and parameter tables.
///
/// # Examples
///
/// ```rust
/// use trial::value::Value;
/// let n = Value::Int(4);
/// assert_eq!(n.type_name(), "Int");
/// let s = Value::from("hello");
/// assert_eq!(s.type_name(), "Str");
/// assert!(Value::default().is_nil());
/// ```
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

/// Type tag for a [`Value`], checked where values cross into a test body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Nil,
    Bool,
    Int,
    Str,
    List,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Nil => "Nil",
            ValueType::Bool => "Bool",
            ValueType::Int => "Int",
            ValueType::Str => "Str",
            ValueType::List => "List",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Returns the type tag of the value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trial::value::{Value, ValueType};
    /// assert_eq!(Value::Bool(true).value_type(), ValueType::Bool);
    /// ```
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Str(_) => ValueType::Str,
            Value::List(_) => ValueType::List,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().as_str()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Multiplies two values with sequence-repeat semantics.
    ///
    /// Integers multiply; an integer times a string or list repeats it.
    /// Negative repeat counts produce an empty sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trial::value::Value;
    /// assert_eq!(Value::Int(2).mul(&Value::from("one")).unwrap(), Value::from("oneone"));
    /// assert!(Value::from("a").mul(&Value::from("b")).is_err());
    /// ```
    pub fn mul(&self, rhs: &Value) -> Result<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_mul(*b)
                .map(Value::Int)
                .ok_or(TrialError::Overflow { operation: "*" }),
            (Value::Int(n), Value::Str(s)) | (Value::Str(s), Value::Int(n)) => {
                let count = repeat_count(*n);
                repeated_len(s.len(), count, 1)?;
                Ok(Value::Str(s.repeat(count)))
            }
            (Value::Int(n), Value::List(items)) | (Value::List(items), Value::Int(n)) => {
                let count = if items.is_empty() { 0 } else { repeat_count(*n) };
                let mut out = Vec::with_capacity(repeated_len(
                    items.len(),
                    count,
                    std::mem::size_of::<Value>(),
                )?);
                for _ in 0..count {
                    out.extend(items.iter().cloned());
                }
                Ok(Value::List(out))
            }
            _ => Err(TrialError::TypeMismatch {
                operation: "*",
                left: self.type_name(),
                right: rhs.type_name(),
            }),
        }
    }

    /// Renders the value the way it appears inside containers and diffs:
    /// strings are quoted, everything else matches `Display`.
    fn write_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

fn repeat_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// Length of a sequence repeated `count` times. The result, in bytes of
/// `elem_size`, must fit a single allocation.
fn repeated_len(len: usize, count: usize, elem_size: usize) -> Result<usize> {
    len.checked_mul(count)
        .filter(|total| {
            total
                .checked_mul(elem_size)
                .map_or(false, |bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(TrialError::Overflow { operation: "*" })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_repr(f)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_repr(f)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_times_int_multiplies() {
        assert_eq!(Value::Int(2).mul(&Value::Int(3)).unwrap(), Value::Int(6));
    }

    #[test]
    fn int_times_str_repeats_either_side() {
        let one = Value::from("one");
        assert_eq!(Value::Int(1).mul(&one).unwrap(), one);
        assert_eq!(one.mul(&Value::Int(2)).unwrap(), Value::from("oneone"));
    }

    #[test]
    fn negative_repeat_is_empty() {
        assert_eq!(Value::Int(-3).mul(&Value::from("x")).unwrap(), Value::from(""));
        assert_eq!(
            Value::from(vec![1, 2]).mul(&Value::Int(0)).unwrap(),
            Value::List(vec![])
        );
    }

    #[test]
    fn list_repeat_preserves_order() {
        let list = Value::from(vec![1, 2]);
        assert_eq!(list.mul(&Value::Int(2)).unwrap(), Value::from(vec![1, 2, 1, 2]));
    }

    #[test]
    fn mismatched_operands_are_rejected() {
        let err = Value::Bool(true).mul(&Value::from("x")).unwrap_err();
        assert!(matches!(
            err,
            TrialError::TypeMismatch { left: "Bool", right: "Str", .. }
        ));
    }

    #[test]
    fn overflow_is_reported() {
        let err = Value::Int(i64::MAX).mul(&Value::Int(2)).unwrap_err();
        assert!(matches!(err, TrialError::Overflow { .. }));
    }

    #[test]
    fn oversized_repeats_are_overflow_errors() {
        let err = Value::Int(i64::MAX).mul(&Value::from("ab")).unwrap_err();
        assert!(matches!(err, TrialError::Overflow { .. }));
        let err = Value::from(vec![1, 2, 3]).mul(&Value::Int(i64::MAX)).unwrap_err();
        assert!(matches!(err, TrialError::Overflow { .. }));
        let err = Value::from(vec![1]).mul(&Value::Int(1 << 62)).unwrap_err();
        assert!(matches!(err, TrialError::Overflow { .. }));
        assert_eq!(
            Value::from(Vec::<i64>::new()).mul(&Value::Int(i64::MAX)).unwrap(),
            Value::from(Vec::<i64>::new())
        );
    }

    #[test]
    fn display_quotes_strings_only_inside_lists() {
        let v = Value::from(vec![Value::from("Даша"), Value::Int(1), Value::Nil]);
        assert_eq!(v.to_string(), r#"["Даша", 1, nil]"#);
        assert_eq!(Value::from("Даша").to_string(), "Даша");
        assert_eq!(format!("{:?}", Value::from("a")), r#""a""#);
    }
}

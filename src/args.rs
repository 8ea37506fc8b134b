use std::collections::BTreeMap;

use serde::Serialize;

use crate::assertions::{Failure, Outcome};
use crate::value::Value;

/// Named values injected into a fixture provider or a test body.
///
/// Holds both resolved fixtures and the parameters of the current
/// invocation; a parameter shadows a fixture of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Args {
    values: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up an argument; a missing name is a setup failure.
    pub fn get(&self, name: &str) -> Outcome<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| Failure::setup(format!("argument '{name}' was not provided")))
    }

    pub fn int(&self, name: &str) -> Outcome<i64> {
        let value = self.get(name)?;
        value.as_int().ok_or_else(|| mistyped(name, "Int", value))
    }

    pub fn str(&self, name: &str) -> Outcome<&str> {
        let value = self.get(name)?;
        value.as_str().ok_or_else(|| mistyped(name, "Str", value))
    }

    pub fn list(&self, name: &str) -> Outcome<&[Value]> {
        let value = self.get(name)?;
        value.as_list().ok_or_else(|| mistyped(name, "List", value))
    }
}

fn mistyped(name: &str, expected: &str, value: &Value) -> Failure {
    Failure::setup(format!(
        "argument '{name}' is {}, expected {expected}",
        value.type_name()
    ))
}

impl FromIterator<(String, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

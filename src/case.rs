//! Test descriptors.
//!
//! A test is data: a name, the fixtures it requests, its parameter tables
//! and its marks, plus the body to call. The collector turns descriptors
//! into invocations; nothing here executes anything.

use std::fmt;
use std::sync::Arc;

use crate::args::Args;
use crate::assertions::Outcome;
use crate::fixtures::FixtureRegistry;
use crate::marks::Mark;
use crate::value::Value;

/// Test body: receives fixtures and parameters by name.
pub type TestFn = Arc<dyn Fn(&Args) -> Outcome + Send + Sync>;

/// Builds a `Vec<Value>` from heterogeneous literals.
///
/// ```rust
/// use trial::{values, Value};
/// assert_eq!(values![4, "five"], vec![Value::Int(4), Value::from("five")]);
/// ```
#[macro_export]
macro_rules! values {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::value::Value::from($value)),*]
    };
}

/// One row of a parameter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCase {
    pub values: Vec<Value>,
    pub id: Option<String>,
    pub marks: Vec<Mark>,
}

impl ParamCase {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            id: None,
            marks: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }
}

/// A parameter table: argument names plus one row per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSet {
    pub argnames: Vec<String>,
    pub cases: Vec<ParamCase>,
}

impl ParamSet {
    /// `argnames` is a comma-separated list, e.g. `"input_arg, expected_result"`.
    pub fn new(argnames: &str, cases: Vec<ParamCase>) -> Self {
        Self {
            argnames: argnames
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            cases,
        }
    }

    /// A single-argument table with one case per value.
    pub fn single<I, V>(argname: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            argname,
            values
                .into_iter()
                .map(|v| ParamCase::new(vec![v.into()]))
                .collect(),
        )
    }

    /// Replaces the ids of the cases in order; extra ids are ignored.
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (case, id) in self.cases.iter_mut().zip(ids) {
            case.id = Some(id.into());
        }
        self
    }
}

#[derive(Clone)]
pub struct TestDef {
    pub name: String,
    pub requires: Vec<String>,
    pub params: Vec<ParamSet>,
    pub marks: Vec<Mark>,
    body: TestFn,
}

impl TestDef {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Args) -> Outcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            requires: Vec::new(),
            params: Vec::new(),
            marks: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Requests a fixture by name.
    pub fn fixture(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }

    /// Adds a parameter table. Stacked tables multiply: the first table
    /// added varies slowest.
    pub fn parametrize(mut self, set: ParamSet) -> Self {
        self.params.push(set);
        self
    }

    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub(crate) fn body(&self) -> &TestFn {
        &self.body
    }
}

impl fmt::Debug for TestDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDef")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("params", &self.params)
            .field("marks", &self.marks)
            .finish_non_exhaustive()
    }
}

/// A named group of tests sharing module-level marks.
#[derive(Debug, Clone)]
pub struct TestModule {
    pub name: String,
    pub marks: Vec<Mark>,
    pub tests: Vec<TestDef>,
}

impl TestModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marks: Vec::new(),
            tests: Vec::new(),
        }
    }

    /// Applies `mark` to every test in the module.
    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn test(mut self, test: TestDef) -> Self {
        self.tests.push(test);
        self
    }
}

/// Everything a run needs: the fixture registry and the modules.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    pub fixtures: FixtureRegistry,
    pub modules: Vec<TestModule>,
}

impl Suite {
    pub fn new(fixtures: FixtureRegistry) -> Self {
        Self {
            fixtures,
            modules: Vec::new(),
        }
    }

    pub fn module(mut self, module: TestModule) -> Self {
        self.modules.push(module);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argnames_are_split_and_trimmed() {
        let set = ParamSet::new("input_arg, expected_result", vec![]);
        assert_eq!(set.argnames, vec!["input_arg", "expected_result"]);
    }

    #[test]
    fn ids_apply_in_order() {
        let set = ParamSet::new(
            "a, b",
            vec![ParamCase::new(values![4, 5]), ParamCase::new(values![3, 5])],
        )
        .ids(["First parameter", "Second parameter"]);
        assert_eq!(set.cases[0].id.as_deref(), Some("First parameter"));
        assert_eq!(set.cases[1].id.as_deref(), Some("Second parameter"));
    }

    #[test]
    fn single_builds_one_case_per_value() {
        let set = ParamSet::single("x", [1, 2]);
        assert_eq!(set.argnames, vec!["x"]);
        assert_eq!(set.cases.len(), 2);
        assert_eq!(set.cases[1].values, vec![Value::Int(2)]);
    }
}

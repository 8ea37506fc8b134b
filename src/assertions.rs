//! Assertion helpers for test bodies and fixture providers.
//!
//! A body returns [`Outcome`]; any `Err(Failure)` marks the invocation as
//! failed. The `ensure*` helpers build failures that carry both sides of a
//! comparison so the reporter can render a diff.

use std::fmt;

use serde::Serialize;

use crate::errors::TrialError;
use crate::value::{Value, ValueType};

/// Result type of test bodies and fixture providers.
pub type Outcome<T = ()> = Result<T, Failure>;

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// An `ensure*` check did not hold.
    Assertion,
    /// The body raised an error other than an assertion.
    Error,
    /// A fixture could not be instantiated.
    Setup,
    /// The body or a provider panicked.
    Panic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Assertion, message)
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Setup, message)
    }

    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Panic, message)
    }

    /// Attaches pretty-printed expected/actual sides for diff rendering.
    pub fn with_sides(mut self, expected: impl fmt::Debug, actual: impl fmt::Debug) -> Self {
        self.expected = Some(format!("{expected:#?}"));
        self.actual = Some(format!("{actual:#?}"));
        self
    }

    /// Re-labels a provider failure as a setup failure of `fixture`.
    pub(crate) fn in_fixture(self, fixture: &str) -> Self {
        Self {
            kind: FailureKind::Setup,
            message: format!("fixture '{fixture}': {}", self.message),
            ..self
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

impl From<TrialError> for Failure {
    fn from(err: TrialError) -> Self {
        Failure::new(FailureKind::Error, err.to_string())
    }
}

pub fn ensure(condition: bool, message: impl Into<String>) -> Outcome {
    if condition {
        Ok(())
    } else {
        Err(Failure::assertion(message))
    }
}

/// Fails unless `actual == expected`.
pub fn ensure_eq<A, E>(actual: A, expected: E) -> Outcome
where
    A: PartialEq<E> + fmt::Debug,
    E: fmt::Debug,
{
    if actual == expected {
        return Ok(());
    }
    Err(
        Failure::assertion(format!("assert {actual:?} == {expected:?}"))
            .with_sides(&expected, &actual),
    )
}

pub fn ensure_ne<A, E>(actual: A, unexpected: E) -> Outcome
where
    A: PartialEq<E> + fmt::Debug,
    E: fmt::Debug,
{
    if actual != unexpected {
        return Ok(());
    }
    Err(Failure::assertion(format!(
        "assert {actual:?} != {unexpected:?}"
    )))
}

/// Fails unless `value` carries the `expected` type tag.
pub fn ensure_type(value: &Value, expected: ValueType) -> Outcome {
    let actual = value.value_type();
    if actual == expected {
        return Ok(());
    }
    Err(Failure::assertion(format!(
        "assert isinstance({value:?}, {expected}): got {actual}"
    ))
    .with_sides(expected, actual))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_eq_records_both_sides() {
        let failure = ensure_eq(4, 5).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Assertion);
        assert_eq!(failure.message, "assert 4 == 5");
        assert_eq!(failure.expected.as_deref(), Some("5"));
        assert_eq!(failure.actual.as_deref(), Some("4"));
    }

    #[test]
    fn ensure_eq_compares_across_types() {
        let sorted = vec!["a".to_string(), "b".to_string()];
        assert!(ensure_eq(sorted, vec!["a", "b"]).is_ok());
    }

    #[test]
    fn ensure_type_reports_the_actual_tag() {
        let failure = ensure_type(&Value::from(vec![1]), ValueType::Int).unwrap_err();
        assert!(failure.message.contains("got List"));
        assert!(ensure_type(&Value::Int(1), ValueType::Int).is_ok());
    }

    #[test]
    fn trial_errors_become_error_failures() {
        let err = Value::Nil.mul(&Value::Nil).unwrap_err();
        let failure = Failure::from(err);
        assert_eq!(failure.kind, FailureKind::Error);
        assert!(failure.message.contains("'Nil' and 'Nil'"));
    }

    #[test]
    fn fixture_failures_are_relabelled_as_setup() {
        let failure = Failure::assertion("boom").in_fixture("db");
        assert_eq!(failure.kind, FailureKind::Setup);
        assert_eq!(failure.message, "fixture 'db': boom");
    }
}

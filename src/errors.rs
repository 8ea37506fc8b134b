//! Trial error handling.
//!
//! Everything in [`TrialError`] aborts collection, configuration or a run.
//! A test body that fails is not an error in this sense: it produces a
//! [`Failure`](crate::assertions::Failure) value that the runner classifies.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = TrialError> = std::result::Result<T, E>;

/// Unified error type for collection, configuration and reporting failures.
#[derive(Debug, Error, Diagnostic)]
pub enum TrialError {
    #[error("fixture '{name}' is registered twice")]
    #[diagnostic(
        code(trial::fixture::duplicate),
        help("fixture names must be unique within a registry")
    )]
    DuplicateFixture { name: String },

    #[error("fixture '{name}' not found (requested by '{requested_by}')")]
    #[diagnostic(code(trial::fixture::unknown), help("available fixtures: {available}"))]
    UnknownFixture {
        name: String,
        requested_by: String,
        available: String,
    },

    #[error("session-scoped fixture '{fixture}' requests '{requested}', which has a narrower scope")]
    #[diagnostic(
        code(trial::fixture::scope_mismatch),
        help("a session fixture is created once per run; it may only depend on other session fixtures")
    )]
    ScopeMismatch { fixture: String, requested: String },

    #[error("fixture dependency cycle: {chain}")]
    #[diagnostic(code(trial::fixture::cycle))]
    FixtureCycle { chain: String },

    #[error("parametrize of '{test}' declares {expected} argument(s) but case {index} has {actual} value(s)")]
    #[diagnostic(code(trial::collect::param_arity))]
    ParamArity {
        test: String,
        expected: usize,
        actual: usize,
        index: usize,
    },

    #[error("'{mark}' not found in `markers` configuration option (used by '{test}')")]
    #[diagnostic(
        code(trial::mark::unknown),
        help("register the marker under `markers` in trial.yaml, or run without --strict-markers")
    )]
    UnknownMarker { mark: String, test: String },

    #[error("wrong expression passed to '-{flag}'")]
    #[diagnostic(code(trial::mark::expression))]
    Expression {
        flag: char,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("unsupported operand types for {operation}: '{left}' and '{right}'")]
    #[diagnostic(code(trial::value::type_mismatch))]
    TypeMismatch {
        operation: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("integer overflow in {operation}")]
    #[diagnostic(code(trial::value::overflow))]
    Overflow { operation: &'static str },

    #[error("failed to read config '{path}'")]
    #[diagnostic(code(trial::config::io))]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}'")]
    #[diagnostic(code(trial::config::parse))]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write report")]
    #[diagnostic(code(trial::report::io))]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report")]
    #[diagnostic(code(trial::report::json))]
    Json(#[from] serde_json::Error),
}

impl TrialError {
    /// Builds an expression error pointing at `offset..offset + len` of `input`.
    pub fn expression(
        flag: char,
        input: &str,
        offset: usize,
        len: usize,
        message: impl Into<String>,
    ) -> Self {
        TrialError::Expression {
            flag,
            src: NamedSource::new(format!("-{flag}"), input.to_string()),
            span: (offset, len).into(),
            message: message.into(),
        }
    }
}

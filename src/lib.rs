//! Trial: fixture injection and parametrization for explicitly described
//! test suites.
//!
//! A [`Suite`] holds a [`FixtureRegistry`] and a list of [`TestModule`]s.
//! Collection expands each test into invocations, one per row of its
//! parameter tables, and the [`Runner`] executes them in order.

pub use crate::args::Args;
pub use crate::assertions::{ensure, ensure_eq, ensure_ne, ensure_type, Failure, FailureKind, Outcome};
pub use crate::case::{ParamCase, ParamSet, Suite, TestDef, TestModule};
pub use crate::collect::{collect, Collection, Invocation, Selection};
pub use crate::config::{RunOptions, TrialConfig};
pub use crate::errors::{Result, TrialError};
pub use crate::fixtures::{FixtureDef, FixtureRegistry, Scope};
pub use crate::marks::Mark;
pub use crate::report::{RunSummary, Status, TestReport};
pub use crate::runner::Runner;
pub use crate::value::{Value, ValueType};

pub mod args;
pub mod assertions;
pub mod case;
pub mod cli;
pub mod collect;
pub mod config;
pub mod demo;
pub mod errors;
pub mod fixtures;
pub mod marks;
pub mod report;
pub mod runner;
pub mod value;

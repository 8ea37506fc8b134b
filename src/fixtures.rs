//! Fixture registry and dependency resolution.
//!
//! Fixtures are registered by name with the names of the fixtures they
//! require. Nothing is looked up implicitly: the collector asks the registry
//! for a [`plan`](FixtureRegistry::plan) per test, and the runner executes
//! that plan with [`instantiate`](FixtureRegistry::instantiate) for every
//! invocation.
//!
//! ## Invariants
//! - A plan lists each fixture at most once, dependencies before dependants.
//! - Function-scoped fixtures are created fresh for every invocation.
//! - Session-scoped fixtures are created once per run and then reused.
//! - A session-scoped fixture never depends on a parameter or on a
//!   function-scoped fixture; `plan` rejects such a chain.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::args::Args;
use crate::assertions::{Failure, Outcome};
use crate::errors::{Result, TrialError};
use crate::value::Value;

/// Provider callable: receives the already-resolved dependencies.
pub type Provider = Arc<dyn Fn(&Args) -> Outcome<Value> + Send + Sync>;

/// Values of session-scoped fixtures, shared across one run.
pub type SessionCache = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Function,
    Session,
}

#[derive(Clone)]
pub struct FixtureDef {
    pub name: String,
    pub requires: Vec<String>,
    pub scope: Scope,
    provider: Provider,
}

impl FixtureDef {
    pub fn new<F>(name: impl Into<String>, provider: F) -> Self
    where
        F: Fn(&Args) -> Outcome<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            requires: Vec::new(),
            scope: Scope::Function,
            provider: Arc::new(provider),
        }
    }

    /// Declares a dependency on another fixture.
    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    fn call(&self, args: &Args) -> Outcome<Value> {
        (self.provider)(args).map_err(|f| f.in_fixture(&self.name))
    }
}

impl fmt::Debug for FixtureDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureDef")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    defs: BTreeMap<String, FixtureDef>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: FixtureDef) -> Result<()> {
        if self.defs.contains_key(&def.name) {
            return Err(TrialError::DuplicateFixture { name: def.name });
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FixtureDef> {
        self.defs.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Computes the instantiation order for the fixtures `requester` asks for.
    ///
    /// Names in `provided` are supplied by parametrization and are neither
    /// looked up nor expanded.
    pub fn plan(
        &self,
        requester: &str,
        requested: &[String],
        provided: &BTreeSet<String>,
    ) -> Result<Vec<String>> {
        let mut state = HashMap::new();
        let mut stack = Vec::new();
        let mut order = Vec::new();
        for name in requested {
            self.visit(name, requester, provided, &mut state, &mut stack, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        requested_by: &str,
        provided: &BTreeSet<String>,
        state: &mut HashMap<String, Visit>,
        stack: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if provided.contains(name) {
            return Ok(());
        }
        match state.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::Active) => {
                let start = stack.iter().position(|n| n == name).unwrap_or(0);
                let mut chain = stack[start..].to_vec();
                chain.push(name.to_string());
                return Err(TrialError::FixtureCycle {
                    chain: chain.join(" -> "),
                });
            }
            None => {}
        }
        let def = self.defs.get(name).ok_or_else(|| TrialError::UnknownFixture {
            name: name.to_string(),
            requested_by: requested_by.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        })?;

        if def.scope == Scope::Session {
            self.check_session_deps(def, provided)?;
        }

        state.insert(name.to_string(), Visit::Active);
        stack.push(name.to_string());
        for dep in &def.requires {
            self.visit(dep, name, provided, state, stack, order)?;
        }
        stack.pop();
        state.insert(name.to_string(), Visit::Done);
        order.push(name.to_string());
        Ok(())
    }

    /// A session-scoped fixture is cached across invocations, so it may only
    /// depend on other session-scoped fixtures.
    fn check_session_deps(&self, def: &FixtureDef, provided: &BTreeSet<String>) -> Result<()> {
        for dep in &def.requires {
            let narrower = provided.contains(dep)
                || self
                    .defs
                    .get(dep)
                    .map_or(false, |d| d.scope == Scope::Function);
            if narrower {
                return Err(TrialError::ScopeMismatch {
                    fixture: def.name.clone(),
                    requested: dep.clone(),
                });
            }
        }
        Ok(())
    }

    /// Runs the providers of `plan` in order, adding each result to `args`.
    pub fn instantiate(
        &self,
        plan: &[String],
        mut args: Args,
        session: &mut SessionCache,
    ) -> Outcome<Args> {
        for name in plan {
            let def = self.defs.get(name).ok_or_else(|| {
                Failure::setup(format!("fixture '{name}' is not registered"))
            })?;
            let value = match def.scope {
                Scope::Function => def.call(&args)?,
                Scope::Session => match session.get(name) {
                    Some(cached) => cached.clone(),
                    None => {
                        let value = def.call(&args)?;
                        session.insert(name.clone(), value.clone());
                        value
                    }
                },
            };
            trace!(fixture = %name, scope = ?def.scope, value = ?value, "fixture ready");
            args.insert(name.clone(), value);
        }
        Ok(args)
    }
}

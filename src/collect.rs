//! Discovery, expansion and selection.
//!
//! Collection walks a [`Suite`], keeps the modules and tests whose names
//! carry the configured prefix, expands every test into one [`Invocation`]
//! per combination of its parameter tables, plans its fixtures, and finally
//! applies the `-m`/`-k` selection.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::debug;

use crate::args::Args;
use crate::case::{ParamSet, Suite, TestDef, TestFn, TestModule};
use crate::config::TrialConfig;
use crate::errors::{Result, TrialError};
use crate::marks::{Mark, MarkExpr};
use crate::value::Value;

/// One executable unit: a test with one concrete parameter combination.
#[derive(Clone)]
pub struct Invocation {
    pub node_id: String,
    pub module: String,
    pub test: String,
    pub param_id: Option<String>,
    pub params: Args,
    pub marks: Vec<Mark>,
    pub(crate) plan: Vec<String>,
    pub(crate) body: TestFn,
}

impl Invocation {
    pub fn mark_names(&self) -> Vec<&str> {
        self.marks.iter().map(Mark::name).collect()
    }

    /// Keywords `-k` matches against: the item name, its module and its marks.
    pub fn keywords(&self) -> Vec<String> {
        let item = match &self.param_id {
            Some(id) => format!("{}[{id}]", self.test),
            None => self.test.clone(),
        };
        let mut keywords = vec![item, self.module.clone()];
        keywords.extend(self.marks.iter().map(|m| m.name().to_string()));
        keywords
    }

    /// Fixtures instantiated for this invocation, in order.
    pub fn fixture_plan(&self) -> &[String] {
        &self.plan
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("node_id", &self.node_id)
            .field("params", &self.params)
            .field("marks", &self.marks)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// A test that could not be collected.
#[derive(Debug)]
pub struct CollectError {
    pub node_id: String,
    pub error: TrialError,
}

/// Compiled `-m` and `-k` expressions.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub marks: Option<MarkExpr>,
    pub keywords: Option<MarkExpr>,
}

impl Selection {
    pub fn parse(mark_expr: Option<&str>, keyword_expr: Option<&str>) -> Result<Self> {
        Ok(Self {
            marks: mark_expr.map(|e| MarkExpr::parse('m', e)).transpose()?,
            keywords: keyword_expr.map(|e| MarkExpr::parse('k', e)).transpose()?,
        })
    }

    pub fn selects(&self, item: &Invocation) -> bool {
        let by_marks = self
            .marks
            .as_ref()
            .map_or(true, |expr| expr.matches_marks(&item.mark_names()));
        let by_keywords = self
            .keywords
            .as_ref()
            .map_or(true, |expr| expr.matches_keywords(&item.keywords()));
        by_marks && by_keywords
    }
}

#[derive(Debug, Default)]
pub struct Collection {
    pub items: Vec<Invocation>,
    pub deselected: Vec<String>,
    pub errors: Vec<CollectError>,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn collect(suite: &Suite, config: &TrialConfig, selection: &Selection) -> Collection {
    let mut collection = Collection::default();
    for module in &suite.modules {
        if !module.name.starts_with(&config.test_prefix) {
            debug!(module = %module.name, "module ignored: name lacks test prefix");
            continue;
        }
        for test in &module.tests {
            if !test.name.starts_with(&config.test_prefix) {
                debug!(module = %module.name, test = %test.name, "test ignored: name lacks test prefix");
                continue;
            }
            match collect_test(suite, config, module, test) {
                Ok(items) => {
                    for item in items {
                        if selection.selects(&item) {
                            collection.items.push(item);
                        } else {
                            debug!(node = %item.node_id, "deselected");
                            collection.deselected.push(item.node_id);
                        }
                    }
                }
                Err(error) => collection.errors.push(CollectError {
                    node_id: format!("{}::{}", module.name, test.name),
                    error,
                }),
            }
        }
    }
    debug!(
        collected = collection.items.len(),
        deselected = collection.deselected.len(),
        errors = collection.errors.len(),
        "collection finished"
    );
    collection
}

fn collect_test(
    suite: &Suite,
    config: &TrialConfig,
    module: &TestModule,
    test: &TestDef,
) -> Result<Vec<Invocation>> {
    let base_id = format!("{}::{}", module.name, test.name);
    if config.strict_markers {
        check_markers(config, module, test)?;
    }
    for set in &test.params {
        check_arity(test, set)?;
    }

    let provided: BTreeSet<String> = test
        .params
        .iter()
        .flat_map(|set| set.argnames.iter().cloned())
        .collect();
    let plan = suite.fixtures.plan(&base_id, &test.requires, &provided)?;
    debug!(node = %base_id, plan = ?plan, "fixture plan");

    let mut marks = module.marks.clone();
    marks.extend(test.marks.iter().cloned());

    Ok(expand(test)
        .into_iter()
        .map(|combo| {
            let mut item_marks = marks.clone();
            item_marks.extend(combo.marks);
            Invocation {
                node_id: match &combo.id {
                    Some(id) => format!("{base_id}[{id}]"),
                    None => base_id.clone(),
                },
                module: module.name.clone(),
                test: test.name.clone(),
                param_id: combo.id,
                params: combo.params,
                marks: item_marks,
                plan: plan.clone(),
                body: test.body().clone(),
            }
        })
        .collect())
}

fn check_markers(config: &TrialConfig, module: &TestModule, test: &TestDef) -> Result<()> {
    let case_marks = test
        .params
        .iter()
        .flat_map(|set| set.cases.iter().flat_map(|c| c.marks.iter()));
    for mark in module.marks.iter().chain(&test.marks).chain(case_marks) {
        if !config.is_known_marker(mark.name()) {
            return Err(TrialError::UnknownMarker {
                mark: mark.name().to_string(),
                test: test.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_arity(test: &TestDef, set: &ParamSet) -> Result<()> {
    for (index, case) in set.cases.iter().enumerate() {
        if case.values.len() != set.argnames.len() {
            return Err(TrialError::ParamArity {
                test: test.name.clone(),
                expected: set.argnames.len(),
                actual: case.values.len(),
                index,
            });
        }
    }
    Ok(())
}

/// A partially built parameter combination.
#[derive(Debug, Clone, Default)]
struct Combo {
    id: Option<String>,
    params: Args,
    marks: Vec<Mark>,
}

/// Cartesian product of all parameter tables; the first table varies slowest.
fn expand(test: &TestDef) -> Vec<Combo> {
    let mut combos = vec![Combo::default()];
    for set in &test.params {
        if set.cases.is_empty() {
            return vec![empty_set_combo(set)];
        }
        let ids = case_ids(set);
        let mut next = Vec::with_capacity(combos.len() * set.cases.len());
        for combo in &combos {
            for (case, id) in set.cases.iter().zip(&ids) {
                let mut params = combo.params.clone();
                for (name, value) in set.argnames.iter().zip(&case.values) {
                    params.insert(name.clone(), value.clone());
                }
                let mut marks = combo.marks.clone();
                marks.extend(case.marks.iter().cloned());
                next.push(Combo {
                    id: Some(match &combo.id {
                        Some(prefix) => format!("{prefix}-{id}"),
                        None => id.clone(),
                    }),
                    params,
                    marks,
                });
            }
        }
        combos = next;
    }
    combos
}

fn empty_set_combo(set: &ParamSet) -> Combo {
    let names = set.argnames.join(", ");
    Combo {
        id: Some(format!("{}0", set.argnames.join("-"))),
        params: Args::new(),
        marks: vec![Mark::skip_because(format!(
            "got empty parameter set [{names}]"
        ))],
    }
}

fn case_ids(set: &ParamSet) -> Vec<String> {
    let ids: Vec<String> = set
        .cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            case.id.clone().unwrap_or_else(|| {
                case.values
                    .iter()
                    .zip(&set.argnames)
                    .map(|(value, name)| auto_id(value, name, index))
                    .collect::<Vec<_>>()
                    .join("-")
            })
        })
        .collect();
    disambiguate(ids)
}

/// Scalars render the way pytest prints them in ids (`None`, `True`);
/// lists fall back to `<argname><index>`.
fn auto_id(value: &Value, argname: &str, index: usize) -> String {
    match value {
        Value::Nil => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::List(_) => format!("{argname}{index}"),
        other => other.to_string(),
    }
}

/// Suffixes repeated ids with a per-id counter: `a0`, `a1`, ...
fn disambiguate(ids: Vec<String>) -> Vec<String> {
    let mut totals: HashMap<String, usize> = HashMap::new();
    for id in &ids {
        *totals.entry(id.clone()).or_default() += 1;
    }
    let mut seen: HashMap<String, usize> = HashMap::new();
    ids.into_iter()
        .map(|id| {
            if totals.get(&id).copied().unwrap_or(0) < 2 {
                return id;
            }
            let counter = seen.entry(id.clone()).or_default();
            let separator = if id.ends_with(|c: char| c.is_ascii_digit()) {
                "_"
            } else {
                ""
            };
            let unique = format!("{id}{separator}{counter}");
            *counter += 1;
            unique
        })
        .collect()
}

//! Execution and classification of collected invocations.
//!
//! The runner is single-threaded: each invocation is set up, executed and
//! classified before the next one starts. A failing invocation never stops
//! its siblings unless `exitfirst` is set.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread;
use std::time::Instant;

use tracing::{debug, info};

use crate::args::Args;
use crate::assertions::{Failure, Outcome};
use crate::case::Suite;
use crate::collect::{Collection, Invocation};
use crate::config::{RunOptions, TrialConfig};
use crate::fixtures::SessionCache;
use crate::marks::{skip_reason, xfail_spec};
use crate::report::{CollectErrorReport, RunSummary, Status, TestReport};

pub struct Runner<'a> {
    suite: &'a Suite,
    config: &'a TrialConfig,
    options: &'a RunOptions,
}

impl<'a> Runner<'a> {
    pub fn new(suite: &'a Suite, config: &'a TrialConfig, options: &'a RunOptions) -> Self {
        Self {
            suite,
            config,
            options,
        }
    }

    pub fn run(&self, collection: &Collection) -> RunSummary {
        self.run_with(collection, &mut |_| {})
    }

    /// Runs every invocation, handing each report to `observer` as soon as
    /// it is classified.
    ///
    /// Collection errors abort the run before anything executes.
    pub fn run_with(
        &self,
        collection: &Collection,
        observer: &mut dyn FnMut(&TestReport),
    ) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary {
            deselected: collection.deselected.clone(),
            errors: collection
                .errors
                .iter()
                .map(|e| CollectErrorReport {
                    node_id: e.node_id.clone(),
                    message: e.error.to_string(),
                })
                .collect(),
            ..RunSummary::default()
        };
        if !summary.errors.is_empty() {
            summary.duration = started.elapsed();
            return summary.finish();
        }

        info!(items = collection.items.len(), "run started");

        let mut session = SessionCache::new();
        let mut stopped = false;
        for item in &collection.items {
            if stopped {
                summary.not_run.push(item.node_id.clone());
                continue;
            }
            let report = self.run_one(item, &mut session);
            debug!(node = %report.node_id, outcome = report.status.label(), "invocation finished");
            if self.options.exitfirst && report.status.is_failure() {
                stopped = true;
            }
            observer(&report);
            summary.reports.push(report);
        }

        summary.duration = started.elapsed();
        let summary = summary.finish();
        info!(exit_code = summary.exit_code, "run finished");
        summary
    }

    fn run_one(&self, item: &Invocation, session: &mut SessionCache) -> TestReport {
        let started = Instant::now();
        let status = self.classify(item, session);
        TestReport {
            node_id: item.node_id.clone(),
            module: item.module.clone(),
            test: item.test.clone(),
            param_id: item.param_id.clone(),
            params: item.params.clone(),
            status,
            duration: started.elapsed(),
        }
    }

    fn classify(&self, item: &Invocation, session: &mut SessionCache) -> Status {
        if let Some(reason) = skip_reason(&item.marks) {
            return Status::Skipped { reason };
        }
        let xfail = if self.options.runxfail {
            None
        } else {
            xfail_spec(&item.marks, self.config.xfail_strict)
        };
        if let Some(spec) = xfail.as_ref().filter(|spec| !spec.run) {
            return Status::XFailed {
                reason: format!("[NOTRUN] {}", spec.reason).trim_end().to_string(),
            };
        }

        let args = match self.setup(item, session) {
            Ok(args) => args,
            Err(failure) => return Status::Failed { failure },
        };
        let result = call_body(item, &args);

        match (result, xfail) {
            (Ok(()), None) => Status::Passed,
            (Err(failure), None) => Status::Failed { failure },
            (Err(_), Some(spec)) => Status::XFailed {
                reason: spec.reason,
            },
            (Ok(()), Some(spec)) if spec.strict => Status::Failed {
                failure: Failure::assertion(
                    format!("[XPASS(strict)] {}", spec.reason).trim_end().to_string(),
                ),
            },
            (Ok(()), Some(spec)) => Status::XPassed {
                reason: spec.reason,
            },
        }
    }

    fn setup(&self, item: &Invocation, session: &mut SessionCache) -> Outcome<Args> {
        let fixtures = &self.suite.fixtures;
        quietly(|| fixtures.instantiate(&item.plan, item.params.clone(), session))
            .unwrap_or_else(|payload| Err(Failure::setup(panic_message(payload.as_ref()))))
    }
}

fn call_body(item: &Invocation, args: &Args) -> Outcome {
    quietly(|| (item.body)(args))
        .unwrap_or_else(|payload| Err(Failure::panic(panic_message(payload.as_ref()))))
}

thread_local! {
    static CATCHING: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wraps the current panic hook, once per process, so that panics caught by
/// [`quietly`] on this thread are not printed. Every other panic still
/// reaches the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CATCHING.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

fn quietly<T>(f: impl FnOnce() -> T) -> thread::Result<T> {
    install_quiet_hook();
    let outer = CATCHING.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CATCHING.with(|flag| flag.set(outer));
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    }
}

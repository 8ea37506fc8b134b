//! The Trial Command-Line Interface.
//!
//! This module is the main entry point for the `trial` binary and
//! orchestrates configuration, collection, execution and reporting.

use std::io::Write;
use std::path::Path;
use std::process;
use std::time::Duration;

use clap::Parser;
use termcolor::{StandardStream, WriteColor};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::case::Suite;
use crate::cli::args::TrialArgs;
use crate::cli::output::TerminalReporter;
use crate::collect::{collect, Collection, Selection};
use crate::config::{RunOptions, TrialConfig};
use crate::demo;
use crate::errors::Result;
use crate::report::{
    CollectErrorReport, RunSummary, EXIT_INTERRUPTED, EXIT_NO_TESTS_COLLECTED, EXIT_OK,
    EXIT_USAGE_ERROR,
};
use crate::runner::Runner;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = TrialArgs::parse();
    init_tracing(args.verbose);

    let code = match execute(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            EXIT_USAGE_ERROR
        }
    };
    process::exit(code);
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise `-vv` enables debug and
/// `-vvv` trace.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 | 1 => "warn",
        2 => "trial=debug",
        _ => "trial=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok();
}

/// Loads configuration, applies CLI overrides and runs the demo suite.
pub fn execute(args: &TrialArgs) -> Result<i32> {
    let mut config = TrialConfig::discover(args.config.as_deref(), Path::new("."))?;
    if args.strict_markers {
        config.strict_markers = true;
    }
    if let Some(color) = args.color {
        config.color = color;
    }
    let options = args.run_options();
    let mut stdout = StandardStream::stdout(config.color.choice());

    if args.markers {
        TerminalReporter::new(&mut stdout, options.verbosity).markers(&config)?;
        return Ok(EXIT_OK);
    }

    let suite = demo::suite_with_delay(Duration::from_millis(config.slow_delay_ms))?;
    let summary = run_suite(&suite, &config, &options, &mut stdout)?;
    Ok(summary.exit_code)
}

/// Collects and runs `suite`, writing the report to `out`.
///
/// With `collect_only` the selected node ids are listed and nothing runs;
/// the returned summary then has no reports.
pub fn run_suite(
    suite: &Suite,
    config: &TrialConfig,
    options: &RunOptions,
    out: &mut dyn WriteColor,
) -> Result<RunSummary> {
    let selection = Selection::parse(options.mark_expr.as_deref(), options.keyword_expr.as_deref())?;
    let collection = collect(suite, config, &selection);
    let runner = Runner::new(suite, config, options);

    if options.json {
        let summary = if options.collect_only {
            collected_summary(&collection)
        } else {
            runner.run(&collection)
        };
        serde_json::to_writer_pretty(&mut *out, &summary)?;
        writeln!(out)?;
        return Ok(summary);
    }

    let mut reporter = TerminalReporter::new(out, options.verbosity);
    reporter.header(&collection)?;
    if options.collect_only {
        reporter.collect_only(&collection)?;
        return Ok(collected_summary(&collection));
    }

    let mut write_error = None;
    let summary = runner.run_with(&collection, &mut |report| {
        if write_error.is_none() {
            if let Err(e) = reporter.report(report) {
                write_error = Some(e);
            }
        }
    });
    if let Some(e) = write_error {
        warn!(error = %e, "report output failed");
        return Err(e.into());
    }
    reporter.finish(&summary)?;
    Ok(summary)
}

/// Summary of a `--collect-only` pass: nothing ran, so the exit code only
/// reflects what was collected.
fn collected_summary(collection: &Collection) -> RunSummary {
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
    }
    .finish();
    summary.exit_code = if !summary.errors.is_empty() {
        EXIT_INTERRUPTED
    } else if collection.is_empty() {
        EXIT_NO_TESTS_COLLECTED
    } else {
        EXIT_OK
    };
    summary
}

//! Defines the command-line arguments for the Trial CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{ColorMode, RunOptions};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "trial",
    version,
    about = "Run the fixture and parametrization demo suite."
)]
pub struct TrialArgs {
    /// Only run tests whose marks match the expression, e.g. "not slow".
    #[arg(short = 'm', value_name = "MARKEXPR")]
    pub marks: Option<String>,

    /// Only run tests whose names match the expression, e.g. "sort or product".
    #[arg(short = 'k', value_name = "EXPRESSION")]
    pub keywords: Option<String>,

    /// Stop after the first failure.
    #[arg(short = 'x', long)]
    pub exitfirst: bool,

    /// Report xfail-marked tests as if they were not marked.
    #[arg(long)]
    pub runxfail: bool,

    /// List the selected tests without running them.
    #[arg(long)]
    pub collect_only: bool,

    /// List the known markers and exit.
    #[arg(long)]
    pub markers: bool,

    /// Print the run summary as JSON instead of the terminal report.
    #[arg(long)]
    pub json: bool,

    /// Reject marks that are not registered in the configuration.
    #[arg(long)]
    pub strict_markers: bool,

    /// When to color the terminal report.
    #[arg(long, value_enum, value_name = "WHEN")]
    pub color: Option<ColorMode>,

    /// Configuration file (defaults to ./trial.yaml when present).
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity; repeat for debug logging.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Decrease verbosity.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,
}

impl TrialArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            mark_expr: self.marks.clone(),
            keyword_expr: self.keywords.clone(),
            exitfirst: self.exitfirst,
            runxfail: self.runxfail,
            collect_only: self.collect_only,
            json: self.json,
            verbosity: i8::try_from(i16::from(self.verbose) - i16::from(self.quiet))
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_run_options() {
        let args = TrialArgs::parse_from(["trial", "-m", "not slow", "-x", "-vv", "--runxfail"]);
        let options = args.run_options();
        assert_eq!(options.mark_expr.as_deref(), Some("not slow"));
        assert!(options.exitfirst);
        assert!(options.runxfail);
        assert_eq!(options.verbosity, 2);
    }

    #[test]
    fn quiet_is_negative_verbosity() {
        let args = TrialArgs::parse_from(["trial", "-q"]);
        assert_eq!(args.run_options().verbosity, -1);
    }

    #[test]
    fn color_accepts_value_enum() {
        let args = TrialArgs::parse_from(["trial", "--color", "never"]);
        assert_eq!(args.color, Some(ColorMode::Never));
    }
}

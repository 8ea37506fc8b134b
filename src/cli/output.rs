//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for progress lines, colorized outcomes,
//! failure sections with diffs, and the final summary. By centralizing
//! output logic here, we ensure a consistent report across all commands.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::collect::Collection;
use crate::config::TrialConfig;
use crate::marks::BUILTIN_MARKS;
use crate::report::{RunSummary, Status, TestReport};

const RULE_WIDTH: usize = 72;

/// Writes the terminal report to any color-capable writer.
pub struct TerminalReporter<'w> {
    out: &'w mut dyn WriteColor,
    verbosity: i8,
    progress: usize,
}

impl<'w> TerminalReporter<'w> {
    pub fn new(out: &'w mut dyn WriteColor, verbosity: i8) -> Self {
        Self {
            out,
            verbosity,
            progress: 0,
        }
    }

    pub fn header(&mut self, collection: &Collection) -> io::Result<()> {
        if self.verbosity < 0 {
            return Ok(());
        }
        let mut line = format!("collected {} items", collection.items.len() + collection.deselected.len());
        if !collection.deselected.is_empty() {
            line.push_str(&format!(
                " / {} deselected / {} selected",
                collection.deselected.len(),
                collection.items.len()
            ));
        }
        if !collection.errors.is_empty() {
            line.push_str(&format!(" / {} errors", collection.errors.len()));
        }
        self.out.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(self.out, "{line}")?;
        self.out.reset()?;
        writeln!(self.out)
    }

    pub fn collect_only(&mut self, collection: &Collection) -> io::Result<()> {
        for item in &collection.items {
            writeln!(self.out, "{}", item.node_id)?;
        }
        Ok(())
    }

    pub fn report(&mut self, report: &TestReport) -> io::Result<()> {
        let color = status_color(&report.status);
        if self.verbosity > 0 {
            write!(self.out, "{} ", report.node_id)?;
            self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
            write!(self.out, "{}", report.status.label())?;
            self.out.reset()?;
            match &report.status {
                Status::Skipped { reason }
                | Status::XFailed { reason }
                | Status::XPassed { reason }
                    if !reason.is_empty() =>
                {
                    write!(self.out, " ({reason})")?
                }
                _ => {}
            }
            return writeln!(self.out);
        }
        self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(self.out, "{}", report.status.short())?;
        self.out.reset()?;
        self.progress += 1;
        if self.progress % RULE_WIDTH == 0 {
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Ends the progress line, then prints errors, failures and the summary.
    pub fn finish(&mut self, summary: &RunSummary) -> io::Result<()> {
        if self.progress % RULE_WIDTH != 0 {
            writeln!(self.out)?;
        }
        if !summary.errors.is_empty() {
            self.rule("ERRORS", Color::Red)?;
            for error in &summary.errors {
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                writeln!(self.out, "ERROR collecting {}", error.node_id)?;
                self.out.reset()?;
                writeln!(self.out, "  {}", error.message)?;
            }
        }
        if summary.failures().next().is_some() {
            self.rule("FAILURES", Color::Red)?;
            for report in summary.failures() {
                self.failure(report)?;
            }
        }
        if self.verbosity >= 0 {
            self.short_summary(summary)?;
        }
        let color = summary_color(summary);
        self.out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        writeln!(self.out, "{}", summary.summary_line())?;
        self.out.reset()
    }

    pub fn markers(&mut self, config: &TrialConfig) -> io::Result<()> {
        for (name, description) in &config.markers {
            self.out.set_color(ColorSpec::new().set_bold(true))?;
            write!(self.out, "@mark.{name}")?;
            self.out.reset()?;
            writeln!(self.out, ": {description}")?;
        }
        for name in BUILTIN_MARKS {
            self.out.set_color(ColorSpec::new().set_bold(true))?;
            write!(self.out, "@mark.{name}")?;
            self.out.reset()?;
            writeln!(self.out, ": {}", builtin_description(name))?;
        }
        Ok(())
    }

    fn failure(&mut self, report: &TestReport) -> io::Result<()> {
        let Status::Failed { failure } = &report.status else {
            return Ok(());
        };
        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        writeln!(self.out, "_____ {} _____", report.node_id)?;
        self.out.reset()?;
        if !report.params.is_empty() {
            let params: Vec<String> = report
                .params
                .iter()
                .map(|(name, value)| format!("{name} = {value:?}"))
                .collect();
            writeln!(self.out, "  params: {}", params.join(", "))?;
        }
        writeln!(self.out, "  {:?}: {}", failure.kind, failure.message)?;
        if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
            writeln!(self.out, "  Diff (-expected +actual):")?;
            let changeset = Changeset::new(expected, actual, "\n");
            self.diff(&changeset.diffs)?;
        }
        writeln!(self.out)
    }

    fn diff(&mut self, diffs: &[Difference]) -> io::Result<()> {
        for diff in diffs {
            match diff {
                Difference::Same(x) => {
                    self.out.reset()?;
                    for line in x.lines() {
                        writeln!(self.out, "   {line}")?;
                    }
                }
                Difference::Rem(x) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                    for line in x.lines() {
                        writeln!(self.out, "  -{line}")?;
                    }
                }
                Difference::Add(x) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                    for line in x.lines() {
                        writeln!(self.out, "  +{line}")?;
                    }
                }
            }
        }
        self.out.reset()
    }

    fn short_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let notable: Vec<&TestReport> = summary
            .reports
            .iter()
            .filter(|r| !matches!(r.status, Status::Passed))
            .collect();
        if notable.is_empty() {
            return Ok(());
        }
        self.rule("short test summary info", Color::Cyan)?;
        for report in notable {
            let detail = match &report.status {
                Status::Failed { failure } => failure.message.lines().next().unwrap_or("").to_string(),
                Status::XFailed { reason }
                | Status::XPassed { reason }
                | Status::Skipped { reason } => reason.clone(),
                Status::Passed => String::new(),
            };
            self.out
                .set_color(ColorSpec::new().set_fg(Some(status_color(&report.status))))?;
            write!(self.out, "{}", report.status.label())?;
            self.out.reset()?;
            if detail.is_empty() {
                writeln!(self.out, " {}", report.node_id)?;
            } else {
                writeln!(self.out, " {} - {detail}", report.node_id)?;
            }
        }
        for node_id in &summary.not_run {
            writeln!(self.out, "NOT RUN {node_id}")?;
        }
        Ok(())
    }

    fn rule(&mut self, title: &str, color: Color) -> io::Result<()> {
        let padding = RULE_WIDTH.saturating_sub(title.chars().count() + 2) / 2;
        let bar = "=".repeat(padding);
        self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        writeln!(self.out, "{bar} {title} {bar}")?;
        self.out.reset()
    }
}

fn builtin_description(name: &str) -> &'static str {
    match name {
        "skip" => "skip the test unconditionally, with an optional reason",
        "skipif" => "skip the test when the condition held at suite construction",
        "xfail" => "expect the test to fail; an unexpected pass is reported as XPASS",
        "parametrize" => "run the test once per row of a parameter table",
        _ => "",
    }
}

fn status_color(status: &Status) -> Color {
    match status {
        Status::Passed => Color::Green,
        Status::Failed { .. } => Color::Red,
        Status::XFailed { .. } | Status::XPassed { .. } | Status::Skipped { .. } => Color::Yellow,
    }
}

fn summary_color(summary: &RunSummary) -> Color {
    let counts = summary.counts;
    if counts.failed > 0 || counts.errors > 0 {
        Color::Red
    } else if counts.passed == 0
        || counts.skipped + counts.xfailed + counts.xpassed + counts.deselected > 0
    {
        Color::Yellow
    } else {
        Color::Green
    }
}

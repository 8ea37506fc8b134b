//! Run results: per-invocation reports, aggregate counts and exit status.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::args::Args;
use crate::assertions::Failure;

pub const EXIT_OK: i32 = 0;
pub const EXIT_TESTS_FAILED: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 2;
pub const EXIT_USAGE_ERROR: i32 = 4;
pub const EXIT_NO_TESTS_COLLECTED: i32 = 5;

/// Classified result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed { failure: Failure },
    XFailed { reason: String },
    XPassed { reason: String },
    Skipped { reason: String },
}

impl Status {
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Failed { .. })
    }

    /// Word used in verbose terminal output.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Passed => "PASSED",
            Status::Failed { .. } => "FAILED",
            Status::XFailed { .. } => "XFAIL",
            Status::XPassed { .. } => "XPASS",
            Status::Skipped { .. } => "SKIPPED",
        }
    }

    /// Single-character progress marker.
    pub fn short(&self) -> char {
        match self {
            Status::Passed => '.',
            Status::Failed { .. } => 'F',
            Status::XFailed { .. } => 'x',
            Status::XPassed { .. } => 'X',
            Status::Skipped { .. } => 's',
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub node_id: String,
    pub module: String,
    pub test: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_id: Option<String>,
    pub params: Args,
    #[serde(flatten)]
    pub status: Status,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectErrorReport {
    pub node_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    pub skipped: usize,
    pub deselected: usize,
    pub errors: usize,
    pub not_run: usize,
}

impl Counts {
    /// Non-zero counts in display order, e.g. `["1 failed", "7 passed"]`.
    pub fn parts(&self) -> Vec<String> {
        [
            (self.failed, "failed"),
            (self.passed, "passed"),
            (self.skipped, "skipped"),
            (self.deselected, "deselected"),
            (self.xfailed, "xfailed"),
            (self.xpassed, "xpassed"),
            (self.errors, if self.errors == 1 { "error" } else { "errors" }),
            (self.not_run, "not run"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, word)| format!("{count} {word}"))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<TestReport>,
    pub errors: Vec<CollectErrorReport>,
    pub deselected: Vec<String>,
    /// Invocations left unexecuted after `--exitfirst` stopped the run.
    pub not_run: Vec<String>,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
    pub counts: Counts,
    pub exit_code: i32,
}

impl RunSummary {
    /// Recomputes `counts` and `exit_code` from the collected data.
    pub fn finish(mut self) -> Self {
        let mut counts = Counts {
            deselected: self.deselected.len(),
            errors: self.errors.len(),
            not_run: self.not_run.len(),
            ..Counts::default()
        };
        for report in &self.reports {
            match report.status {
                Status::Passed => counts.passed += 1,
                Status::Failed { .. } => counts.failed += 1,
                Status::XFailed { .. } => counts.xfailed += 1,
                Status::XPassed { .. } => counts.xpassed += 1,
                Status::Skipped { .. } => counts.skipped += 1,
            }
        }
        self.counts = counts;
        self.exit_code = if counts.errors > 0 {
            EXIT_INTERRUPTED
        } else if counts.failed > 0 {
            EXIT_TESTS_FAILED
        } else if self.reports.is_empty() {
            EXIT_NO_TESTS_COLLECTED
        } else {
            EXIT_OK
        };
        self
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestReport> {
        self.reports.iter().filter(|r| r.status.is_failure())
    }

    /// `"1 failed, 7 passed, 2 skipped in 0.12s"`, or `"no tests ran in ..."`.
    pub fn summary_line(&self) -> String {
        let parts = self.counts.parts();
        let body = if parts.is_empty() {
            "no tests ran".to_string()
        } else {
            parts.join(", ")
        };
        format!("{body} in {:.2}s", self.duration.as_secs_f64())
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: Status) -> TestReport {
        TestReport {
            node_id: "test_mod::test_x".to_string(),
            module: "test_mod".to_string(),
            test: "test_x".to_string(),
            param_id: None,
            params: Args::new(),
            status,
            duration: Duration::ZERO,
        }
    }

    fn summary(statuses: Vec<Status>) -> RunSummary {
        RunSummary {
            reports: statuses.into_iter().map(report).collect(),
            ..RunSummary::default()
        }
        .finish()
    }

    #[test]
    fn xfail_xpass_and_skip_do_not_fail_the_run() {
        let s = summary(vec![
            Status::Passed,
            Status::XFailed { reason: String::new() },
            Status::XPassed { reason: String::new() },
            Status::Skipped { reason: "unconditional skip".into() },
        ]);
        assert_eq!(s.exit_code, EXIT_OK);
        assert_eq!(s.summary_line(), "1 passed, 1 skipped, 1 xfailed, 1 xpassed in 0.00s");
    }

    #[test]
    fn any_failure_fails_the_run() {
        let s = summary(vec![
            Status::Passed,
            Status::Failed { failure: Failure::assertion("assert 4 == 5") },
        ]);
        assert_eq!(s.exit_code, EXIT_TESTS_FAILED);
        assert_eq!(s.failures().count(), 1);
        assert_eq!(s.counts.parts(), vec!["1 failed", "1 passed"]);
    }

    #[test]
    fn collection_errors_interrupt() {
        let s = RunSummary {
            errors: vec![CollectErrorReport {
                node_id: "test_mod::test_x".into(),
                message: "fixture 'db' not found".into(),
            }],
            ..RunSummary::default()
        }
        .finish();
        assert_eq!(s.exit_code, EXIT_INTERRUPTED);
        assert_eq!(s.counts.parts(), vec!["1 error"]);
    }

    #[test]
    fn nothing_ran() {
        let s = RunSummary {
            deselected: vec!["test_mod::test_x".into()],
            ..RunSummary::default()
        }
        .finish();
        assert_eq!(s.exit_code, EXIT_NO_TESTS_COLLECTED);
        assert_eq!(s.summary_line(), "1 deselected in 0.00s");
        assert_eq!(summary(vec![]).summary_line(), "no tests ran in 0.00s");
    }

    #[test]
    fn json_flattens_status() {
        let json = serde_json::to_value(report(Status::XFailed {
            reason: "known bug".into(),
        }))
        .unwrap();
        assert_eq!(json["outcome"], "xfailed");
        assert_eq!(json["reason"], "known bug");
        assert_eq!(json["duration"], 0.0);
    }
}

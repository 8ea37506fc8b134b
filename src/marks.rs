//! Marks attached to modules, tests and individual parameter cases.
//!
//! Builtin marks change how the runner treats an invocation (`skip`,
//! `skipif`, `xfail`); custom marks are plain labels used for selection
//! with `-m`.

pub mod expr;

pub use expr::MarkExpr;

/// Mark names that are always known, even with strict marker checking.
pub const BUILTIN_MARKS: &[&str] = &["skip", "skipif", "xfail", "parametrize"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    /// Never run; report as skipped.
    Skip { reason: Option<String> },
    /// Skip when `condition` held at suite construction time.
    SkipIf { condition: bool, reason: String },
    /// Expected to fail. `strict: None` defers to configuration;
    /// `run: false` reports xfail without executing the body.
    Xfail {
        reason: Option<String>,
        strict: Option<bool>,
        run: bool,
    },
    Custom { name: String },
}

impl Mark {
    pub fn skip() -> Self {
        Mark::Skip { reason: None }
    }

    pub fn skip_because(reason: impl Into<String>) -> Self {
        Mark::Skip {
            reason: Some(reason.into()),
        }
    }

    pub fn skip_if(condition: bool, reason: impl Into<String>) -> Self {
        Mark::SkipIf {
            condition,
            reason: reason.into(),
        }
    }

    pub fn xfail() -> Self {
        Mark::Xfail {
            reason: None,
            strict: None,
            run: true,
        }
    }

    pub fn xfail_because(reason: impl Into<String>) -> Self {
        Mark::Xfail {
            reason: Some(reason.into()),
            strict: None,
            run: true,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Mark::Custom { name: name.into() }
    }

    /// Sets strictness on an `xfail` mark; other marks are returned unchanged.
    pub fn strict(self, strict: bool) -> Self {
        match self {
            Mark::Xfail { reason, run, .. } => Mark::Xfail {
                reason,
                strict: Some(strict),
                run,
            },
            other => other,
        }
    }

    /// Turns an `xfail` mark into one that never executes the body.
    pub fn without_run(self) -> Self {
        match self {
            Mark::Xfail { reason, strict, .. } => Mark::Xfail {
                reason,
                strict,
                run: false,
            },
            other => other,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Mark::Skip { .. } => "skip",
            Mark::SkipIf { .. } => "skipif",
            Mark::Xfail { .. } => "xfail",
            Mark::Custom { name } => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Mark::Custom { .. })
    }
}

/// The skip reason of the first applicable skip mark, if any.
pub fn skip_reason(marks: &[Mark]) -> Option<String> {
    marks.iter().find_map(|mark| match mark {
        Mark::Skip { reason } => Some(
            reason
                .clone()
                .unwrap_or_else(|| "unconditional skip".to_string()),
        ),
        Mark::SkipIf {
            condition: true,
            reason,
        } => Some(reason.clone()),
        _ => None,
    })
}

/// Resolved view of the first `xfail` mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XfailSpec {
    pub reason: String,
    pub strict: bool,
    pub run: bool,
}

pub fn xfail_spec(marks: &[Mark], default_strict: bool) -> Option<XfailSpec> {
    marks.iter().find_map(|mark| match mark {
        Mark::Xfail {
            reason,
            strict,
            run,
        } => Some(XfailSpec {
            reason: reason.clone().unwrap_or_default(),
            strict: strict.unwrap_or(default_strict),
            run: *run,
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_skip_wins_and_false_skipif_is_ignored() {
        let marks = vec![
            Mark::skip_if(false, "never"),
            Mark::custom("slow"),
            Mark::skip_because("broken upstream"),
            Mark::skip(),
        ];
        assert_eq!(skip_reason(&marks).as_deref(), Some("broken upstream"));
        assert_eq!(skip_reason(&[Mark::skip_if(false, "no")]), None);
        assert_eq!(
            skip_reason(&[Mark::skip()]).as_deref(),
            Some("unconditional skip")
        );
    }

    #[test]
    fn xfail_strictness_defaults_from_config() {
        let lenient = xfail_spec(&[Mark::xfail()], false).unwrap();
        assert!(!lenient.strict);
        let inherited = xfail_spec(&[Mark::xfail()], true).unwrap();
        assert!(inherited.strict);
        let explicit = xfail_spec(&[Mark::xfail().strict(false)], true).unwrap();
        assert!(!explicit.strict);
    }

    #[test]
    fn without_run_only_touches_xfail() {
        assert_eq!(Mark::skip().without_run(), Mark::skip());
        let spec = xfail_spec(&[Mark::xfail_because("flaky").without_run()], false).unwrap();
        assert!(!spec.run);
        assert_eq!(spec.reason, "flaky");
    }

    #[test]
    fn names() {
        assert_eq!(Mark::custom("slow").name(), "slow");
        assert_eq!(Mark::xfail().name(), "xfail");
        assert!(Mark::skip_if(true, "x").is_builtin());
        assert!(!Mark::custom("db").is_builtin());
    }
}

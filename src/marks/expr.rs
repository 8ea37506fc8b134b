//! Boolean selection expressions.
//!
//! `-m "not slow"` matches against mark names exactly; `-k "sort or type"`
//! matches identifiers as case-insensitive substrings of an invocation's
//! keywords. Both share one grammar (`expr.pest`).

use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::errors::{Result, TrialError};

#[derive(Parser)]
#[grammar = "marks/expr.pest"]
struct ExprParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkExpr {
    Ident(String),
    Not(Box<MarkExpr>),
    And(Box<MarkExpr>, Box<MarkExpr>),
    Or(Box<MarkExpr>, Box<MarkExpr>),
}

impl MarkExpr {
    /// Parses `input`; `flag` names the CLI option in diagnostics.
    pub fn parse(flag: char, input: &str) -> Result<Self> {
        let mut pairs = ExprParser::parse(Rule::expression, input).map_err(|e| {
            let (offset, len) = match e.location {
                InputLocation::Pos(pos) => (pos, 0),
                InputLocation::Span((start, end)) => (start, end - start),
            };
            TrialError::expression(flag, input, offset, len, e.variant.message())
        })?;

        pairs
            .next()
            .and_then(|expression| {
                expression
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::or_expr)
            })
            .and_then(build)
            .ok_or_else(|| TrialError::expression(flag, input, 0, input.len(), "empty expression"))
    }

    /// Evaluates the expression, asking `matches` about each identifier.
    pub fn eval(&self, matches: &dyn Fn(&str) -> bool) -> bool {
        match self {
            MarkExpr::Ident(name) => matches(name),
            MarkExpr::Not(inner) => !inner.eval(matches),
            MarkExpr::And(lhs, rhs) => lhs.eval(matches) && rhs.eval(matches),
            MarkExpr::Or(lhs, rhs) => lhs.eval(matches) || rhs.eval(matches),
        }
    }

    /// `-m` semantics: an identifier holds if a mark with that name is present.
    pub fn matches_marks<S: AsRef<str>>(&self, marks: &[S]) -> bool {
        self.eval(&|ident| marks.iter().any(|m| m.as_ref() == ident))
    }

    /// `-k` semantics: an identifier holds if it is a case-insensitive
    /// substring of any keyword.
    pub fn matches_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        let lowered: Vec<String> = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
        self.eval(&|ident| {
            let needle = ident.to_lowercase();
            lowered.iter().any(|k| k.contains(&needle))
        })
    }
}

fn build(pair: Pair<'_, Rule>) -> Option<MarkExpr> {
    match pair.as_rule() {
        Rule::or_expr | Rule::and_expr => {
            let is_or = pair.as_rule() == Rule::or_expr;
            let mut operands = pair
                .into_inner()
                .filter(|p| !matches!(p.as_rule(), Rule::or_op | Rule::and_op))
                .map(build);
            let first = operands.next()??;
            operands.try_fold(first, |acc, next| {
                let next = Box::new(next?);
                Some(if is_or {
                    MarkExpr::Or(Box::new(acc), next)
                } else {
                    MarkExpr::And(Box::new(acc), next)
                })
            })
        }
        Rule::not_expr => {
            let mut inner = pair.into_inner();
            let first = inner.next()?;
            if first.as_rule() == Rule::not_op {
                Some(MarkExpr::Not(Box::new(build(inner.next()?)?)))
            } else {
                build(first)
            }
        }
        Rule::primary => build(pair.into_inner().next()?),
        Rule::ident => Some(MarkExpr::Ident(pair.as_str().to_string())),
        _ => None,
    }
}

//! Payload filtering for `-e key=value` expressions
//!
//! Supports:
//! - Exact, case-insensitive values: -e name=MyGenerator
//! - Regex values between slashes: -e name=/^Microsoft\./
//! - Several expressions, all of which must match: -e name=App -e name=/core/
//!
//! Only keyed events are filtered. Function definition blobs always pass.

use anyhow::{bail, Context, Result};
use regex::{Regex, RegexBuilder};

use crate::trace_event::TraceEvent;

/// Payload fields an expression may name
const FIELDS: &[&str] = &["name", "id"];

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Exact(expected) => expected.to_lowercase() == value.to_lowercase(),
            Matcher::Pattern(regex) => regex.is_match(value),
        }
    }
}

#[derive(Debug, Clone)]
struct PayloadRule {
    field: String,
    matcher: Matcher,
}

/// Filter that decides which trace events reach the aggregator
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    rules: Vec<PayloadRule>,
}

impl EventFilter {
    /// Create a filter that lets every event through
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse every expression; fails on the first malformed one
    pub fn from_exprs<S: AsRef<str>>(exprs: &[S]) -> Result<Self> {
        let rules = exprs
            .iter()
            .map(|expr| Self::parse_rule(expr.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Parse a single `key=value` expression
    pub fn from_expr(expr: &str) -> Result<Self> {
        Self::from_exprs(&[expr])
    }

    fn parse_rule(expr: &str) -> Result<PayloadRule> {
        let Some((field, value)) = expr.split_once('=') else {
            bail!(
                "Invalid filter expression: '{}'. Expected 'key=value' (e.g., name=MyGenerator)",
                expr
            );
        };

        let field = field.trim();
        if field.is_empty() {
            bail!(
                "Invalid filter expression: '{}'. Expected 'key=value' (e.g., name=MyGenerator)",
                expr
            );
        }
        if !FIELDS.contains(&field) {
            bail!(
                "Unknown filter field '{}'. Expected one of: {}",
                field,
                FIELDS.join(", ")
            );
        }

        let matcher = match value
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(pattern) => Matcher::Pattern(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("Invalid regex in filter expression '{}'", expr))?,
            ),
            None => Matcher::Exact(value.to_string()),
        };

        Ok(PayloadRule {
            field: field.to_string(),
            matcher,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check if an event should be recorded
    ///
    /// An event lacking a filtered field does not match.
    pub fn matches(&self, event: &TraceEvent) -> bool {
        if !event.is_keyed() {
            return true;
        }

        self.rules.iter().all(|rule| {
            event
                .payload(&rule.field)
                .is_some_and(|value| rule.matcher.matches(&value))
        })
    }
}

//! # Failures and Failure Reports
//!
//! A [`Failure`] records one rejected element: where it sat in its
//! subject, what was expected, why it was rejected and, for nested
//! validation, the failures of the nested validator. Failures form a tree.
//!
//! [`build_failure_report`] flattens that tree into [`FailureReport`]
//! leaves, each carrying the full path from the validated subject down to
//! the rejected value.

use std::fmt;

use serde::Serialize;
use strel_core::Value;

use crate::expectation::Expectation;

/// Position of a failed element within its subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureKey {
    /// The subject as a whole (primitive item validation, shape checks).
    Subject,
    /// A record field or collection entry.
    Field(String),
    /// An array element.
    Index(usize),
    /// An element of one half (`array` or `collection`) of a mirror.
    Half {
        half: &'static str,
        key: Box<FailureKey>,
    },
}

impl FailureKey {
    /// Append this key to `base`.
    ///
    /// Fields append `.key` (or just `key` at the root), indices append
    /// `[i]`, and the subject key appends nothing. Mirror halves append
    /// their half name, then the element key.
    pub fn append_to(&self, base: &str) -> String {
        match self {
            FailureKey::Subject => base.to_string(),
            FailureKey::Field(key) if base.is_empty() => key.clone(),
            FailureKey::Field(key) => format!("{base}.{key}"),
            FailureKey::Index(index) => format!("{base}[{index}]"),
            FailureKey::Half { half, key } => {
                key.append_to(&FailureKey::Field((*half).to_string()).append_to(base))
            }
        }
    }

    /// The key within the element's own container, without any mirror
    /// half tag.
    pub fn element_key(&self) -> &FailureKey {
        match self {
            FailureKey::Half { key, .. } => key.element_key(),
            other => other,
        }
    }
}

impl fmt::Display for FailureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKey::Subject => f.write_str("(subject)"),
            FailureKey::Field(key) => f.write_str(key),
            FailureKey::Index(index) => write!(f, "{index}"),
            FailureKey::Half { half, key } => write!(f, "{half}.{key}"),
        }
    }
}

/// Why an element was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reason {
    /// A direct rejection.
    Text(String),
    /// A nested validator rejected the element; its flattened report,
    /// with paths relative to the element.
    Report(Vec<FailureReport>),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Text(text) => f.write_str(text),
            Reason::Report(reports) => {
                for (i, report) in reports.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{report}")?;
                }
                Ok(())
            }
        }
    }
}

/// One rejected element.
#[derive(Debug, Clone)]
pub struct Failure {
    /// The rejected value.
    pub element: Value,
    /// The expectation the element was checked against, as declared for
    /// its position (alternations included).
    pub expectation: Expectation,
    /// Failures of the nested validator, when the element was checked by
    /// one.
    pub failures: Option<Vec<Failure>>,
    /// Position within the subject.
    pub key: FailureKey,
    /// Full name of the element, e.g. `people[2].inventory`.
    pub name: String,
    pub reason: Reason,
    /// The subject the element belongs to.
    pub subject: Value,
}

impl Failure {
    /// Direct rejection of an element.
    pub fn new(
        element: Value,
        expectation: &Expectation,
        key: FailureKey,
        name: impl Into<String>,
        reason: impl Into<String>,
        subject: &Value,
    ) -> Self {
        Self {
            element,
            expectation: expectation.clone(),
            failures: None,
            key,
            name: name.into(),
            reason: Reason::Text(reason.into()),
            subject: subject.clone(),
        }
    }

    /// Rejection because a nested validator failed.
    pub fn nested(
        element: Value,
        expectation: &Expectation,
        key: FailureKey,
        name: impl Into<String>,
        failures: Vec<Failure>,
        subject: &Value,
    ) -> Self {
        let reason = Reason::Report(build_failure_report(&failures, ""));
        Self {
            element,
            expectation: expectation.clone(),
            failures: Some(failures),
            key,
            name: name.into(),
            reason,
            subject: subject.clone(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// A flattened leaf of a failure tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    /// Path from the report root to the rejected value, e.g.
    /// `inventory[0].parts.a.weight`.
    pub path: String,
    pub reason: String,
    /// The rejected value.
    pub value: Value,
    /// The expectation at that position, rendered for display.
    pub expected: String,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// Flatten a failure tree.
///
/// Failures with nested failures contribute their leaves, with this
/// failure's key appended to `path`; failures without contribute one
/// report each.
pub fn build_failure_report(failures: &[Failure], path: &str) -> Vec<FailureReport> {
    let mut reports = Vec::new();
    collect_reports(failures, path, &mut reports);
    reports
}

fn collect_reports(failures: &[Failure], path: &str, out: &mut Vec<FailureReport>) {
    for failure in failures {
        let here = failure.key.append_to(path);
        match &failure.failures {
            Some(nested) if !nested.is_empty() => collect_reports(nested, &here, out),
            _ => out.push(FailureReport {
                path: here,
                reason: failure.reason.to_string(),
                value: failure.element.clone(),
                expected: failure.expectation.to_string(),
            }),
        }
    }
}

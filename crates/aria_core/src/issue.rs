//! Collected (non-fatal) issues.
//!
//! Validation and normalization never stop on the first problem. Every
//! problem found during one pass is appended to a single [`IssueList`] owned
//! by that pass, in the order it was found.

use crate::locator::Locator;
use crate::path::TreePath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the pass unusable for plan emission
    Error,
    /// Suspicious but tolerated
    Warning,
    /// Informational
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Where an issue was found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Source document
    pub locator: Option<Locator>,
    /// Path inside the document tree
    pub path: TreePath,
}

impl Location {
    /// Create a location
    #[must_use]
    pub fn new(locator: Option<Locator>, path: TreePath) -> Self {
        Self { locator, path }
    }

    /// Location with a path only
    #[must_use]
    pub fn at(path: TreePath) -> Self {
        Self {
            locator: None,
            path,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            Some(locator) => write!(f, "{} @ {}", locator, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

/// A single collected problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Severity
    pub severity: Severity,
    /// Human readable message
    pub message: String,
    /// Source location
    pub location: Location,
}

impl Issue {
    /// Create an error-severity issue
    #[must_use]
    pub fn error(message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location,
        }
    }

    /// Create a warning-severity issue
    #[must_use]
    pub fn warning(message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.severity, self.message, self.location)
    }
}

/// Order-preserving collection of issues for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueList {
    issues: Vec<Issue>,
}

impl IssueList {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Append an issue
    pub fn push(&mut self, issue: Issue) {
        tracing::debug!(severity = %issue.severity, location = %issue.location, "{}", issue.message);
        self.issues.push(issue);
    }

    /// Append an error-severity issue
    pub fn report(&mut self, message: impl Into<String>, location: Location) {
        self.push(Issue::error(message, location));
    }

    /// Append a warning-severity issue
    pub fn warn(&mut self, message: impl Into<String>, location: Location) {
        self.push(Issue::warning(message, location));
    }

    /// Total number of issues of any severity
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Check if no issue of any severity was collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Check if any error-severity issue was collected
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Iterate over error-severity issues
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Iterate over all issues in order
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    /// Consume into the underlying vector
    #[must_use]
    pub fn into_vec(self) -> Vec<Issue> {
        self.issues
    }
}

impl<'a> IntoIterator for &'a IssueList {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

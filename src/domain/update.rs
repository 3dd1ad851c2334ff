//! Audit verdicts for individual dependencies

use super::{ConstraintSet, Version};
use serde::Serialize;
use std::fmt;

/// Kind of audited dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Provider plugin pinned in the lock file
    Provider,
    /// Module called from configuration
    Module,
}

impl DependencyKind {
    /// Returns the lowercase name used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Provider => "provider",
            DependencyKind::Module => "module",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health verdict of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Passed,
    Warning,
    Failed,
}

impl Status {
    /// Returns the label printed in reports
    pub fn label(&self) -> &'static str {
        match self {
            Status::Passed => "PASSED",
            Status::Warning => "WARNING",
            Status::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Version facts and the resulting verdict for one dependency
///
/// Built by the caller with the version facts filled in, then classified
/// once by [`crate::update::classify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    /// Directory or file the dependency was declared in
    pub path: String,
    pub name: String,
    /// Full source address
    pub source: String,
    pub version_constraints: Option<ConstraintSet>,
    /// Currently configured version
    pub version: Option<Version>,
    /// Newest published version satisfying the constraints
    pub latest_matching: Option<Version>,
    /// Newest published version regardless of constraints
    pub latest_overall: Option<Version>,
    pub status: Status,
    pub message: String,
    pub resolution: String,
}

impl Update {
    /// Creates an unclassified update for a dependency
    pub fn new(
        kind: DependencyKind,
        path: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            name: name.into(),
            source: source.into(),
            version_constraints: None,
            version: None,
            latest_matching: None,
            latest_overall: None,
            status: Status::Passed,
            message: String::new(),
            resolution: String::new(),
        }
    }

    /// Sets the declared constraints
    pub fn with_constraints(mut self, constraints: Option<ConstraintSet>) -> Self {
        self.version_constraints = constraints;
        self
    }

    /// Sets the configured version
    pub fn with_version(mut self, version: Option<Version>) -> Self {
        self.version = version;
        self
    }

    /// Sets the externally resolved latest versions
    pub fn with_latest(
        mut self,
        latest_matching: Option<Version>,
        latest_overall: Option<Version>,
    ) -> Self {
        self.latest_matching = latest_matching;
        self.latest_overall = latest_overall;
        self
    }

    /// Key used for deterministic report ordering
    pub fn sort_key(&self) -> String {
        format!("{}{}", self.path, self.name)
    }
}

/// Sort updates by path then name
pub fn sort_updates(updates: &mut [Update]) {
    updates.sort_by_cached_key(Update::sort_key);
}

//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of classified updates
//! - Status counts and failed registry lookups alongside them

use crate::domain::{Status, Update};
use crate::orchestrator::AuditReport;
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level; quiet drops passed updates
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// Lock file that was audited
    lock_file: String,
    /// Status counts
    summary: JsonSummary,
    /// Classified updates
    updates: Vec<&'a Update>,
    /// Errors encountered
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

/// JSON representation of status counts
#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    passed: usize,
    warning: usize,
    failed: usize,
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &AuditReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonOutput {
            lock_file: report.lock_file.display().to_string(),
            summary: JsonSummary {
                total: report.updates.len(),
                passed: report.count(Status::Passed),
                warning: report.count(Status::Warning),
                failed: report.count(Status::Failed),
            },
            updates: report
                .updates
                .iter()
                .filter(|u| self.verbosity.shows(u.status))
                .collect(),
            errors: report.errors.iter().map(ToString::to_string).collect(),
        };
        write_json(&output, writer)
    }

    fn format_update(&self, update: &Update, writer: &mut dyn Write) -> std::io::Result<()> {
        write_json(update, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_constraints, DependencyKind, Version};
    use crate::orchestrator::OrchestratorError;
    use crate::update::classify;
    use std::path::PathBuf;

    fn sample_report() -> AuditReport {
        let mut aws = Update::new(
            DependencyKind::Provider,
            ".",
            "hashicorp/aws",
            "registry.terraform.io/hashicorp/aws",
        )
        .with_constraints(Some(parse_constraints("~> 4.0").unwrap()))
        .with_version(Some(Version::new(4, 67, 0)))
        .with_latest(Some(Version::new(4, 67, 0)), Some(Version::new(5, 0, 0)));
        classify(&mut aws);

        let mut null = Update::new(
            DependencyKind::Provider,
            ".",
            "hashicorp/null",
            "registry.terraform.io/hashicorp/null",
        )
        .with_constraints(Some(parse_constraints(">= 3.0").unwrap()))
        .with_version(Some(Version::new(3, 2, 1)));
        classify(&mut null);

        AuditReport {
            lock_file: PathBuf::from(".terraform.lock.hcl"),
            updates: vec![aws, null],
            errors: vec![OrchestratorError::RegistryError {
                provider: "hashicorp/gone".to_string(),
                message: "not found".to_string(),
            }],
        }
    }

    fn render(verbosity: Verbosity) -> serde_json::Value {
        let mut out = Vec::new();
        JsonFormatter::new(verbosity)
            .format(&sample_report(), &mut out)
            .unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_json_structure() {
        let json = render(Verbosity::Normal);
        assert_eq!(json["lock_file"], ".terraform.lock.hcl");
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["summary"]["passed"], 1);

        let aws = &json["updates"][0];
        assert_eq!(aws["type"], "provider");
        assert_eq!(aws["name"], "hashicorp/aws");
        assert_eq!(aws["version_constraints"], "~> 4.0");
        assert_eq!(aws["version"], "4.67.0");
        assert_eq!(aws["latest_overall"], "5.0.0");
        assert_eq!(aws["status"], "FAILED");
        assert_eq!(aws["message"], "Outdated major version");

        assert_eq!(json["errors"][0], "Failed to fetch hashicorp/gone: not found");
    }

    #[test]
    fn test_json_unknown_facts_are_null() {
        let json = render(Verbosity::Normal);
        assert!(json["updates"][1]["latest_matching"].is_null());
    }

    #[test]
    fn test_json_quiet_drops_passed() {
        let json = render(Verbosity::Quiet);
        assert_eq!(json["updates"].as_array().unwrap().len(), 1);
        assert_eq!(json["summary"]["total"], 2);
    }

    #[test]
    fn test_format_single_update() {
        let report = sample_report();
        let mut out = Vec::new();
        JsonFormatter::new(Verbosity::Normal)
            .format_update(&report.updates[1], &mut out)
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["status"], "PASSED");
    }
}

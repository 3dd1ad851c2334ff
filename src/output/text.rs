//! Text output formatter for human-readable display
//!
//! Each update is rendered as a card: a headline with the verdict, the
//! suggested resolution, then the version facts that led to it. A one-line
//! summary closes the report.

use crate::domain::{Status, Update, Version};
use crate::orchestrator::AuditReport;
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Width of the horizontal rules around each card
const RULE_WIDTH: usize = 80;

/// Width of the detail labels column, including padding
const DETAILS_PAD: usize = 21;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_color(verbosity, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn rule(&self, width: usize) -> String {
        let line = "─".repeat(width);
        if self.color {
            line.bright_black().to_string()
        } else {
            line
        }
    }

    fn label(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn status_label(&self, status: Status) -> String {
        if !self.color {
            return status.label().to_string();
        }
        match status {
            Status::Passed => status.label().green().bold().to_string(),
            Status::Warning => status.label().yellow().bold().to_string(),
            Status::Failed => status.label().red().bold().to_string(),
        }
    }

    fn headline(&self, update: &Update) -> String {
        let subject = format!("{} '{}'", update.kind, update.name);
        if self.color {
            format!(
                "{} {} {}",
                subject.italic(),
                self.status_label(update.status),
                update.message.bold()
            )
        } else {
            format!("{} {} {}", subject, update.status.label(), update.message)
        }
    }

    fn detail(
        &self,
        name: &str,
        value: impl std::fmt::Display,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let padded = format!("{:width$}", format!("{}:", name), width = DETAILS_PAD);
        writeln!(writer, "  {}{}", self.label(&padded), value)
    }

    fn format_summary(&self, report: &AuditReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let total = report.updates.len();
        let noun = if total == 1 { "provider" } else { "providers" };
        let passed = report.count(Status::Passed);
        let warning = report.count(Status::Warning);
        let failed = report.count(Status::Failed);

        if self.color {
            writeln!(
                writer,
                "{} {} audited: {} passed, {} {}, {} failed",
                total.to_string().bold(),
                noun,
                passed.to_string().green(),
                warning.to_string().yellow(),
                if warning == 1 { "warning" } else { "warnings" },
                failed.to_string().red()
            )
        } else {
            writeln!(
                writer,
                "{} {} audited: {} passed, {} {}, {} failed",
                total,
                noun,
                passed,
                warning,
                if warning == 1 { "warning" } else { "warnings" },
                failed
            )
        }
    }
}

fn version_or_blank(version: &Option<Version>) -> String {
    version.as_ref().map(Version::to_string).unwrap_or_default()
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &AuditReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Verbose {
            writeln!(
                writer,
                "{} {}",
                self.label("Lock file:"),
                report.lock_file.display()
            )?;
        }

        if report.updates.is_empty() {
            writeln!(writer, "No providers to audit")?;
            return Ok(());
        }

        for update in &report.updates {
            if self.verbosity.shows(update.status) {
                self.format_update(update, writer)?;
            }
        }

        writeln!(writer)?;
        self.format_summary(report, writer)
    }

    fn format_update(&self, update: &Update, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer)?;
        writeln!(writer, "{}", self.headline(update))?;
        writeln!(writer, "{}", self.rule(RULE_WIDTH))?;
        writeln!(writer)?;

        writeln!(writer, "  {}", self.label("Resolution"))?;
        writeln!(writer, "  {}", self.rule(update.resolution.chars().count()))?;
        writeln!(writer, "  {}", update.resolution)?;
        writeln!(writer)?;

        let constraints = update
            .version_constraints
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        writeln!(writer, "  {}", self.label("Details"))?;
        writeln!(
            writer,
            "  {}",
            self.rule(update.source.chars().count() + DETAILS_PAD)
        )?;
        self.detail("Type", update.kind, writer)?;
        self.detail("Path", &update.path, writer)?;
        self.detail("Name", &update.name, writer)?;
        self.detail("Source", &update.source, writer)?;
        self.detail("Version Constraints", constraints, writer)?;
        self.detail("Version", version_or_blank(&update.version), writer)?;
        self.detail("Latest Match", version_or_blank(&update.latest_matching), writer)?;
        self.detail("Latest Overall", version_or_blank(&update.latest_overall), writer)?;
        writeln!(writer)?;
        writeln!(writer, "{}", self.rule(RULE_WIDTH))
    }
}

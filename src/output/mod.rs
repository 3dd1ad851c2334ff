//! Report rendering
//!
//! An [`AuditReport`] is written either as report cards for a terminal or
//! as one JSON document for tooling. Both honor the same verbosity rules.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::domain::{Status, Update};
use crate::orchestrator::AuditReport;
use std::io::Write;

/// Report encoding selected with `--json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// How much of the report is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Passed providers are left out; totals still count them
    Quiet,
    #[default]
    Normal,
    /// Also names the lock file and lists registry errors
    Verbose,
}

impl Verbosity {
    /// Returns true if an update with this status should be reported
    pub fn shows(&self, status: Status) -> bool {
        *self != Verbosity::Quiet || status != Status::Passed
    }
}

/// Rendering settings resolved from CLI flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// ANSI styling for text reports; `colored` still honors `NO_COLOR`
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(OutputFormat::default(), Verbosity::default())
    }
}

impl OutputConfig {
    pub fn new(format: OutputFormat, verbosity: Verbosity) -> Self {
        Self {
            format,
            verbosity,
            color: true,
        }
    }

    /// Plain text reports, as requested with `--no-color`
    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    /// Progress is drawn only next to a text report that is not quiet
    pub fn shows_progress(&self) -> bool {
        self.format == OutputFormat::Text && self.verbosity != Verbosity::Quiet
    }
}

/// Writes audit results in one encoding
pub trait OutputFormatter {
    /// Write the whole report, summary included
    fn format(&self, report: &AuditReport, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Write the entry for a single provider
    fn format_update(&self, update: &Update, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Pick the formatter for the resolved settings
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}

//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ParserError: lock file, provider address, constraint and version parsing
//! - ProviderPartError: a single provider address segment failed validation
//! - RegistryError: Issues with provider registry communication
//! - ConfigError: Issues with CLI or config file settings
//! - IoError: File system operation failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Lock file or address parsing errors
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// Provider registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Category of a parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Provider source string could not be segmented or validated
    ProviderSource,
    /// Version constraint expression is malformed
    Constraint,
    /// Version string is malformed
    Version,
    /// Lock file document is structurally invalid
    Document,
    /// The same provider address appears twice in one document
    DuplicateProvider,
}

/// Structured parse failure with a display-ready summary and detail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{summary}: {detail}")]
pub struct ParserError {
    /// What kind of input was rejected
    pub kind: ParseErrorKind,
    /// Short headline
    pub summary: String,
    /// Longer explanation naming the offending input
    pub detail: String,
}

impl ParserError {
    /// Creates a new ParserError
    pub fn new(kind: ParseErrorKind, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Creates a provider source error
    pub fn provider_source(source_str: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            ParseErrorKind::ProviderSource,
            "Invalid provider source address",
            format!("The address {:?} is not valid: {}.", source_str, reason),
        )
    }

    /// Creates a constraint error
    pub fn constraint(expr: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            ParseErrorKind::Constraint,
            "Invalid version constraints",
            format!("The constraint string {:?} is not valid: {}.", expr, reason),
        )
    }

    /// Creates a version error
    pub fn version(version: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            ParseErrorKind::Version,
            "Invalid provider version number",
            format!("The version {:?} is not valid: {}.", version, reason),
        )
    }

    /// Creates a document structure error
    pub fn document(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::Document, summary, detail)
    }

    /// Creates a duplicate provider error
    pub fn duplicate_provider(addr: impl std::fmt::Display) -> Self {
        Self::new(
            ParseErrorKind::DuplicateProvider,
            "Duplicate provider lock",
            format!(
                "This lock file already declared a lock for provider {}.",
                addr
            ),
        )
    }

    /// Prefixes the detail with the block this error came from
    pub fn in_block(mut self, label: &str) -> Self {
        self.detail = format!("In provider block {:?}: {}", label, self.detail);
        self
    }
}

/// Errors for a single namespace or type segment of a provider address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderPartError {
    /// Segment is empty
    #[error("error parsing provider parts: must have at least one character")]
    Empty,

    /// Segment starts or ends with a dash
    #[error("error parsing provider parts: may not use leading or trailing dashes")]
    EdgeDash,

    /// Segment has two dashes in a row
    #[error("error parsing provider parts: cannot use multiple consecutive dashes")]
    ConsecutiveDashes,

    /// Segment contains something other than letters, digits and dashes
    #[error("error parsing provider parts: invalid character {0:?}, must contain only letters, digits, and dashes")]
    InvalidCharacter(char),
}

/// Errors related to provider registry communication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Provider not found in registry
    #[error("provider '{provider}' not found in {registry} registry")]
    ProviderNotFound { provider: String, registry: String },

    /// Network request failed
    #[error("failed to fetch provider '{provider}' from {registry}: {message}")]
    NetworkError {
        provider: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{provider}': {message}")]
    InvalidResponse {
        provider: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{provider}' from {registry}")]
    Timeout { provider: String, registry: String },

    /// Host does not offer the provider registry protocol
    #[error("host {registry} does not support the provider registry protocol")]
    UnsupportedHost { registry: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has unknown keys
    #[error("invalid config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// No lock file at the given location
    #[error("lock file not found: {path}")]
    LockFileNotFound { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Creates a new ProviderNotFound error
    pub fn provider_not_found(provider: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::ProviderNotFound {
            provider: provider.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        provider: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            provider: provider.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(provider: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            provider: provider.into(),
            registry: registry.into(),
        }
    }
}

impl IoError {
    /// Creates a new LockFileNotFound error
    pub fn lock_file_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::LockFileNotFound { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }
}

//! Configuration file loading and settings resolution
//!
//! Settings come from two layers: an optional `.tfvc.toml` file and the
//! command line. Command-line values take precedence.

use crate::cli::CliArgs;
use crate::error::ConfigError;
use crate::lockfile::LOCK_FILE_NAME;
use crate::output::{OutputConfig, OutputFormat, Verbosity};
use crate::registry::DEFAULT_TIMEOUT;
use crate::update::UpdateFilter;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up next to the lock file
pub const CONFIG_FILE_NAME: &str = ".tfvc.toml";

/// Default concurrency limit for registry requests
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Upper bound for concurrent registry requests
pub const MAX_CONCURRENCY: usize = 1024;

/// Contents of a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Providers to leave out of the audit
    #[serde(default)]
    pub exclude: Vec<String>,
    /// If non-empty, only audit these providers
    #[serde(default)]
    pub only: Vec<String>,
    /// Treat warnings as failures for the exit status
    #[serde(default)]
    pub fail_on_warning: Option<bool>,
    /// Registry access settings
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// `[registry]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Maximum concurrent registry requests
    pub concurrency: Option<usize>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.registry.timeout_secs == Some(0) || config.registry.concurrency == Some(0) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "registry timeout_secs and concurrency must be at least 1".to_string(),
            });
        }
        if config
            .registry
            .concurrency
            .is_some_and(|n| n > MAX_CONCURRENCY)
        {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: format!("registry concurrency must be at most {}", MAX_CONCURRENCY),
            });
        }
        Ok(config)
    }
}

/// Effective settings for one audit run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Lock file to audit
    pub lock_file: PathBuf,
    /// Provider filter
    pub filter: UpdateFilter,
    /// Treat warnings as failures for the exit status
    pub fail_on_warning: bool,
    /// Maximum concurrent registry requests
    pub concurrency: usize,
    /// Registry request timeout
    pub timeout: Duration,
    /// Report rendering options
    pub output: OutputConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lock_file: PathBuf::from(LOCK_FILE_NAME),
            filter: UpdateFilter::new(),
            fail_on_warning: false,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            output: OutputConfig::default(),
        }
    }
}

impl Settings {
    /// Resolve settings from CLI arguments and the config file they point at
    pub fn resolve(args: &CliArgs) -> Result<Self, ConfigError> {
        if args.quiet && args.verbose {
            return Err(ConfigError::ConflictingOptions {
                message: "--quiet and --verbose cannot be used together".to_string(),
            });
        }

        let lock_file = locate_lock_file(&args.path);
        let file_config = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => {
                let default_path = lock_file
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    FileConfig::load(&default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Ok(Self::merge(args, lock_file, file_config))
    }

    /// Combine CLI arguments with a loaded config file
    pub fn merge(args: &CliArgs, lock_file: PathBuf, file: FileConfig) -> Self {
        let exclude = if args.exclude.is_empty() {
            file.exclude
        } else {
            args.exclude.clone()
        };
        let only = if args.only.is_empty() {
            file.only
        } else {
            args.only.clone()
        };

        let format = if args.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        let verbosity = if args.quiet {
            Verbosity::Quiet
        } else if args.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            lock_file,
            filter: UpdateFilter::new().with_exclude(exclude).with_only(only),
            fail_on_warning: args.fail_on_warning || file.fail_on_warning.unwrap_or(false),
            concurrency: args
                .concurrency
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
                .or(file.registry.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
            timeout: args
                .timeout
                .or(file.registry.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            output: if args.no_color {
                OutputConfig::new(format, verbosity).without_color()
            } else {
                OutputConfig::new(format, verbosity)
            },
        }
    }
}

/// Resolve the CLI path to a lock file: directories get the default name
pub fn locate_lock_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(LOCK_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

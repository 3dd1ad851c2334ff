//! Provider source addresses
//!
//! A provider is identified by `hostname/namespace/type`. Source strings may
//! omit the hostname (the public registry is implied) or both hostname and
//! namespace (the namespace becomes unknown).
//!
//! The two namespace sentinels are modelled as enum variants rather than as
//! magic strings, so a literal `-` or `?` can only ever reach them through the
//! parse rules below and never through a [`Namespace::Named`] value.

use crate::error::{ParserError, ProviderPartError};
use serde::{Serialize, Serializer};
use std::fmt;

/// Hostname of the public provider registry
pub const DEFAULT_PROVIDER_REGISTRY_HOST: &str = "registry.terraform.io";

/// Display form of [`Namespace::Legacy`]
pub const LEGACY_PROVIDER_NAMESPACE: &str = "-";

/// Display form of [`Namespace::Unknown`]
pub const UNKNOWN_PROVIDER_NAMESPACE: &str = "?";

/// Prefix used by plugin executables, never part of a provider type
const PLUGIN_EXECUTABLE_PREFIX: &str = "terraform-provider-";

/// Namespace segment of a provider address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// A real registry namespace, already normalized
    Named(String),
    /// Legacy address from before namespaces existed (`-`)
    Legacy,
    /// Present in the lock file but the namespace could not be determined (`?`)
    Unknown,
}

impl Namespace {
    /// Returns the namespace as it appears in a source string
    pub fn as_str(&self) -> &str {
        match self {
            Namespace::Named(name) => name,
            Namespace::Legacy => LEGACY_PROVIDER_NAMESPACE,
            Namespace::Unknown => UNKNOWN_PROVIDER_NAMESPACE,
        }
    }

    /// Returns true for the legacy and unknown sentinels
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Namespace::Named(_))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-qualified provider address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderAddress {
    /// Registry hostname, normalized for comparison
    pub hostname: String,
    /// Namespace within the registry
    pub namespace: Namespace,
    /// Provider type, e.g. `aws`
    pub provider_type: String,
}

impl ProviderAddress {
    /// Creates an address on the default registry with a named namespace
    pub fn new(namespace: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            hostname: DEFAULT_PROVIDER_REGISTRY_HOST.to_string(),
            namespace: Namespace::Named(namespace.into()),
            provider_type: provider_type.into(),
        }
    }

    /// Returns the same address on another registry host
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Returns true if the address lives on the public registry
    pub fn is_default_registry(&self) -> bool {
        self.hostname == DEFAULT_PROVIDER_REGISTRY_HOST
    }

    /// Short form used in reports: hostname is omitted on the public registry
    pub fn for_display(&self) -> String {
        if self.is_default_registry() {
            format!("{}/{}", self.namespace, self.provider_type)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for ProviderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.hostname, self.namespace, self.provider_type
        )
    }
}

impl Serialize for ProviderAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a provider source string such as `hashicorp/aws`
pub fn parse_provider_source(source: &str) -> Result<ProviderAddress, ParserError> {
    if source.trim() != source {
        return Err(ParserError::provider_source(
            source,
            "must not have leading or trailing whitespace",
        ));
    }
    if source.is_empty() {
        return Err(ParserError::provider_source(
            source,
            "a provider source address is required",
        ));
    }

    let parts: Vec<&str> = source.split('/').collect();
    if parts.len() > 3 {
        return Err(ParserError::provider_source(
            source,
            "a provider source must have at most three parts separated by slashes",
        ));
    }

    let type_part = parts[parts.len() - 1];
    let provider_type = parse_provider_part(type_part)
        .map_err(|e| ParserError::provider_source(source, format!("invalid type: {}", e)))?;
    if let Some(suggestion) = provider_type.strip_prefix(PLUGIN_EXECUTABLE_PREFIX) {
        return Err(ParserError::provider_source(
            source,
            format!(
                "the provider type must not include the {:?} prefix, did you mean {:?}",
                PLUGIN_EXECUTABLE_PREFIX, suggestion
            ),
        ));
    }

    let hostname = if parts.len() == 3 {
        parse_hostname(parts[0]).map_err(|reason| ParserError::provider_source(source, reason))?
    } else {
        DEFAULT_PROVIDER_REGISTRY_HOST.to_string()
    };

    let namespace = if parts.len() >= 2 {
        let raw = parts[parts.len() - 2];
        if raw == LEGACY_PROVIDER_NAMESPACE {
            if hostname != DEFAULT_PROVIDER_REGISTRY_HOST {
                return Err(ParserError::provider_source(
                    source,
                    format!(
                        "the legacy provider namespace {:?} can be used only with hostname {}",
                        LEGACY_PROVIDER_NAMESPACE, DEFAULT_PROVIDER_REGISTRY_HOST
                    ),
                ));
            }
            Namespace::Legacy
        } else {
            let name = parse_provider_part(raw).map_err(|e| {
                ParserError::provider_source(source, format!("invalid namespace: {}", e))
            })?;
            Namespace::Named(name)
        }
    } else {
        Namespace::Unknown
    };

    Ok(ProviderAddress {
        hostname,
        namespace,
        provider_type,
    })
}

/// Validate and normalize one namespace or type segment
///
/// Segments are letters, digits and single dashes, never starting or ending
/// with a dash. Letters are lowercased.
pub fn parse_provider_part(given: &str) -> Result<String, ProviderPartError> {
    if given.is_empty() {
        return Err(ProviderPartError::Empty);
    }
    let normalized = given.to_lowercase();
    if let Some(c) = normalized
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '-'))
    {
        return Err(ProviderPartError::InvalidCharacter(c));
    }
    if normalized.starts_with('-') || normalized.ends_with('-') {
        return Err(ProviderPartError::EdgeDash);
    }
    if normalized.contains("--") {
        return Err(ProviderPartError::ConsecutiveDashes);
    }
    Ok(normalized)
}

/// Normalize a registry hostname for comparison
///
/// Lowercases the name and drops an explicit `:443`; any other port is kept.
fn parse_hostname(given: &str) -> Result<String, String> {
    let (host, port) = match given.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (given, None),
    };

    if host.is_empty() {
        return Err("the hostname must not be empty".to_string());
    }
    let host = host.to_lowercase();
    for label in host.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(format!("invalid hostname {:?}", given));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!("invalid hostname {:?}", given));
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(format!("invalid hostname {:?}", given));
        }
    }

    match port {
        None => Ok(host),
        Some(port) if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) => {
            Err(format!("invalid port number {:?}", port))
        }
        Some(port) => match port.parse::<u16>() {
            Ok(443) => Ok(host),
            Ok(p) if p > 0 => Ok(format!("{}:{}", host, p)),
            _ => Err(format!("invalid port number {:?}", port)),
        },
    }
}

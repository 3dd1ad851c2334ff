//! Exact version numbers
//!
//! Lock files pin providers to exact semantic versions. Ordering between
//! versions always goes through [`compare_versions`], which follows semver
//! precedence and ignores build metadata.

use crate::error::ParserError;
use std::cmp::Ordering;

/// An exact semantic version
pub type Version = semver::Version;

/// Parse an exact version number such as `4.67.0` or `1.0.0-beta.2`
pub fn parse_version(s: &str) -> Result<Version, ParserError> {
    if s.is_empty() {
        return Err(ParserError::version(s, "a version number is required"));
    }
    if s.trim() != s {
        return Err(ParserError::version(
            s,
            "must not have leading or trailing whitespace",
        ));
    }
    Version::parse(s).map_err(|e| ParserError::version(s, e))
}

/// Compare two versions by precedence (major, minor, patch, prerelease)
pub fn compare_versions(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Returns true if `a` has strictly higher precedence than `b`
pub fn is_newer(a: &Version, b: &Version) -> bool {
    compare_versions(a, b) == Ordering::Greater
}

/// Returns true if the version carries a prerelease tag
pub fn is_prerelease(v: &Version) -> bool {
    !v.pre.is_empty()
}

//! Latest version resolution
//!
//! Turns the list of versions published for a provider into the two
//! "latest" facts the classifier consumes.

use crate::domain::version::{compare_versions, is_prerelease};
use crate::domain::{ConstraintSet, Version};

/// Newest published versions for one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestVersions {
    /// Newest version satisfying the declared constraints
    pub matching: Option<Version>,
    /// Newest version regardless of constraints
    pub overall: Option<Version>,
}

impl LatestVersions {
    /// Resolve latest versions from the available list
    ///
    /// Prereleases are only considered when the current version is itself a
    /// prerelease. Without constraints every candidate matches.
    pub fn resolve(
        available: &[Version],
        constraints: Option<&ConstraintSet>,
        current: Option<&Version>,
    ) -> Self {
        let allow_prerelease = current.is_some_and(is_prerelease);
        let candidates: Vec<&Version> = available
            .iter()
            .filter(|v| allow_prerelease || !is_prerelease(v))
            .collect();

        let overall = candidates
            .iter()
            .copied()
            .max_by(|a, b| compare_versions(a, b))
            .cloned();

        let matching = match constraints {
            Some(set) if !set.is_empty() => candidates
                .iter()
                .copied()
                .filter(|v| set.allows(v))
                .max_by(|a, b| compare_versions(a, b))
                .cloned(),
            _ => overall.clone(),
        };

        Self { matching, overall }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_constraints, parse_version};

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|s| parse_version(s).unwrap()).collect()
    }

    #[test]
    fn test_resolve_with_constraints() {
        let available = versions(&["1.0.0", "1.5.0", "2.0.0", "2.1.0"]);
        let constraints = parse_constraints("~> 1.0").unwrap();
        let latest = LatestVersions::resolve(&available, Some(&constraints), None);
        assert_eq!(latest.matching, Some(Version::new(1, 5, 0)));
        assert_eq!(latest.overall, Some(Version::new(2, 1, 0)));
    }

    #[test]
    fn test_resolve_without_constraints_matches_overall() {
        let available = versions(&["1.0.0", "3.0.0"]);
        let latest = LatestVersions::resolve(&available, None, None);
        assert_eq!(latest.matching, latest.overall);
        assert_eq!(latest.overall, Some(Version::new(3, 0, 0)));
    }

    #[test]
    fn test_resolve_skips_prereleases_for_stable_current() {
        let available = versions(&["1.0.0", "2.0.0-beta.1"]);
        let current = parse_version("1.0.0").unwrap();
        let latest = LatestVersions::resolve(&available, None, Some(&current));
        assert_eq!(latest.overall, Some(Version::new(1, 0, 0)));
    }

    #[test]
    fn test_resolve_keeps_prereleases_for_prerelease_current() {
        let available = versions(&["1.0.0", "2.0.0-beta.1", "2.0.0-beta.2"]);
        let current = parse_version("2.0.0-beta.1").unwrap();
        let latest = LatestVersions::resolve(&available, None, Some(&current));
        assert_eq!(latest.overall, Some(parse_version("2.0.0-beta.2").unwrap()));
    }

    #[test]
    fn test_resolve_nothing_matches() {
        let available = versions(&["2.0.0"]);
        let constraints = parse_constraints("~> 1.0").unwrap();
        let latest = LatestVersions::resolve(&available, Some(&constraints), None);
        assert_eq!(latest.matching, None);
        assert_eq!(latest.overall, Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn test_resolve_empty_list() {
        let latest = LatestVersions::resolve(&[], None, None);
        assert_eq!(latest, LatestVersions::default());
    }
}

//! Update classification for audited dependencies
//!
//! This module provides:
//! - Provider filter configuration from CLI args and config file
//! - Resolution of latest versions from a registry version list
//! - The classification rule table that turns version facts into a verdict

mod filter;
mod latest;

pub use filter::UpdateFilter;
pub use latest::LatestVersions;

use crate::domain::{is_newer, DependencyKind, Status, Update};

/// Verdict produced by a matching rule
struct Verdict {
    status: Status,
    message: &'static str,
    resolution: String,
}

/// One row of the rule table
struct Rule {
    applies: fn(&Update) -> bool,
    verdict: fn(DependencyKind) -> Verdict,
}

/// Rules in ascending priority: every rule is checked and the last one whose
/// condition holds decides the verdict.
const RULES: &[Rule] = &[
    Rule {
        applies: |_| true,
        verdict: |_| Verdict {
            status: Status::Passed,
            message: "No issues detected",
            resolution: "No issues were detected with the current configuration".to_string(),
        },
    },
    Rule {
        applies: |u| match (&u.version, &u.latest_overall) {
            (Some(version), Some(overall)) => is_newer(overall, version),
            _ => false,
        },
        verdict: |kind| Verdict {
            status: Status::Warning,
            message: "Configured version does not match the latest available version",
            resolution: format!("Consider using the latest version of this {}", kind),
        },
    },
    Rule {
        applies: |u| match (&u.version, &u.latest_matching) {
            (Some(version), Some(matching)) => {
                u.kind == DependencyKind::Provider && is_newer(matching, version)
            }
            _ => false,
        },
        verdict: |_| Verdict {
            status: Status::Warning,
            message: "Latest match newer than .terraform.lock.hcl config",
            resolution: "Consider running 'terraform init -upgrade' to upgrade providers and modules to the latest matching versions".to_string(),
        },
    },
    Rule {
        applies: |u| match (&u.latest_overall, &u.latest_matching) {
            (Some(overall), Some(matching)) => is_newer(overall, matching),
            _ => false,
        },
        verdict: |kind| Verdict {
            status: Status::Warning,
            message: "Version constraint does not match the latest available version",
            resolution: format!(
                "Consider amending this version constraint to include the latest available version of this {}",
                kind
            ),
        },
    },
    Rule {
        applies: |u| match (&u.latest_overall, &u.latest_matching) {
            (Some(overall), Some(matching)) => overall.major > matching.major,
            _ => false,
        },
        verdict: |kind| Verdict {
            status: Status::Failed,
            message: "Outdated major version",
            resolution: format!("Consider migrating to the latest major version of this {}", kind),
        },
    },
    Rule {
        applies: |u| u.version_constraints.as_ref().map_or(true, |c| c.is_empty()),
        verdict: |kind| Verdict {
            status: Status::Failed,
            message: "Missing version constraints",
            resolution: format!("Configure version constraints for this {}", kind),
        },
    },
];

/// Classify an update in place from its version facts
pub fn classify(update: &mut Update) {
    for rule in RULES {
        if (rule.applies)(update) {
            let verdict = (rule.verdict)(update.kind);
            update.status = verdict.status;
            update.message = verdict.message.to_string();
            update.resolution = verdict.resolution;
        }
    }
}

/// Classify every update in a batch
pub fn classify_all(updates: &mut [Update]) {
    updates.iter_mut().for_each(classify);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_constraints, parse_version, Version};

    fn v(s: &str) -> Option<Version> {
        Some(parse_version(s).unwrap())
    }

    fn provider(
        version: Option<Version>,
        constraints: Option<&str>,
        matching: Option<Version>,
        overall: Option<Version>,
    ) -> Update {
        let mut update = Update::new(
            DependencyKind::Provider,
            ".",
            "hashicorp/aws",
            "registry.terraform.io/hashicorp/aws",
        )
        .with_constraints(constraints.map(|c| parse_constraints(c).unwrap()))
        .with_version(version)
        .with_latest(matching, overall);
        classify(&mut update);
        update
    }

    #[test]
    fn test_up_to_date_passes() {
        let u = provider(v("1.0.0"), Some("~> 1.0"), v("1.0.0"), v("1.0.0"));
        assert_eq!(u.status, Status::Passed);
        assert_eq!(u.message, "No issues detected");
    }

    #[test]
    fn test_missing_constraints_overrides_default() {
        let u = provider(v("1.0.0"), None, v("1.0.0"), v("1.0.0"));
        assert_eq!(u.status, Status::Failed);
        assert_eq!(u.message, "Missing version constraints");
        assert_eq!(u.resolution, "Configure version constraints for this provider");
    }

    #[test]
    fn test_empty_constraints_count_as_missing() {
        let u = provider(v("1.0.0"), Some(""), v("1.0.0"), v("1.0.0"));
        assert_eq!(u.status, Status::Failed);
        assert_eq!(u.message, "Missing version constraints");
    }

    #[test]
    fn test_newer_matching_version_warns() {
        let u = provider(v("1.0.0"), Some("~> 1.0"), v("1.2.0"), v("1.2.0"));
        assert_eq!(u.status, Status::Warning);
        assert!(u.message.contains("Latest match"));
        assert!(u.resolution.contains("terraform init -upgrade"));
    }

    #[test]
    fn test_newer_overall_version_warns() {
        let u = provider(v("1.0.0"), Some("1.0.0"), v("1.0.0"), v("1.0.1"));
        assert_eq!(u.status, Status::Warning);
        assert_eq!(
            u.message,
            "Version constraint does not match the latest available version"
        );
    }

    #[test]
    fn test_lagging_version_without_matching_fact() {
        let u = provider(v("1.0.0"), Some("~> 1.0"), None, v("1.1.0"));
        assert_eq!(u.status, Status::Warning);
        assert_eq!(
            u.message,
            "Configured version does not match the latest available version"
        );
        assert_eq!(u.resolution, "Consider using the latest version of this provider");
    }

    #[test]
    fn test_major_version_fails_over_constraint_warning() {
        let u = provider(v("1.9.0"), Some("~> 1.0"), v("1.9.0"), v("2.0.0"));
        assert_eq!(u.status, Status::Failed);
        assert_eq!(u.message, "Outdated major version");
    }

    #[test]
    fn test_missing_constraints_wins_over_major() {
        let u = provider(v("1.9.0"), None, v("1.9.0"), v("2.0.0"));
        assert_eq!(u.message, "Missing version constraints");
    }

    #[test]
    fn test_unknown_facts_only_default_and_constraint_rules() {
        let u = provider(None, Some(">= 1.0"), None, None);
        assert_eq!(u.status, Status::Passed);
        let u = provider(None, None, None, None);
        assert_eq!(u.status, Status::Failed);
    }

    #[test]
    fn test_matching_rule_applies_to_providers_only() {
        let mut module = Update::new(DependencyKind::Module, ".", "vpc", "terraform-aws-modules/vpc/aws")
            .with_constraints(Some(parse_constraints("~> 1.0").unwrap()))
            .with_version(v("1.0.0"))
            .with_latest(v("1.2.0"), v("1.2.0"));
        classify(&mut module);
        assert_eq!(module.status, Status::Warning);
        assert_eq!(
            module.message,
            "Configured version does not match the latest available version"
        );
        assert_eq!(module.resolution, "Consider using the latest version of this module");
    }

    #[test]
    fn test_prerelease_ordering_is_consistent() {
        let u = provider(v("2.0.0-rc.1"), Some(">= 2.0.0-rc.1"), v("2.0.0-rc.1"), v("2.0.0"));
        assert_eq!(u.status, Status::Warning);
        assert_eq!(
            u.message,
            "Version constraint does not match the latest available version"
        );
    }

    #[test]
    fn test_classify_is_idempotent() {
        let mut u = provider(v("1.0.0"), Some("~> 1.0"), v("1.2.0"), v("1.2.0"));
        let first = u.clone();
        classify(&mut u);
        assert_eq!(u, first);
    }

    #[test]
    fn test_classify_all() {
        let mut updates = vec![
            provider(v("1.0.0"), None, None, None),
            provider(v("1.0.0"), Some("~> 1.0"), None, None),
        ];
        classify_all(&mut updates);
        assert_eq!(updates[0].status, Status::Failed);
        assert_eq!(updates[1].status, Status::Passed);
    }
}

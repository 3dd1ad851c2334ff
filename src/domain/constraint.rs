//! Version constraint sets
//!
//! Handles Ruby-style constraint expressions as written in lock files and
//! `required_providers` blocks:
//! - Pessimistic constraints: `~> 1.2`, `~> 1.2.3`
//! - Comparison operators: `>=`, `>`, `<=`, `<`, `!=`
//! - Exact versions: `= 1.2.3`, `1.2.3`
//! - Compound constraints: `>= 1.0, < 2.0`
//!
//! A set is the intersection of its clauses.

use crate::domain::version::{compare_versions, is_prerelease, Version};
use crate::error::ParserError;
use regex::Regex;
use semver::Prerelease;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// operator, major, minor, patch, prerelease, build
static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(~>|>=|<=|!=|=|>|<)?\s*([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
    )
    .unwrap()
});

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` or no operator
    Exact,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `~>`, allows only the rightmost given segment to increase
    Pessimistic,
}

impl Operator {
    fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("!=") => Operator::NotEqual,
            Some(">") => Operator::Greater,
            Some(">=") => Operator::GreaterOrEqual,
            Some("<") => Operator::Less,
            Some("<=") => Operator::LessOrEqual,
            Some("~>") => Operator::Pessimistic,
            _ => Operator::Exact,
        }
    }

    /// Returns the operator as written, empty for exact matches
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Exact => "",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

/// A possibly partial version used as a clause boundary, e.g. `1.2`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre: Prerelease,
    /// Build metadata as written; never affects matching
    pub build: Option<String>,
}

impl Boundary {
    /// Boundary with omitted segments filled with zero
    fn floor(&self) -> Version {
        let mut v = Version::new(
            self.major,
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        );
        v.pre = self.pre.clone();
        v
    }

    /// Exact match, omitted segments act as wildcards
    fn matches(&self, v: &Version) -> bool {
        v.major == self.major
            && self.minor.map_or(true, |minor| v.minor == minor)
            && self.patch.map_or(true, |patch| v.patch == patch)
            && v.pre == self.pre
    }

    /// Exclusive upper bound of a pessimistic clause, None if it overflows
    fn pessimistic_ceiling(&self) -> Option<Version> {
        match (self.minor, self.patch) {
            (Some(minor), Some(_)) => Some(Version::new(self.major, minor.checked_add(1)?, 0)),
            _ => Some(Version::new(self.major.checked_add(1)?, 0, 0)),
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

/// One clause of a constraint set, e.g. `>= 1.0`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub op: Operator,
    pub boundary: Boundary,
}

impl Constraint {
    /// Check a single clause, ignoring prerelease policy
    fn allows(&self, v: &Version) -> bool {
        let ord = compare_versions(v, &self.boundary.floor());
        match self.op {
            Operator::Exact => self.boundary.matches(v),
            Operator::NotEqual => !self.boundary.matches(v),
            Operator::Greater => ord == Ordering::Greater,
            Operator::GreaterOrEqual => ord != Ordering::Less,
            Operator::Less => ord == Ordering::Less,
            Operator::LessOrEqual => ord != Ordering::Greater,
            Operator::Pessimistic => {
                ord != Ordering::Less
                    && self
                        .boundary
                        .pessimistic_ceiling()
                        .map_or(true, |ceiling| compare_versions(v, &ceiling) == Ordering::Less)
            }
        }
    }

    /// Returns true if this clause explicitly names the given prerelease
    fn names_prerelease(&self, v: &Version) -> bool {
        let floor = self.boundary.floor();
        !self.boundary.pre.is_empty()
            && (floor.major, floor.minor, floor.patch) == (v.major, v.minor, v.patch)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Operator::Exact => write!(f, "{}", self.boundary),
            op => write!(f, "{} {}", op.as_str(), self.boundary),
        }
    }
}

/// Intersection of constraint clauses
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConstraintSet {
    clauses: Vec<Constraint>,
}

impl ConstraintSet {
    /// Creates a set from already parsed clauses
    pub fn new(clauses: Vec<Constraint>) -> Self {
        Self { clauses }
    }

    /// Returns the clauses in declaration order
    pub fn clauses(&self) -> &[Constraint] {
        &self.clauses
    }

    /// Returns true when no clause was declared
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Returns true if every clause accepts the version
    ///
    /// Prerelease versions are accepted only when some clause names that
    /// exact prerelease's `major.minor.patch` together with a prerelease tag.
    pub fn allows(&self, v: &Version) -> bool {
        if is_prerelease(v) && !self.clauses.iter().any(|c| c.names_prerelease(v)) {
            return false;
        }
        self.clauses.iter().all(|c| c.allows(v))
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

impl FromStr for ConstraintSet {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_constraints(s)
    }
}

impl Serialize for ConstraintSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a comma-separated constraint expression
///
/// Empty or all-whitespace input yields an empty set.
pub fn parse_constraints(expr: &str) -> Result<ConstraintSet, ParserError> {
    if expr.trim().is_empty() {
        return Ok(ConstraintSet::default());
    }

    let clauses = expr
        .split(',')
        .map(|clause| parse_clause(expr, clause.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConstraintSet::new(clauses))
}

fn parse_clause(expr: &str, clause: &str) -> Result<Constraint, ParserError> {
    if clause.is_empty() {
        return Err(ParserError::constraint(expr, "empty constraint clause"));
    }

    let caps = CLAUSE_RE.captures(clause).ok_or_else(|| {
        ParserError::constraint(expr, format!("invalid constraint clause {:?}", clause))
    })?;

    let number = |idx: usize| -> Result<Option<u64>, ParserError> {
        caps.get(idx)
            .map(|m| {
                m.as_str().parse::<u64>().map_err(|_| {
                    ParserError::constraint(
                        expr,
                        format!("version segment {:?} is too large", m.as_str()),
                    )
                })
            })
            .transpose()
    };

    let major = number(2)?.unwrap_or(0);
    let minor = number(3)?;
    let patch = number(4)?;
    let pre = match caps.get(5) {
        Some(m) => Prerelease::new(m.as_str()).map_err(|e| ParserError::constraint(expr, e))?,
        None => Prerelease::EMPTY,
    };

    Ok(Constraint {
        op: Operator::from_token(caps.get(1).map(|m| m.as_str())),
        boundary: Boundary {
            major,
            minor,
            patch,
            pre,
            build: caps.get(6).map(|m| m.as_str().to_string()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::version::parse_version;
    use crate::error::ParseErrorKind;

    fn set(expr: &str) -> ConstraintSet {
        parse_constraints(expr).unwrap()
    }

    fn allows(expr: &str, version: &str) -> bool {
        set(expr).allows(&parse_version(version).unwrap())
    }

    #[test]
    fn test_parse_empty_is_no_constraint() {
        assert!(set("").is_empty());
        assert!(set("   ").is_empty());
    }

    #[test]
    fn test_parse_pessimistic() {
        let s = set("~> 1.2");
        assert_eq!(s.clauses().len(), 1);
        assert_eq!(s.clauses()[0].op, Operator::Pessimistic);
        assert_eq!(s.clauses()[0].boundary.minor, Some(2));
        assert_eq!(s.clauses()[0].boundary.patch, None);
    }

    #[test]
    fn test_parse_no_space() {
        let s = set(">=1.0.0,<2.0.0");
        assert_eq!(s.clauses().len(), 2);
        assert_eq!(s.to_string(), ">= 1.0.0, < 2.0.0");
    }

    #[test]
    fn test_parse_compound_multiple() {
        let s = set(">= 1.0, < 2.0, != 1.5.0");
        let ops: Vec<_> = s.clauses().iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![Operator::GreaterOrEqual, Operator::Less, Operator::NotEqual]
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for expr in [
            "~>",
            ">= 1.0,",
            ",",
            "=> 1.0",
            "1.x",
            "1.2.3.4",
            "latest",
            ">= 1.0 < 2.0",
            "~> 1.0-01",
            "99999999999999999999999",
        ] {
            let err = parse_constraints(expr).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::Constraint, "expr {:?}", expr);
        }
    }

    #[test]
    fn test_display_round_trip() {
        for expr in ["~> 1.2", ">= 1.0, < 2.0", "1.2.3", "!= 1.5.0", "~> 2.0.0-beta.1"] {
            let parsed = set(expr);
            assert_eq!(set(&parsed.to_string()), parsed);
        }
        assert_eq!(set("= 1.2.3").to_string(), "1.2.3");
    }

    #[test]
    fn test_pessimistic_major_minor() {
        assert!(allows("~> 1.2", "1.2.0"));
        assert!(allows("~> 1.2", "1.9.7"));
        assert!(!allows("~> 1.2", "2.0.0"));
        assert!(!allows("~> 1.2", "1.1.9"));
    }

    #[test]
    fn test_pessimistic_patch() {
        assert!(allows("~> 1.2.3", "1.2.9"));
        assert!(!allows("~> 1.2.3", "1.3.0"));
        assert!(!allows("~> 1.2.3", "1.2.2"));
    }

    #[test]
    fn test_pessimistic_major_only() {
        assert!(allows("~> 1", "1.9.0"));
        assert!(!allows("~> 1", "2.0.0"));
    }

    #[test]
    fn test_pessimistic_overflow_has_no_ceiling() {
        let max = format!("~> {}", u64::MAX);
        assert!(allows(&max, &format!("{}.5.0", u64::MAX)));
    }

    #[test]
    fn test_range() {
        assert!(allows(">= 1.0, < 2.0", "1.5.0"));
        assert!(!allows(">= 1.0, < 2.0", "2.0.0"));
        assert!(!allows(">= 1.0, < 2.0", "0.9.0"));
        assert!(allows("> 1.0", "1.0.1"));
        assert!(!allows("> 1.0", "1.0.0"));
        assert!(allows("<= 1.0", "1.0.0"));
    }

    #[test]
    fn test_exact_and_not_equal() {
        assert!(allows("1.2.3", "1.2.3"));
        assert!(!allows("1.2.3", "1.2.4"));
        assert!(allows("= 1.2", "1.2.7"));
        assert!(!allows(">= 1.0, != 1.5.0", "1.5.0"));
        assert!(allows(">= 1.0, != 1.5", "1.6.0"));
        assert!(!allows(">= 1.0, != 1.5", "1.5.3"));
    }

    #[test]
    fn test_prerelease_requires_explicit_mention() {
        assert!(!allows(">= 1.0", "2.0.0-beta.1"));
        assert!(allows("2.0.0-beta.1", "2.0.0-beta.1"));
        assert!(allows(">= 2.0.0-alpha", "2.0.0-beta.1"));
        assert!(!allows(">= 2.0.0-alpha", "2.1.0-beta.1"));
    }

    #[test]
    fn test_empty_set_allows_releases_only() {
        assert!(allows("", "9.9.9"));
        assert!(!allows("", "1.0.0-rc.1"));
    }

    #[test]
    fn test_build_metadata_ignored() {
        assert!(allows("1.2.3+abc", "1.2.3"));
        assert_eq!(set("1.2.3+abc").to_string(), "1.2.3+abc");
    }

    #[test]
    fn test_from_str() {
        let s: ConstraintSet = "~> 4.0".parse().unwrap();
        assert_eq!(s.to_string(), "~> 4.0");
    }
}

//! Core domain models for tfvc
//!
//! This module contains the value types shared by the parser and the
//! classifier:
//! - Exact versions and their ordering
//! - Version constraint sets
//! - Provider source addresses
//! - Update verdicts

pub mod constraint;
pub mod provider;
pub mod update;
pub mod version;

pub use constraint::{parse_constraints, ConstraintSet, Operator};
pub use provider::{
    parse_provider_part, parse_provider_source, Namespace, ProviderAddress,
    DEFAULT_PROVIDER_REGISTRY_HOST, LEGACY_PROVIDER_NAMESPACE, UNKNOWN_PROVIDER_NAMESPACE,
};
pub use update::{sort_updates, DependencyKind, Status, Update};
pub use version::{compare_versions, is_newer, parse_version, Version};

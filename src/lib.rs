//! tfvc - Terraform dependency lock file auditor library
//!
//! This library provides the building blocks of the audit:
//! - Provider source address and version constraint parsing
//! - `.terraform.lock.hcl` parsing and rendering
//! - Latest-version resolution and update classification
//! - Registry lookups and report formatting

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod lockfile;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod update;

pub use domain::{parse_constraints, parse_provider_part, parse_provider_source};
pub use lockfile::{load_locks, load_locks_bytes, Locks, ProviderLock};
pub use update::classify;

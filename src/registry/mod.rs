//! Registry adapters for fetching provider version information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - Terraform provider registry adapter with service discovery

mod client;
mod terraform;

pub use client::{HttpClient, DEFAULT_TIMEOUT};
pub use terraform::TerraformRegistryAdapter;

use crate::domain::{ProviderAddress, Version};
use crate::error::RegistryError;
use async_trait::async_trait;

/// Trait for registry adapters
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Fetch all published versions of a provider
    async fn fetch_versions(&self, addr: &ProviderAddress) -> Result<Vec<Version>, RegistryError>;
}

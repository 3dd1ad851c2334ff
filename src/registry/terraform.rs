//! Terraform provider registry adapter
//!
//! Speaks the provider registry protocol:
//! - Service discovery: `https://<host>/.well-known/terraform.json`, key `providers.v1`
//! - Versions: `GET <providers base>/<namespace>/<type>/versions`

use crate::domain::{parse_version, ProviderAddress, Version, DEFAULT_PROVIDER_REGISTRY_HOST};
use crate::error::RegistryError;
use crate::registry::{HttpClient, RegistryAdapter};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Providers API path used when a host does not advertise one
const DEFAULT_PROVIDERS_PATH: &str = "/v1/providers/";

/// Service discovery document
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    #[serde(rename = "providers.v1")]
    providers_v1: Option<String>,
}

/// Response of the versions endpoint
#[derive(Debug, Deserialize)]
struct VersionsResponse {
    versions: Vec<ProviderVersion>,
}

#[derive(Debug, Deserialize)]
struct ProviderVersion {
    version: String,
}

/// Adapter for Terraform provider registries
pub struct TerraformRegistryAdapter {
    client: HttpClient,
    /// Providers base URL per hostname
    services: Mutex<HashMap<String, String>>,
}

impl TerraformRegistryAdapter {
    /// Create a new registry adapter
    pub fn new(client: HttpClient) -> Self {
        let mut services = HashMap::new();
        services.insert(
            DEFAULT_PROVIDER_REGISTRY_HOST.to_string(),
            service_url(DEFAULT_PROVIDER_REGISTRY_HOST, DEFAULT_PROVIDERS_PATH),
        );
        Self {
            client,
            services: Mutex::new(services),
        }
    }

    fn cached_service(&self, host: &str) -> Option<String> {
        self.services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .cloned()
    }

    /// Find the providers API base URL for a host
    async fn providers_base(&self, host: &str) -> Result<String, RegistryError> {
        if let Some(base) = self.cached_service(host) {
            return Ok(base);
        }

        let url = format!("https://{}/.well-known/terraform.json", host);
        debug!(host, "Discovering registry services");
        let document: DiscoveryDocument = match self.client.get_json(&url, host, host).await {
            Ok(document) => document,
            Err(RegistryError::ProviderNotFound { .. }) => {
                return Err(RegistryError::UnsupportedHost {
                    registry: host.to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        let path = document
            .providers_v1
            .ok_or_else(|| RegistryError::UnsupportedHost {
                registry: host.to_string(),
            })?;

        let base = service_url(host, &path);
        self.services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host.to_string(), base.clone());
        Ok(base)
    }
}

/// Resolve a discovered service path against its host
fn service_url(host: &str, path: &str) -> String {
    let mut url = if path.starts_with("https://") || path.starts_with("http://") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("https://{}{}", host, path)
    } else {
        format!("https://{}/{}", host, path)
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

fn versions_url(base: &str, addr: &ProviderAddress) -> String {
    format!("{}{}/{}/versions", base, addr.namespace, addr.provider_type)
}

/// Keep the versions that parse, sorted oldest first
fn collect_versions(response: VersionsResponse) -> Vec<Version> {
    let mut versions: Vec<Version> = response
        .versions
        .into_iter()
        .filter_map(|v| match parse_version(&v.version) {
            Ok(version) => Some(version),
            Err(e) => {
                debug!(version = %v.version, error = %e, "Skipping unparsable registry version");
                None
            }
        })
        .collect();
    versions.sort();
    versions.dedup();
    versions
}

#[async_trait]
impl RegistryAdapter for TerraformRegistryAdapter {
    fn registry_name(&self) -> &'static str {
        "Terraform"
    }

    async fn fetch_versions(&self, addr: &ProviderAddress) -> Result<Vec<Version>, RegistryError> {
        let base = self.providers_base(&addr.hostname).await?;
        let url = versions_url(&base, addr);
        let name = addr.for_display();
        let response: VersionsResponse = self
            .client
            .get_json(&url, &name, &addr.hostname)
            .await?;
        Ok(collect_versions(response))
    }
}

//! Provider filter configuration
//!
//! This module provides the UpdateFilter struct that decides which locked
//! providers take part in an audit.

use crate::domain::ProviderAddress;

/// Filter configuration for the audit
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Providers to leave out of the audit
    pub exclude: Vec<String>,
    /// If non-empty, only audit these providers
    pub only: Vec<String>,
}

impl UpdateFilter {
    /// Create a new UpdateFilter with default settings (audit all)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set providers to exclude
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set providers to include (only list)
    pub fn with_only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    /// Check if a provider should be audited
    ///
    /// Patterns match either the short display form (`hashicorp/aws`) or the
    /// fully-qualified address, case-insensitively.
    pub fn should_process_provider(&self, addr: &ProviderAddress) -> bool {
        let short = addr.for_display();
        let full = addr.to_string();
        let matches =
            |p: &String| p.eq_ignore_ascii_case(&short) || p.eq_ignore_ascii_case(&full);

        if !self.only.is_empty() {
            return self.only.iter().any(matches);
        }
        !self.exclude.iter().any(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aws() -> ProviderAddress {
        ProviderAddress::new("hashicorp", "aws")
    }

    #[test]
    fn test_default_processes_all() {
        assert!(UpdateFilter::new().should_process_provider(&aws()));
    }

    #[test]
    fn test_exclude_short_name() {
        let filter = UpdateFilter::new().with_exclude(vec!["hashicorp/aws".to_string()]);
        assert!(!filter.should_process_provider(&aws()));
        assert!(filter.should_process_provider(&ProviderAddress::new("hashicorp", "null")));
    }

    #[test]
    fn test_exclude_full_address_case_insensitive() {
        let filter = UpdateFilter::new()
            .with_exclude(vec!["Registry.Terraform.io/HashiCorp/AWS".to_string()]);
        assert!(!filter.should_process_provider(&aws()));
    }

    #[test]
    fn test_only_takes_precedence() {
        let filter = UpdateFilter::new()
            .with_only(vec!["hashicorp/null".to_string()])
            .with_exclude(vec!["hashicorp/null".to_string()]);
        assert!(!filter.should_process_provider(&aws()));
        assert!(filter.should_process_provider(&ProviderAddress::new("hashicorp", "null")));
    }
}

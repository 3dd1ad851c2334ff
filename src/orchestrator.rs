//! Audit orchestrator for coordinating the entire workflow
//!
//! This module provides:
//! - Workflow coordination: locate → parse → fetch → classify
//! - Parallel registry queries bounded by a semaphore
//! - Provider filter application
//! - Error handling with partial continuation

use crate::config::Settings;
use crate::domain::{sort_updates, DependencyKind, ProviderAddress, Status, Update};
use crate::error::{AppError, IoError};
use crate::lockfile::{load_locks_bytes, Locks, ProviderLock};
use crate::progress::Progress;
use crate::registry::{HttpClient, RegistryAdapter, TerraformRegistryAdapter};
use crate::update::{classify_all, LatestVersions};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Orchestrator for coordinating the audit workflow
pub struct Orchestrator {
    /// Effective settings for this run
    settings: Settings,
    /// Registry used for version lookups
    adapter: Arc<dyn RegistryAdapter>,
    /// Semaphore for registry concurrency control
    semaphore: Arc<Semaphore>,
}

/// Result of auditing one lock file
#[derive(Debug)]
pub struct AuditReport {
    /// Lock file that was audited
    pub lock_file: PathBuf,
    /// Classified providers, sorted
    pub updates: Vec<Update>,
    /// Registry lookups that failed
    pub errors: Vec<OrchestratorError>,
}

impl AuditReport {
    /// Number of updates with the given status
    pub fn count(&self, status: Status) -> usize {
        self.updates.iter().filter(|u| u.status == status).count()
    }

    /// Most severe status in the report, if any provider was audited
    pub fn worst_status(&self) -> Option<Status> {
        self.updates.iter().map(|u| u.status).max()
    }

    /// Returns true if the report should fail the run
    pub fn is_failure(&self, fail_on_warning: bool) -> bool {
        match self.worst_status() {
            Some(Status::Failed) => true,
            Some(Status::Warning) => fail_on_warning,
            _ => false,
        }
    }
}

/// Errors that do not abort the audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// Failed to fetch versions from registry
    RegistryError { provider: String, message: String },
    /// A lookup task stopped unexpectedly
    TaskFailed(String),
}

impl std::fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorError::RegistryError { provider, message } => {
                write!(f, "Failed to fetch {}: {}", provider, message)
            }
            OrchestratorError::TaskFailed(msg) => write!(f, "Lookup task failed: {}", msg),
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl Orchestrator {
    /// Create a new orchestrator talking to the real provider registries
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let client = HttpClient::with_timeout(settings.timeout)?;
        let adapter = Arc::new(TerraformRegistryAdapter::new(client));
        Ok(Self::with_adapter(settings, adapter))
    }

    /// Create an orchestrator with a custom registry adapter (for testing)
    pub fn with_adapter(settings: Settings, adapter: Arc<dyn RegistryAdapter>) -> Self {
        let permits = settings.concurrency.clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        Self {
            settings,
            adapter,
            semaphore,
        }
    }

    /// Run the audit workflow
    pub async fn run(&self) -> Result<AuditReport, AppError> {
        self.run_with_progress(self.settings.output.shows_progress())
            .await
    }

    /// Run the audit workflow with optional progress display
    ///
    /// A missing or malformed lock file aborts the run. Registry failures are
    /// recorded and the affected provider is classified without latest facts.
    pub async fn run_with_progress(&self, show_progress: bool) -> Result<AuditReport, AppError> {
        let mut progress = Progress::new(show_progress);
        let lock_file = self.settings.lock_file.clone();

        // Step 1: Parse the lock file
        progress.reading_lock_file(&lock_file);
        let locks = read_lock_file(&lock_file);
        progress.clear();
        let locks = locks?;

        for addr in locks.overridden_providers() {
            debug!(provider = %addr, "Skipping overridden provider");
        }

        let selected: Vec<ProviderLock> = locks
            .providers()
            .values()
            .filter(|lock| {
                let keep = self.settings.filter.should_process_provider(&lock.addr);
                if !keep {
                    debug!(provider = %lock.addr, "Provider filtered out");
                }
                keep
            })
            .cloned()
            .collect();

        // Step 2: Fetch versions concurrently
        progress.begin_lookups(selected.len());
        let mut pending: BTreeMap<ProviderAddress, ProviderLock> = selected
            .iter()
            .map(|lock| (lock.addr.clone(), lock.clone()))
            .collect();
        let mut tasks = JoinSet::new();
        for lock in selected {
            let adapter = Arc::clone(&self.adapter);
            let semaphore = Arc::clone(&self.semaphore);
            tasks.spawn(async move {
                if lock.addr.namespace.is_sentinel() {
                    debug!(provider = %lock.addr, "No registry lookup for unresolved namespace");
                    return (lock, Ok(None));
                }
                let _permit = semaphore.acquire_owned().await.ok();
                let fetched = adapter.fetch_versions(&lock.addr).await.map(Some);
                (lock, fetched)
            });
        }

        // Step 3: Resolve latest versions and build updates
        let path = display_dir(&lock_file);
        let mut updates = Vec::new();
        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (lock, fetched) = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "Registry lookup task failed");
                    errors.push(OrchestratorError::TaskFailed(e.to_string()));
                    continue;
                }
            };
            pending.remove(&lock.addr);
            progress.provider_done(&lock.addr.for_display());

            let latest = match fetched {
                Ok(Some(versions)) => LatestVersions::resolve(
                    &versions,
                    lock.version_constraints.as_ref(),
                    Some(&lock.version),
                ),
                Ok(None) => LatestVersions::default(),
                Err(e) => {
                    warn!(provider = %lock.addr, error = %e, "Registry lookup failed");
                    errors.push(OrchestratorError::RegistryError {
                        provider: lock.addr.for_display(),
                        message: e.to_string(),
                    });
                    LatestVersions::default()
                }
            };
            updates.push(build_update(&path, lock, latest));
        }
        // Lookups that never reported back are still classified, without latest facts
        for (_, lock) in pending {
            progress.provider_done(&lock.addr.for_display());
            updates.push(build_update(&path, lock, LatestVersions::default()));
        }
        progress.clear();

        // Step 4: Classify
        classify_all(&mut updates);
        sort_updates(&mut updates);
        errors.sort_by_key(|e| e.to_string());

        Ok(AuditReport {
            lock_file,
            updates,
            errors,
        })
    }
}

/// Read and parse a lock file from disk
pub fn read_lock_file(path: &Path) -> Result<Locks, AppError> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::lock_file_not_found(path)
        } else {
            IoError::generic(path, e)
        }
    })?;
    Ok(load_locks_bytes(&bytes)?)
}

/// Directory shown as the update path
fn display_dir(lock_file: &Path) -> String {
    match lock_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
        _ => ".".to_string(),
    }
}

fn build_update(path: &str, lock: ProviderLock, latest: LatestVersions) -> Update {
    Update::new(
        DependencyKind::Provider,
        path,
        lock.addr.for_display(),
        lock.addr.to_string(),
    )
    .with_constraints(lock.version_constraints)
    .with_version(Some(lock.version))
    .with_latest(latest.matching, latest.overall)
}

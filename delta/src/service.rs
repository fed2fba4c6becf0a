//! Orchestration of the tracker/runner pair.

use std::sync::Arc;

use chrono::Utc;
use delta_core::{Change, CoreError, Registry, Request, Runner, StatusReport, Tracker};
use serde::Serialize;

/// Names and defaults used when resolving drivers.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub runner_prefix: String,
    pub tracker_prefix: String,
    /// Driver name used when the request names none.
    pub default_driver: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            runner_prefix: "delta:runner".to_owned(),
            tracker_prefix: "delta:tracker".to_owned(),
            default_driver: "mdb".to_owned(),
        }
    }
}

/// First per-change failure of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct Halt {
    pub name: String,
    pub reason: String,
}

/// Outcome of a `commit` or `rollback` batch.
///
/// `changes` is the prefix that executed successfully, in execution
/// order; it is persisted (or removed) even when `halted` is set, so a
/// partial failure never loses the work done before it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub changes: Vec<Change>,
    pub halted: Option<Halt>,
}

/// Sequences the tracker and runner resolved from a request.
///
/// Batch iteration is strictly sequential, ordered by the tracker's
/// scan. The first per-change failure stops the batch; the valid prefix
/// is still handed to the tracker, which is what makes a re-run resume
/// where the failure happened.
pub struct MigrationService {
    runners: Registry<dyn Runner>,
    trackers: Registry<dyn Tracker>,
    config: ServiceConfig,
}

impl Default for MigrationService {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationService {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        Self {
            runners: Registry::new(),
            trackers: Registry::new(),
            config,
        }
    }

    pub fn register_runner(&self, name: &str, runner: Arc<dyn Runner>) {
        let key = format!("{}:{}", self.config.runner_prefix, name.to_lowercase());
        self.runners.insert(key, runner);
    }

    pub fn register_tracker(&self, name: &str, tracker: Arc<dyn Tracker>) {
        let key = format!("{}:{}", self.config.tracker_prefix, name.to_lowercase());
        self.trackers.insert(key, tracker);
    }

    /// Resolves the (runner, tracker) pair named by the request.
    fn drivers(&self, req: &Request) -> Result<(Arc<dyn Runner>, Arc<dyn Tracker>), CoreError> {
        let runner_name = req
            .runner
            .as_deref()
            .unwrap_or(&self.config.default_driver)
            .to_lowercase();
        let tracker_name = req
            .tracker
            .as_deref()
            .unwrap_or(&self.config.default_driver)
            .to_lowercase();

        let runner = self
            .runners
            .get(&format!("{}:{runner_name}", self.config.runner_prefix))?;
        let tracker = self
            .trackers
            .get(&format!("{}:{tracker_name}", self.config.tracker_prefix))?;

        Ok((runner, tracker))
    }

    /// Applies every available change in order, halting on the first
    /// failure and persisting the prefix that succeeded.
    ///
    /// A runner may have committed its transaction right before a log
    /// write fails; in that case the error names the changes that ran
    /// but were not recorded, and recovery is the operator's concern.
    pub async fn commit(&self, req: &Request) -> anyhow::Result<BatchReport> {
        let (runner, tracker) = self.drivers(req)?;
        let available = tracker.available(req).await?;

        let mut changes: Vec<Change> = Vec::new();
        let mut halted = None;

        for mut change in available {
            change.flow = Some(req.flow.clone());

            match runner.commit(&mut change, req).await {
                Ok(message) => {
                    change.applied = Some(Utc::now());
                    tracing::info!(flow = %req.flow, name = %change.name, %message, "change committed");
                    changes.push(change);
                }
                Err(err) => {
                    tracing::error!(
                        flow = %req.flow,
                        name = %change.name,
                        %err,
                        "change failed, halting the batch"
                    );
                    halted = Some(Halt {
                        name: change.name.clone(),
                        reason: err.to_string(),
                    });
                    break;
                }
            }
        }

        if let Err(err) = tracker.add(&changes, req).await {
            let names: Vec<&str> = changes.iter().map(|c| c.name.as_str()).collect();

            return Err(err.context(format!(
                "committed changes were not persisted to the applied log: [{}]",
                names.join(", ")
            )));
        }

        Ok(BatchReport { changes, halted })
    }

    /// Rolls back applied changes most-recent-first, halting on the
    /// first failure and removing the rolled-back prefix from the log.
    ///
    /// The crash window mirrors `commit`: a hook may have reverted the
    /// target right before the log delete fails, in which case the
    /// error names the changes that were reverted but still appear
    /// applied.
    pub async fn rollback(&self, req: &Request) -> anyhow::Result<BatchReport> {
        let (runner, tracker) = self.drivers(req)?;
        let applied = tracker.list(req).await?;

        let mut changes: Vec<Change> = Vec::new();
        let mut halted = None;

        for mut change in applied.into_iter().rev() {
            change.flow = Some(req.flow.clone());

            match runner.rollback(&mut change, req).await {
                Ok(message) => {
                    tracing::info!(flow = %req.flow, name = %change.name, %message, "change rolled back");
                    changes.push(change);
                }
                Err(err) => {
                    tracing::error!(
                        flow = %req.flow,
                        name = %change.name,
                        %err,
                        "rollback failed, halting the batch"
                    );
                    halted = Some(Halt {
                        name: change.name.clone(),
                        reason: err.to_string(),
                    });
                    break;
                }
            }
        }

        if let Err(err) = tracker.delete(&changes, req).await {
            let names: Vec<&str> = changes.iter().map(|c| c.name.as_str()).collect();

            return Err(err.context(format!(
                "rolled-back changes were not removed from the applied log: [{}]",
                names.join(", ")
            )));
        }

        Ok(BatchReport { changes, halted })
    }

    pub async fn status(&self, req: &Request) -> anyhow::Result<StatusReport> {
        let (_, tracker) = self.drivers(req)?;

        tracker.status(req).await
    }

    pub async fn compare(&self, req: &Request) -> anyhow::Result<String> {
        let (runner, _) = self.drivers(req)?;

        runner.compare(req).await
    }

    pub async fn check(&self, req: &Request) -> anyhow::Result<String> {
        let (runner, _) = self.drivers(req)?;

        runner.check(req).await
    }

    /// Scaffolds the paired commit/rollback artifacts for a new change.
    pub async fn create(&self, name: &str, req: &Request) -> anyhow::Result<Vec<std::path::PathBuf>> {
        let (runner, _) = self.drivers(req)?;

        runner.create(name, req).await
    }

    /// Reserved for external configuration sources.
    pub async fn configure(&self, _req: &Request) -> anyhow::Result<()> {
        Err(CoreError::NotImplemented.into())
    }
}

//! The per-invocation configuration record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::filter::Filter;

/// Engine operation requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Commit,
    Rollback,
    #[default]
    Status,
    Compare,
    Check,
    Create,
}

/// Thin configuration record carried through every engine operation.
///
/// A request is cheap to build and owns no connections; driver-specific
/// settings travel in `params` and are opaque to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id for logs, one per user invocation.
    pub flow: String,
    /// Scan root; the process working directory when absent.
    pub path: Option<PathBuf>,
    /// Extension filter applied by the scan.
    pub extension: Option<String>,
    /// Runner driver name, e.g. `mdb` or `shell`.
    pub runner: Option<String>,
    /// Tracker driver name.
    pub tracker: Option<String>,
    /// Key prefix for resolving migration modules.
    pub prefix: Option<String>,
    pub filter: Option<Filter>,
    /// Driver-opaque settings.
    pub params: Option<serde_json::Value>,
    /// Forces a filesystem stat even when the filename carries a timestamp.
    pub stat: bool,
    pub action: Action,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            flow: Ulid::new().to_string(),
            path: None,
            extension: None,
            runner: None,
            tracker: None,
            prefix: None,
            filter: None,
            params: None,
            stat: false,
            action: Action::default(),
        }
    }
}

impl Request {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    /// Scan root, falling back to the process working directory.
    pub fn root(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Reads a string entry out of the driver-opaque `params`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.as_ref()?.get(key)?.as_str()
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = Some(runner.into());
        self
    }

    pub fn tracker(mut self, tracker: impl Into<String>) -> Self {
        self.tracker = Some(tracker.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn stat(mut self, stat: bool) -> Self {
        self.stat = stat;
        self
    }
}

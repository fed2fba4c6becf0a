//! The per-change execution contract.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::{change::Change, error::CoreError, request::Request, scaffold};

/// Which user-authored hook a runner invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Commit,
    Rollback,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Commit => "commit",
            Direction::Rollback => "rollback",
        }
    }

    /// Default success message when the hook returns none.
    pub fn message(&self) -> &'static str {
        match self {
            Direction::Commit => "Migration committed",
            Direction::Rollback => "Migration rolled back",
        }
    }
}

/// Executor of a single migration against the target backend.
///
/// `commit` and `rollback` run one change and return the success message;
/// failures are plain errors and it is the service's job to stop the
/// batch. `configure` is invoked lazily by the execution operations when
/// the backend is not yet initialized. `compare` and `check` stay
/// unimplemented unless a backend has something to say.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn configure(&self, req: &Request) -> anyhow::Result<()> {
        let _ = req;
        Ok(())
    }

    async fn commit(&self, change: &mut Change, req: &Request) -> anyhow::Result<String>;

    async fn rollback(&self, change: &mut Change, req: &Request) -> anyhow::Result<String>;

    async fn check(&self, req: &Request) -> anyhow::Result<String> {
        let _ = req;
        Err(CoreError::NotImplemented.into())
    }

    async fn compare(&self, req: &Request) -> anyhow::Result<String> {
        let _ = req;
        Err(CoreError::NotImplemented.into())
    }

    /// Loads the artifact body into the change, returning it.
    async fn content(&self, change: &mut Change) -> anyhow::Result<Option<String>> {
        if change.content.is_none() {
            change.content = Some(tokio::fs::read_to_string(&change.file).await?);
        }

        Ok(change.content.clone())
    }

    /// File extension used by scaffolded artifacts.
    fn default_extension(&self) -> &str {
        "js"
    }

    /// Unix permission bits for scaffolded artifacts.
    fn artifact_mode(&self) -> u32 {
        0o644
    }

    /// Generates the paired commit/rollback artifacts for a new change.
    async fn create(&self, name: &str, req: &Request) -> anyhow::Result<Vec<PathBuf>> {
        let options = scaffold::Options {
            extension: req
                .extension
                .clone()
                .unwrap_or_else(|| self.default_extension().to_owned()),
            mode: self.artifact_mode(),
            template_dir: None,
        };

        Ok(scaffold::create_pair(&req.root(), name, &options).await?)
    }
}

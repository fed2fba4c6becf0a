//! Runner that hands each artifact to an interpreter program.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use delta_core::{rollback_artifact, Change, CoreError, Direction, Request, Runner};
use tokio::process::Command;

use crate::error::ShellError;

#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Interpreter invoked as `<program> <file>`.
    pub program: String,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            program: "echo".to_owned(),
        }
    }
}

/// Resolves the rollback artifact paired with a commit artifact,
/// requiring it to exist.
pub(crate) async fn resolve_rollback(file: &Path) -> Result<PathBuf, ShellError> {
    let derived = rollback_artifact(file)
        .ok_or_else(|| CoreError::RollbackArtifactMissing(file.to_path_buf()))?;

    if !tokio::fs::try_exists(&derived).await? {
        return Err(CoreError::RollbackArtifactMissing(derived).into());
    }

    Ok(derived)
}

pub(crate) fn render_output(stdout: &[u8], stderr: &[u8], fallback: &str) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let mut message = stdout.trim().to_owned();

    if !stderr.trim().is_empty() {
        if !message.is_empty() {
            message.push('\n');
        }
        message.push_str(stderr.trim());
    }

    if message.is_empty() {
        message = fallback.to_owned();
    }

    message
}

#[derive(Debug, Clone, Default)]
pub struct ExecRunner {
    config: ExecConfig,
}

impl ExecRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExecConfig) -> Self {
        Self { config }
    }

    fn program(&self, req: &Request) -> String {
        req.param("program")
            .map(str::to_owned)
            .unwrap_or_else(|| self.config.program.clone())
    }

    async fn run(&self, file: &Path, req: &Request, direction: Direction) -> anyhow::Result<String> {
        let program = self.program(req);

        let output = Command::new(&program)
            .arg(file)
            .output()
            .await
            .map_err(|source| ShellError::Launch {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ShellError::CommandFailed {
                program,
                code: output.status.code(),
                detail: render_output(&output.stdout, &output.stderr, "no output"),
            }
            .into());
        }

        tracing::info!(
            flow = %req.flow,
            file = %file.display(),
            %program,
            hook = direction.as_str(),
            "artifact executed"
        );

        Ok(render_output(
            &output.stdout,
            &output.stderr,
            direction.message(),
        ))
    }
}

#[async_trait]
impl Runner for ExecRunner {
    async fn commit(&self, change: &mut Change, req: &Request) -> anyhow::Result<String> {
        self.run(&change.file, req, Direction::Commit).await
    }

    async fn rollback(&self, change: &mut Change, req: &Request) -> anyhow::Result<String> {
        let artifact = resolve_rollback(&change.file).await?;

        self.run(&artifact, req, Direction::Rollback).await
    }

    fn default_extension(&self) -> &str {
        "sh"
    }

    fn artifact_mode(&self) -> u32 {
        0o755
    }
}

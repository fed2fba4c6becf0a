//! Runner that evaluates artifact bodies through an interactive shell
//! bound to the target connection, mongosh-style.
//!
//! The artifact body is wrapped in a session/transaction template before
//! it reaches the shell, so user code runs inside one transaction per
//! change without having to manage the session itself.

use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use delta_core::{Change, CoreError, Direction, Request, Runner};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{
    error::ShellError,
    exec::{render_output, resolve_rollback},
};

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Shell program, `mongosh` unless overridden.
    pub program: String,
    /// Connection string of the target database; must match the
    /// tracker's connection so the log and the data move together.
    pub uri: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            program: "mongosh".to_owned(),
            uri: "mongodb://localhost:27017".to_owned(),
        }
    }
}

/// Wraps a script body in the transactional evaluation template.
pub fn wrap(body: &str) -> String {
    format!(
        r#"const session = db.getMongo().startSession();
session.startTransaction();
try {{
{body}
  session.commitTransaction();
}} catch (error) {{
  session.abortTransaction();
  throw error;
}} finally {{
  session.endSession();
}}
"#
    )
}

#[derive(Debug, Clone, Default)]
pub struct EvalRunner {
    config: EvalConfig,
}

impl EvalRunner {
    pub fn new(uri: impl Into<String>) -> Self {
        Self::with_config(EvalConfig {
            uri: uri.into(),
            ..EvalConfig::default()
        })
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self { config }
    }

    async fn evaluate(
        &self,
        file: &Path,
        req: &Request,
        direction: Direction,
    ) -> anyhow::Result<String> {
        let body = tokio::fs::read_to_string(file).await?;

        if body.trim().is_empty() {
            return Err(CoreError::EmptyArtifact(file.to_path_buf()).into());
        }

        let script = wrap(&body);
        let program = req
            .param("program")
            .unwrap_or(&self.config.program)
            .to_owned();
        let uri = req.param("uri").unwrap_or(&self.config.uri).to_owned();

        let mut child = Command::new(&program)
            .arg(&uri)
            .arg("--quiet")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ShellError::Launch {
                program: program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;

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
            "artifact evaluated"
        );

        Ok(render_output(
            &output.stdout,
            &output.stderr,
            direction.message(),
        ))
    }
}

#[async_trait]
impl Runner for EvalRunner {
    async fn commit(&self, change: &mut Change, req: &Request) -> anyhow::Result<String> {
        self.evaluate(&change.file, req, Direction::Commit).await
    }

    async fn rollback(&self, change: &mut Change, req: &Request) -> anyhow::Result<String> {
        let artifact = resolve_rollback(&change.file).await?;

        self.evaluate(&artifact, req, Direction::Rollback).await
    }
}

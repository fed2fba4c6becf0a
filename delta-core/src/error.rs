use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not implemented")]
    NotImplemented,

    #[error("Only 'module' type changes are supported")]
    UnsupportedKind,

    #[error("unknown driver `{0}`")]
    UnknownDriver(String),

    #[error("empty migration artifact `{0}`")]
    EmptyArtifact(PathBuf),

    #[error("rollback artifact `{0}` does not exist")]
    RollbackArtifactMissing(PathBuf),

    #[error("std::io `{0}`")]
    Io(#[from] std::io::Error),

    #[error("regex `{0}`")]
    Regex(#[from] regex::Error),

    #[error("serde_json `{0}`")]
    SerdeJson(#[from] serde_json::Error),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

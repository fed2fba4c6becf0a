#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("sqlx_migrator `{0}`")]
    Migrator(#[from] sqlx_migrator::Error),

    #[error("chrono `{0}`")]
    Chrono(#[from] chrono::ParseError),

    #[error(transparent)]
    Core(#[from] delta_core::CoreError),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SqliteError>;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with status {code:?}: {detail}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        detail: String,
    },

    #[error("std::io `{0}`")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] delta_core::CoreError),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;

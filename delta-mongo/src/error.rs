#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("mongodb `{0}`")]
    Database(#[from] mongodb::error::Error),

    #[error("document field `{0}`")]
    ValueAccess(#[from] mongodb::bson::document::ValueAccessError),

    #[error(transparent)]
    Core(#[from] delta_core::CoreError),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MongoError>;

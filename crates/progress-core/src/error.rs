use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("invalid item id '{0}': use letters, digits, '.', '_' or '-' and start with a letter or digit")]
    InvalidItemId(String),

    #[error("invalid progress {0}: must be between 0 and 100")]
    InvalidPercentage(i64),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("item already exists: {0}")]
    ItemExists(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("sample store error: {0}")]
    Store(String),

    #[error("content store error: {0}")]
    Content(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ProgressError>;

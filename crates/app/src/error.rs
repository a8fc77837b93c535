use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Usage(#[from] usage_core::UsageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("env file error: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

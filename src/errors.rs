// errors.rs
use crate::config::ConfigError;
use crate::places::RegistryError;
use crate::scraper::ScraperError;
use crate::store::SnapshotError;
use astra::Response;
use thiserror::Error;

/// Errors raised while answering an HTTP request.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Snapshot Error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("Registry Error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Internal Server Error")]
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

/// Failures that end a run. Everything per-record or per-channel is absorbed earlier.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("could not build HTTP client: {0}")]
    Client(String),
    #[error("could not write report {path}: {source}")]
    Report {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("server error: {0}")]
    Server(String),
}

impl From<ScraperError> for AppError {
    fn from(e: ScraperError) -> Self {
        AppError::Client(e.to_string())
    }
}

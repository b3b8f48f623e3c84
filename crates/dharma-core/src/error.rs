use thiserror::Error;

pub use crate::catalog::CatalogError;
pub use crate::config::ConfigError;

/// Failures while saving or loading a trait store file.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error-tagged result of executing an action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

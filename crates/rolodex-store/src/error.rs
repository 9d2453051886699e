use rolodex_core::{ErrorKind, Failure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Error saving file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not determine a data directory")]
    NoDataDir,
}

impl StoreError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl Failure for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Io(_) | Self::Serialization(_) | Self::NoDataDir => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

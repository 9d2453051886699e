use rolodex_core::{ErrorKind, Failure};
use rolodex_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Forbidden(String),
}

impl ServiceError {
    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl Failure for ServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Forbidden(_) => ErrorKind::Forbidden,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#![forbid(unsafe_code)]

//! Error taxonomy shared by the library modules.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller passed something unusable (batch size below one, missing entity).
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("{kind} with ID \"{id}\" could not be found")]
    NotFound { kind: &'static str, id: String },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    #[error("lister failed: {0}")]
    Lister(String),
    #[error("download failed: {0}")]
    Download(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }
}

impl From<libsql::Error> for Error {
    fn from(err: libsql::Error) -> Self {
        Self::Store(err.into())
    }
}

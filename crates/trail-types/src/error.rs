use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown entity family: {0}")]
    UnknownFamily(String),

    #[error("unknown audit action: {0}")]
    UnknownAction(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

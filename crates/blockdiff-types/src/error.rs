use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid block id: {0:?}")]
    InvalidBlockId(String),

    #[error("invalid colour: {0:?}")]
    InvalidColour(String),

    #[error("unknown input kind: {0:?}")]
    UnknownInputKind(String),
}

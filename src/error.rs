use thiserror::Error;

use crate::quiz::SessionState;

/// Errors raised at the fallible edges of the core: catalog parsing, the
/// persistence collaborator, configuration and invalid session transitions.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid session transition: {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("question index {index} out of range (total {total})")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid store key: {0}")]
    InvalidKey(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

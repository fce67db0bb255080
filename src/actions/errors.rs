use thiserror::Error;

use crate::hasher::Error as HashingError;
use crate::vr::ValueError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Internal error: {}", .0.to_lowercase())]
    InternalError(String),

    #[error("Invalid input: {}", .0.to_lowercase())]
    InvalidInput(String),

    #[error("Value error: {0}")]
    ValueError(#[from] ValueError),
}

impl From<HashingError> for ActionError {
    fn from(err: HashingError) -> Self {
        ActionError::InternalError(format!("{err}"))
    }
}

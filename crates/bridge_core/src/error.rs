//! Invocation failures and how they are categorised for display.

use shared::{
    domain::ElementId,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The backend answered with an error.
    #[error("{}", .0.message)]
    Rejected(ApiError),
    /// The call never produced an answer.
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Transport,
    Unknown,
}

impl InvokeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Rejected(err) => match err.code {
                ErrorCode::Validation => ErrorCategory::Validation,
                ErrorCode::NotFound => ErrorCategory::NotFound,
                ErrorCode::Conflict => ErrorCategory::Conflict,
                ErrorCode::Forbidden => ErrorCategory::Forbidden,
                ErrorCode::Internal => ErrorCategory::Unknown,
            },
            Self::Transport(_) => ErrorCategory::Transport,
        }
    }

    /// Text written into the output node in place of a result.
    pub fn display_text(&self) -> String {
        format!("Error: {self}")
    }
}

impl From<ApiError> for InvokeError {
    fn from(value: ApiError) -> Self {
        Self::Rejected(value)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("element {0} not found in document")]
    MissingElement(ElementId),
}

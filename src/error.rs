use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid input for {method}: {source}")]
    InvalidInput {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("session lock failed")]
    LockPoisoned,

    #[error(transparent)]
    Swap(#[from] liquidex_sdk::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wallet-library error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MethodNotFound(_) => "id_method_not_found",
            Error::InvalidInput { .. } => "id_invalid_argument",
            Error::Swap(e) if e.is_precondition() => "id_invalid_argument",
            _ => "id_unknown",
        }
    }
}

/// Error document returned across the JSON boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
}

impl From<Error> for JsonError {
    fn from(e: Error) -> Self {
        JsonError {
            error: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

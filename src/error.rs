use std::io;

/// Errors surfaced to the caller. Failed structural tests are not errors; they
/// are ordinary pruning decisions inside the search.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("invalid argument '{token}': {reason}")]
    InvalidArgument { token: String, reason: String },

    #[error("{requested} vertices requested, at most {max} are supported")]
    TooManyVertices { requested: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed multicode at byte {offset}: {reason}")]
    Multicode { offset: usize, reason: String },

    #[error("planar embedding failed: {0}")]
    Embedding(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(token: &str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that stop the service from starting. Per-call failures never surface here; they are
/// answered on the wire (see [`crate::protocol::ErrorCode`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

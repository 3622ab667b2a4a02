pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unknown {kind} handle #{index}")]
    UnknownElement { kind: &'static str, index: usize },

    #[error("identifier already in use: {identifier}")]
    DuplicateIdentifier { identifier: String },

    #[error("invalid minimum size ({width}, {height}): both sides must be finite and non-negative")]
    InvalidMinimumSize { width: f64, height: f64 },
}

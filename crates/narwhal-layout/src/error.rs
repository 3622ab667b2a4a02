use narwhal_core::Algorithm;
use std::fmt;

/// Why a layout stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    DeadlineExpired,
    Cancelled,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interruption::DeadlineExpired => f.write_str("deadline expired"),
            Interruption::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("root node `{root}` does not set `{key}`")]
    MissingRootOption { root: String, key: &'static str },

    #[error("no layout engine registered for `{algorithm}`")]
    AlgorithmNotRegistered { algorithm: Algorithm },

    #[error("layout interrupted: {reason}")]
    Interrupted { reason: Interruption },

    #[error(transparent)]
    Engine(#[from] remora::Error),

    #[error(transparent)]
    Model(#[from] narwhal_core::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

use thiserror::Error;

/// Errors raised while restoring automation from a serialized node.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to parse automation state: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown automation state {0:?}")]
    UnknownState(String),
    #[error("automation node is missing {0}")]
    MissingField(&'static str),
    #[error("invalid automation event #{index}: {reason}")]
    InvalidEvent { index: usize, reason: &'static str },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    #[error("a sample-rate provider has already been installed")]
    ProviderAlreadySet,
}

use std::path::{Path, PathBuf};

pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("source unavailable: '{}': {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("empty sequence: no frames to encode")]
    EmptySequence,

    #[error(
        "dimension mismatch: frame {index} is {}x{}, expected {}x{}",
        found.0, found.1, expected.0, expected.1
    )]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("i/o error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn source_unavailable(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Source failures are the only errors the engine recovers from mid-run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

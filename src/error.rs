use std::path::PathBuf;

/// Errors raised at the crate's fallible edges (configuration and wave files).
///
/// The tick loop itself never fails; degenerate cases are clamped or ignored.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type SimResult<T> = Result<T, SimError>;

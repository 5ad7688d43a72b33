use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking store I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("no active run")]
    NoActiveRun,

    #[error("run {0} is still active")]
    RunAlreadyActive(String),

    #[error("invalid key {0:?}")]
    InvalidKey(String),
}

impl TrackingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrackingError::Io {
            path: path.into(),
            source,
        }
    }
}

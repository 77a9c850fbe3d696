use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoplayError {
    /// Persisted game state is present but is not valid JSON of the expected shape.
    #[error("malformed game state: {0}")]
    MalformedState(#[from] serde_json::Error),

    #[error("grid must be 4x4, found {rows} rows (row lengths {cols:?})")]
    GridShape { rows: usize, cols: Vec<usize> },

    #[error("state source failed: {0}")]
    StateSource(String),

    #[error("oracle failed: {0}")]
    Oracle(String),

    #[error("event host failed: {0}")]
    Host(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("driver cannot go from {from:?} to {to:?}")]
    Transition {
        from: crate::kernel::lifecycle::DriverState,
        to: crate::kernel::lifecycle::DriverState,
    },

    #[error("driver task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, AutoplayError>;

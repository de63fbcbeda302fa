use thiserror::Error;

/// Failures reported by an OCR backend. They never escape a submission: the
/// pipeline turns them into the job's failed state and message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The backend is not installed or cannot be loaded.
    #[error("{0}")]
    Unavailable(String),

    /// The backend ran but rejected the input.
    #[error("{0}")]
    Processing(String),

    /// The backend produced no usable document.
    #[error("{0}")]
    Output(String),

    #[error("OCR processing timed out after {secs} seconds")]
    TimedOut { secs: u64 },
}

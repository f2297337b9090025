use thiserror::Error;

/// Centralized error types for the application
///
/// All failures are converted to this enum for consistent handling. Uses
/// `thiserror` for automatic conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// External tool missing from the host
    #[error("Command not found: {0}")]
    ExecutableNotFound(String),

    /// External tool produced no output at all
    #[error("No output from {0}")]
    NoOutput(String),

    /// Tool output was not parseable as the expected structure
    #[error("Invalid output: {0}")]
    MalformedOutput(String),

    /// Structured output lacked usable format entries
    #[error("No formats found")]
    NoFormatsFound,

    /// External tool exited with a non-zero code
    #[error("Process exited with code {0}")]
    ProcessFailed(i32),

    /// Missing or invalid request input
    #[error("{0}")]
    InvalidRequest(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

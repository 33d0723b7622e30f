//! Error types for page style analysis

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while analyzing a page
#[derive(Error, Debug)]
pub enum Error {
    /// The request did not carry a usable URL
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to launch the browser
    #[error("Browser launch failed: {0}")]
    InitializationError(String),

    /// Failed to load a URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to execute JavaScript or decode its result
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Message safe to hand back to an HTTP client.
    ///
    /// Only `InvalidInput` echoes its detail; every other kind maps to a
    /// fixed sentence so browser internals never leak to callers.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidInput(reason) => reason.clone(),
            Error::InitializationError(_) => "Browser is unavailable".to_string(),
            Error::LoadError(_) => "Failed to load the requested page".to_string(),
            Error::ScriptError(_) => "Failed to extract styles from the page".to_string(),
            Error::Timeout(ms) => format!("Analysis timed out after {}ms", ms),
            _ => "Internal error".to_string(),
        }
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

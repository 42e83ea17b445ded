use std::path::PathBuf;
use thiserror::Error;

/// Error type that carries a process exit code
#[derive(Debug, Error)]
pub enum WebtrailError {
    /// Recorded log or capture file not found (exit code 2)
    #[error("Recorded file not found at {}", .0.display())]
    LogMissing(PathBuf),
    /// Persisted data could not be decoded (exit code 3)
    #[error("Malformed data in {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    /// Browser launch, navigation or command failure (exit code 4)
    #[error("Browser driver failed: {0}")]
    Driver(String),
    /// Invalid user input such as a curl line or selector (exit code 5)
    #[error("Parse error: {0}")]
    Parse(String),
    /// Filesystem failure (exit code 1)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WebtrailError>;

impl WebtrailError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            WebtrailError::LogMissing(_) => 2,
            WebtrailError::Serialization { .. } => 3,
            WebtrailError::Driver(_) => 4,
            WebtrailError::Parse(_) => 5,
            WebtrailError::Io(_) | WebtrailError::Other(_) => 1,
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        WebtrailError::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Recover a typed error from an `anyhow` chain built by the binary
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<WebtrailError>() {
            Ok(typed) => typed,
            Err(err) => {
                let msg = err.to_string();
                if msg.contains("Chrome") || msg.contains("browser") || msg.contains("CDP") {
                    WebtrailError::Driver(format!("{:#}", err))
                } else {
                    WebtrailError::Other(err)
                }
            }
        }
    }
}

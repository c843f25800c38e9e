//! Shared error type across pingprom crates.

use thiserror::Error;

/// Stable error codes used in logs and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid configuration or arguments.
    Config,
    /// Unsupported config file version.
    UnsupportedVersion,
    /// A target could not be prepared for probing.
    Setup,
    /// The exposition listener could not be started.
    Listener,
    /// Snapshot rendering failed.
    Render,
    /// Anything else.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Setup => "SETUP",
            ErrorCode::Listener => "LISTENER",
            ErrorCode::Render => "RENDER",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PingPromError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum PingPromError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("probe setup failed for {target}: {reason}")]
    Setup { target: String, reason: String },
    #[error("listener on {addr} failed: {source}")]
    Listener {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("render failed")]
    Render(#[from] std::fmt::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl PingPromError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PingPromError::Config(_) => ErrorCode::Config,
            PingPromError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            PingPromError::Setup { .. } => ErrorCode::Setup,
            PingPromError::Listener { .. } => ErrorCode::Listener,
            PingPromError::Render(_) => ErrorCode::Render,
            PingPromError::Internal(_) => ErrorCode::Internal,
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timed out waiting for memory at address {address:#x}")]
    Timeout { address: u64 },

    #[error("Formula parse error at position {position}: {message}")]
    FormulaParse { position: usize, message: String },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("No game detected")]
    NoGameDetected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error came from the transport layer (socket or timeout).
    ///
    /// Transport errors are always recoverable: loops log them and move on.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

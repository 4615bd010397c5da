//! Error types for pgrest.

use thiserror::Error;

/// The main error type for pgrest operations.
#[derive(Debug, Error)]
pub enum PostgrestError {
    /// A builder chain reached `build` without a mandatory field.
    #[error("Missing mandatory field: {0}")]
    MissingField(&'static str),

    /// The base URI could not be parsed.
    #[error("Invalid base URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// The request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The network exchange failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PostgrestError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<reqwest::Error> for PostgrestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type alias for pgrest operations.
pub type PostgrestResult<T> = Result<T, PostgrestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostgrestError::MissingField("path");
        assert_eq!(err.to_string(), "Missing mandatory field: path");
    }

    #[test]
    fn test_config_error() {
        let err = PostgrestError::config("base_url is required");
        assert_eq!(err.to_string(), "Configuration error: base_url is required");
    }
}

//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Flushing the previous output failed before it could be replaced
    #[error("Flush failed: {message}")]
    FlushError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Level string that does not name a level
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a flush error wrapping the underlying IO failure
    pub fn flush(message: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::FlushError {
            message: message.into(),
            source,
        }
    }

    /// Create an invalid level error
    pub fn invalid_level(level: impl Into<String>) -> Self {
        LoggerError::InvalidLevel(level.into())
    }
}

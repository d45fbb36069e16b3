use thiserror::Error;

/// Errors raised outside the fail-open conversation transforms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// Pipeline configuration is invalid (bad env value, zero ratio, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Stored conversation could not be parsed or encoded
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Provider id does not map to a known conversation dialect
    #[error("Unknown conversation dialect: {0}")]
    UnknownDialect(String),

    /// Tracing subscriber could not be installed
    #[error("Telemetry initialization error: {0}")]
    TelemetryInit(String),
}

/// Result type for siumai-conversation operations
pub type Result<T> = std::result::Result<T, ConversationError>;

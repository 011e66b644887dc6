//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
///
/// Every variant is recoverable: a bad frame is logged and dropped by the
/// caller, it never tears down the session.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Input was not a valid JSON transport frame.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A `message` frame arrived without a `text` field.
    #[error("message frame without text")]
    MissingText,

    /// A required identifier was empty.
    #[error("empty field: {field}")]
    EmptyField {
        /// Name of the empty field.
        field: &'static str,
    },
}

impl ProtocolError {
    /// Short machine-readable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::MissingText => "missing_text",
            Self::EmptyField { .. } => "empty_field",
        }
    }
}

//! Error types for rig sessions

use civ_protocol::ParseError;
use thiserror::Error;

/// Errors a rig operation can end with
#[derive(Debug, Error)]
pub enum RigError {
    /// No reply within the window, after all attempts
    #[error("timeout waiting for reply")]
    Timeout,

    /// The bus reported a collision on every attempt
    #[error("bus busy (collision)")]
    BusBusy,

    /// The radio answered NAK or an unexpected acknowledgement byte
    #[error("command rejected by radio (0x{code:02X})")]
    Rejected {
        /// Acknowledgement byte received
        code: u8,
    },

    /// Reply was malformed or from/to an unexpected party
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Value outside what the radio supports
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No mapping for this radio at all
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Transport failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RigError {
    /// Only timeouts and collisions are worth repeating unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, RigError::Timeout | RigError::BusBusy)
    }
}

impl From<ParseError> for RigError {
    fn from(e: ParseError) -> Self {
        RigError::Protocol(e.to_string())
    }
}

/// Result alias for rig operations
pub type Result<T> = std::result::Result<T, RigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(RigError::Timeout.is_retryable());
        assert!(RigError::BusBusy.is_retryable());
        assert!(!RigError::Rejected { code: 0xFA }.is_retryable());
        assert!(!RigError::Protocol("bad".into()).is_retryable());
    }

    #[test]
    fn test_parse_error_is_protocol() {
        let err: RigError = ParseError::InvalidBcd(0xFF).into();
        assert!(matches!(err, RigError::Protocol(_)));
    }
}

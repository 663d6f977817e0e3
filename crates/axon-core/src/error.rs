//! Error types for the axon mesh

use thiserror::Error;

/// Top-level error type for axon
#[derive(Debug, Error)]
pub enum AxonError {
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors related to node identifiers
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identity format: {0}")]
    InvalidFormat(String),

    #[error("Invalid identity length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors related to encoding and decoding wire messages
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Insufficient data: needed {needed}, available {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// Errors raised by the socket collaborator
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Socket closed")]
    SocketClosed,

    #[error("Transmit failed: {0}")]
    TransmitFailed(String),
}

/// Errors raised by the identity storage collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Corrupt identity record: {0}")]
    Corrupt(String),
}

/// Result type alias for axon operations
pub type AxonResult<T> = Result<T, AxonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_display() {
        let err = IdentityError::InvalidFormat("zz".to_string());
        assert!(format!("{}", err).contains("Invalid identity format"));

        let err = IdentityError::InvalidLength {
            expected: 16,
            actual: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("16"));
        assert!(msg.contains("3"));
    }

    #[test]
    fn test_wire_error_display() {
        let err = WireError::MessageTooLarge { size: 10, max: 4 };
        let msg = format!("{}", err);
        assert!(msg.contains("10"));
        assert!(msg.contains("4"));
    }

    #[test]
    fn test_error_conversions() {
        let err: AxonError = IdentityError::InvalidFormat("x".to_string()).into();
        assert!(matches!(err, AxonError::Identity(_)));

        let err: AxonError = TransportError::SocketClosed.into();
        assert!(matches!(err, AxonError::Transport(_)));

        let err: AxonError = StorageError::Corrupt("short".to_string()).into();
        assert!(format!("{}", err).contains("Storage error"));
    }
}

//! Error types for the node coordinator

use std::path::PathBuf;

use axon_core::{Iden, SockId, StorageError, TransportError, WireError};
use thiserror::Error;

/// Configuration errors; all are fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The working directory does not exist
    #[error("No such directory: {}", .0.display())]
    NoSuchDir(PathBuf),

    /// Link url with an unsupported scheme
    #[error("Unsupported link protocol: {0}")]
    NoSuchProto(String),

    /// Link url that cannot be parsed
    #[error("Bad link url {url}: {reason}")]
    BadUrl { url: String, reason: String },

    /// Option with a value of the wrong shape
    #[error("Bad value for option {name}: {value}")]
    BadOption { name: String, value: String },

    /// Config file is not valid TOML for a node
    #[error("Config parse error: {0}")]
    Parse(String),

    /// Config file could not be read
    #[error("Config IO error: {0}")]
    Io(String),
}

/// Failures while handling one inbound message
///
/// These never leave the router: they are logged and the message dropped.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Body does not decode as its declared kind
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// Local payload is not a valid operation request
    #[error("Bad payload: {0}")]
    Payload(String),

    /// Socket send or session delivery failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Socket already bound to a different role or peer
    #[error("Socket {sock} already bound, refusing {claimed}")]
    Rebind { sock: SockId, claimed: Iden },

    /// Peer claimed the local node's own iden
    #[error("Peer claims local iden {0}")]
    SelfLink(Iden),

    /// Socket was never registered with the node
    #[error("Unknown socket {0}")]
    UnknownSocket(SockId),
}

/// Errors that can occur in the node coordinator
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Identity storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Router error surfaced to a direct caller
    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    /// No tokio runtime to run the worker pool on
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<WireError> for NodeError {
    fn from(e: WireError) -> Self {
        NodeError::Router(RouterError::Wire(e))
    }
}

impl From<TransportError> for NodeError {
    fn from(e: TransportError) -> Self {
        NodeError::Router(RouterError::Transport(e))
    }
}

/// Result type alias for node operations
pub type NodeResult<T> = Result<T, NodeError>;

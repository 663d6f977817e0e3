//! Operation failures and their structured description

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A structured failure description carried by a task result
///
/// `err` names the kind of failure so callers can match on it without
/// parsing `mesg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub err: String,
    pub mesg: String,
    #[serde(default)]
    pub attrs: Map<String, Value>,
}

impl ErrorInfo {
    pub fn new(err: impl Into<String>, mesg: impl Into<String>) -> Self {
        Self {
            err: err.into(),
            mesg: mesg.into(),
            attrs: Map::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Describe a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let mesg = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("unknown panic");
        Self::new("Panic", mesg)
    }
}

/// Errors raised by an operation handler or by the registry itself
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    #[error("no such operation: {0}")]
    NoSuchOperation(String),

    #[error("bad arguments: {0}")]
    BadArgs(String),

    /// A handler-defined failure kind
    #[error("{kind}: {mesg}")]
    Failed {
        kind: String,
        mesg: String,
        attrs: Map<String, Value>,
    },
}

impl OperationError {
    /// A handler failure of the given kind
    pub fn failed(kind: impl Into<String>, mesg: impl Into<String>) -> Self {
        Self::Failed {
            kind: kind.into(),
            mesg: mesg.into(),
            attrs: Map::new(),
        }
    }

    /// The kind name reported in [`ErrorInfo::err`]
    pub fn kind(&self) -> &str {
        match self {
            Self::NoSuchOperation(_) => "NoSuchOperation",
            Self::BadArgs(_) => "BadArgs",
            Self::Failed { kind, .. } => kind,
        }
    }
}

impl From<&OperationError> for ErrorInfo {
    fn from(error: &OperationError) -> Self {
        match error {
            OperationError::NoSuchOperation(name) => {
                ErrorInfo::new(error.kind(), error.to_string()).with_attr("name", name.as_str())
            }
            OperationError::BadArgs(mesg) => ErrorInfo::new(error.kind(), mesg.as_str()),
            OperationError::Failed { kind, mesg, attrs } => ErrorInfo {
                err: kind.clone(),
                mesg: mesg.clone(),
                attrs: attrs.clone(),
            },
        }
    }
}

impl From<OperationError> for ErrorInfo {
    fn from(error: OperationError) -> Self {
        ErrorInfo::from(&error)
    }
}

/// Result type for operation handlers
pub type OperationResult<T> = Result<T, OperationError>;

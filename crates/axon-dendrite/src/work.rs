//! Work descriptors: an operation name plus its arguments

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OperationError, OperationResult};

/// A request to run one named operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Work {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    pub fn with_args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Positional argument `index`, or `BadArgs`
    pub fn arg(&self, index: usize) -> OperationResult<&Value> {
        self.args
            .get(index)
            .ok_or_else(|| OperationError::BadArgs(format!("missing argument {index}")))
    }

    /// Positional argument `index` as an integer, or `BadArgs`
    pub fn arg_i64(&self, index: usize) -> OperationResult<i64> {
        self.arg(index)?
            .as_i64()
            .ok_or_else(|| OperationError::BadArgs(format!("argument {index} is not an integer")))
    }

    pub fn kwarg(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }

    /// Encode as JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from JSON bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

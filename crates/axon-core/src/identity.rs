//! Node identifiers
//!
//! Every mesh participant is named by an [`Iden`], a 128-bit random value.
//! Idens are immutable, cheap to copy, and print as 32 lowercase hex digits.

use std::fmt::{Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Length of an iden in bytes
pub const IDEN_LEN: usize = 16;

/// Globally unique node identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Iden([u8; IDEN_LEN]);

impl Iden {
    /// Create an iden from raw bytes
    pub const fn new(bytes: [u8; IDEN_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random iden
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; IDEN_LEN] {
        &self.0
    }

    /// Create an iden from a byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let arr: [u8; IDEN_LEN] =
            bytes
                .try_into()
                .map_err(|_| IdentityError::InvalidLength {
                    expected: IDEN_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    /// Short display form for logging (first 8 hex digits)
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl Display for Iden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Iden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Iden({})", self.short_id())
    }
}

impl FromStr for Iden {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| IdentityError::InvalidFormat(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

//! Collaborator traits
//!
//! The mesh core does not own sockets, threads, or durable storage. It talks
//! to those collaborators through the traits in this module:
//!
//! - [`LinkSocket`]: a per-peer socket handle the core can transmit on
//! - [`Session`]: a locally attached client session
//! - [`WorkerPool`]: executes message handlers off the I/O thread
//! - [`IdentityStore`]: supplies the durable local iden

use async_trait::async_trait;

use crate::error::{StorageError, TransportError};
use crate::identity::Iden;
use crate::message::{Envelope, XmitMesg};

/// Transport-assigned socket identifier
pub type SockId = u64;

/// A socket handle supplied by the transport layer
///
/// Transmission is fire-and-forget from the core's point of view: an error
/// means the frame was not handed to the socket, never that it was not
/// received.
pub trait LinkSocket: Send + Sync {
    /// Stable identifier of this socket
    fn id(&self) -> SockId;

    /// Queue an envelope for transmission
    fn transmit(&self, envelope: &Envelope) -> Result<(), TransportError>;
}

/// A client session attached to this node
pub trait Session: Send + Sync {
    /// The session identifier payloads are addressed to
    fn iden(&self) -> Iden;

    /// Hand a locally delivered payload to the session
    fn deliver(&self, mesg: &XmitMesg) -> Result<(), TransportError>;
}

/// A unit of work for a [`WorkerPool`]
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Executes jobs away from the caller's thread
///
/// No ordering is promised between jobs, even jobs submitted back to back
/// from the same socket.
pub trait WorkerPool: Send + Sync {
    fn execute(&self, job: Job);
}

/// Supplies the node's durable identity
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Load the stored iden, creating and persisting one on first use
    async fn load_or_create(&self) -> Result<Iden, StorageError>;
}

//! # Axon Core
//!
//! Core types, traits, and errors for the axon peer mesh.
//!
//! ## Key Types
//!
//! - [`Iden`]: 128-bit node identifier
//! - [`NodeRecord`]: authored description of a node and its outbound links
//! - [`Link`] / [`LinkKey`]: directed edges between nodes
//! - [`Route`]: a chain of links from the local node to a target
//! - [`Envelope`]: a `(kind, body)` message as carried by the transport
//! - [`FrameBuffer`]: reassembles length-prefixed envelopes from a byte stream
//!
//! ## Key Traits
//!
//! - [`LinkSocket`]: per-peer socket handle supplied by the transport
//! - [`Session`]: locally attached client session
//! - [`WorkerPool`]: executes message handlers off the I/O path
//! - [`IdentityStore`]: supplies the durable local iden

pub mod error;
pub mod frame;
pub mod identity;
pub mod message;
pub mod mock_socket;
pub mod record;
pub mod routing;
pub mod traits;

// Re-export main types
pub use error::*;
pub use frame::*;
pub use identity::*;
pub use message::*;
pub use mock_socket::*;
pub use record::*;
pub use routing::*;
pub use traits::*;

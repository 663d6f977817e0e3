//! Events published by a running node

use axon_core::{DropReason, Iden, SockId};
use axon_dendrite::TaskResult;

/// Something the node did with a message
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A socket completed the link handshake
    Linked { sock: SockId, iden: Iden },
    /// A newer node record was accepted
    RecordApplied { iden: Iden, tick: u64 },
    /// A payload was handed to the next hop
    Forwarded { dest: Iden, next: Iden, ttl: u32 },
    /// A payload was handed to a local session
    Delivered { sess: Iden, orig: Option<Iden> },
    /// A payload ran as a local operation
    Executed {
        name: String,
        orig: Option<Iden>,
        result: TaskResult,
    },
    /// A message was dropped
    Dropped { kind: String, reason: DropReason },
}

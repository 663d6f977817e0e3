//! Routes and routing outcomes

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::identity::Iden;
use crate::record::Link;

/// An ordered chain of links from the local node to a target
///
/// For a route `(l1 .. ln)`: `l1.src` is the local node, each link's `dst`
/// is the next link's `src`, and `ln.dst` is the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    links: Vec<Link>,
}

impl Route {
    /// Create a route from a chain of links
    ///
    /// Returns `None` if the chain is empty or not contiguous.
    pub fn new(links: Vec<Link>) -> Option<Self> {
        if links.is_empty() {
            return None;
        }
        let contiguous = links.windows(2).all(|pair| pair[0].dst() == pair[1].src());
        contiguous.then_some(Self { links })
    }

    /// A single-hop route
    pub fn direct(link: Link) -> Self {
        Self { links: vec![link] }
    }

    /// A new route with `link` appended, if it continues from the tail
    pub fn extended(&self, link: Link) -> Option<Self> {
        if link.src() != self.target() {
            return None;
        }
        let mut links = self.links.clone();
        links.push(link);
        Some(Self { links })
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Origin of the route
    pub fn source(&self) -> Iden {
        self.links[0].src()
    }

    /// Final destination of the route
    pub fn target(&self) -> Iden {
        self.links[self.links.len() - 1].dst()
    }

    /// The neighbor a message should be handed to first
    pub fn next_hop(&self) -> Iden {
        self.links[0].dst()
    }

    pub fn hop_count(&self) -> usize {
        self.links.len()
    }

    /// The nodes visited after the source, in order
    pub fn hops(&self) -> Vec<Iden> {
        self.links.iter().map(Link::dst).collect()
    }
}

/// Why a message was dropped instead of delivered or forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// Hop budget exhausted
    TtlExpired,
    /// No route to the destination
    NoRoute,
    /// A route exists but the next hop has no socket
    NoSocket,
    /// Addressed to a session this node does not hold
    NoSession,
    /// Sent on a socket that is neither a link nor a session
    Unbound,
    /// Message kind this node does not understand
    UnknownKind,
    /// Body could not be decoded
    Malformed,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::TtlExpired => "ttl expired",
            Self::NoRoute => "no route",
            Self::NoSocket => "no socket for next hop",
            Self::NoSession => "no such session",
            Self::Unbound => "unbound socket",
            Self::UnknownKind => "unknown message kind",
            Self::Malformed => "malformed message",
        };
        f.write_str(text)
    }
}

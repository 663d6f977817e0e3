//! Socket table
//!
//! Tracks every socket the transport has handed the node and the role it
//! has been bound to. A socket starts [`SocketRole::Unbound`] and is bound
//! at most once: to a peer node by the link handshake, or to a local
//! session by the node's owner.

use std::sync::Arc;

use axon_core::{Iden, LinkSocket, SockId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::RouterError;

/// What a socket is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketRole {
    /// Not yet identified; payloads from it are refused
    Unbound,
    /// Link to a peer node
    Link(Iden),
    /// A locally attached client session
    Session { sess: Iden, user: Option<String> },
}

struct SocketEntry {
    sock: Arc<dyn LinkSocket>,
    role: SocketRole,
}

/// Sockets by id, with an index of link sockets by peer
#[derive(Default)]
pub struct SocketTable {
    socks: DashMap<SockId, SocketEntry>,
    links: DashMap<Iden, SockId>,
}

impl SocketTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `sock` as unbound unless it is already known
    pub fn register(&self, sock: &Arc<dyn LinkSocket>) {
        self.socks.entry(sock.id()).or_insert_with(|| SocketEntry {
            sock: Arc::clone(sock),
            role: SocketRole::Unbound,
        });
    }

    /// The role of a socket; unknown sockets are unbound
    pub fn role(&self, id: SockId) -> SocketRole {
        self.socks
            .get(&id)
            .map(|entry| entry.role.clone())
            .unwrap_or(SocketRole::Unbound)
    }

    /// Bind a socket as the link to peer `iden`
    ///
    /// Returns `Ok(true)` when newly bound, `Ok(false)` when it was already
    /// bound to the same peer.
    pub fn bind_link(&self, id: SockId, iden: Iden) -> Result<bool, RouterError> {
        let mut entry = self.socks.get_mut(&id).ok_or(RouterError::UnknownSocket(id))?;
        match &entry.role {
            SocketRole::Link(bound) if *bound == iden => return Ok(false),
            SocketRole::Unbound => {}
            _ => return Err(RouterError::Rebind { sock: id, claimed: iden }),
        }
        entry.role = SocketRole::Link(iden);
        drop(entry);

        // A newer socket for the same peer takes over
        if let Some(previous) = self.links.insert(iden, id) {
            debug!(peer = %iden.short_id(), previous, sock = id, "Replaced link socket");
        }
        Ok(true)
    }

    /// Bind a socket to a local session
    pub fn bind_session(
        &self,
        id: SockId,
        sess: Iden,
        user: Option<String>,
    ) -> Result<(), RouterError> {
        let mut entry = self.socks.get_mut(&id).ok_or(RouterError::UnknownSocket(id))?;
        match &entry.role {
            SocketRole::Unbound => {}
            SocketRole::Session { sess: bound, .. } if *bound == sess => return Ok(()),
            _ => return Err(RouterError::Rebind { sock: id, claimed: sess }),
        }
        entry.role = SocketRole::Session { sess, user };
        Ok(())
    }

    /// The socket linking to peer `iden`
    pub fn link_sock(&self, iden: &Iden) -> Option<Arc<dyn LinkSocket>> {
        let id = *self.links.get(iden)?;
        self.socks.get(&id).map(|entry| Arc::clone(&entry.sock))
    }

    /// Whether any socket is still bound to session `sess`
    pub fn session_bound(&self, sess: &Iden) -> bool {
        self.socks.iter().any(|entry| {
            matches!(&entry.role, SocketRole::Session { sess: bound, .. } if bound == sess)
        })
    }

    /// Every bound link socket with its peer
    pub fn link_socks(&self) -> Vec<(Iden, Arc<dyn LinkSocket>)> {
        self.links
            .iter()
            .filter_map(|link| {
                let sock = self.socks.get(link.value())?;
                Some((*link.key(), Arc::clone(&sock.sock)))
            })
            .collect()
    }

    /// Forget a socket; returns the role it had
    pub fn remove(&self, id: SockId) -> Option<SocketRole> {
        let (_, entry) = self.socks.remove(&id)?;
        if let SocketRole::Link(iden) = &entry.role {
            // Only drop the index if it still points at this socket
            if let Entry::Occupied(link) = self.links.entry(*iden) {
                if *link.get() == id {
                    link.remove();
                }
            }
        }
        Some(entry.role)
    }

    pub fn len(&self) -> usize {
        self.socks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.socks.is_empty()
    }
}

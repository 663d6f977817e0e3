//! Inbound message routing
//!
//! [`MessageRouter::dispatch`] handles one `(kind, body)` envelope from one
//! socket. Kinds map to handlers through a fixed match on [`MessageKind`];
//! unknown kinds are dropped. Handler failures are logged and swallowed so a
//! bad message never takes the socket or the node down.
//!
//! `xmit` handling:
//!
//! 1. Consume one hop of TTL; a message with no budget left is dropped.
//! 2. Refuse payloads from unbound sockets. Payloads from a session socket
//!    are stamped with the local iden as `orig` and the session's `user`.
//! 3. Deliver locally when addressed to this node, otherwise forward
//!    unchanged to the socket of the next hop.

use std::sync::Arc;

use axon_core::{
    DropReason, Envelope, Iden, Link, LinkInfo, LinkMesg, LinkSocket, MessageKind, NodeMesg,
    XmitMesg,
};
use axon_dendrite::{Dendrite, Task, Work};
use axon_routing::LinkGraph;
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace, warn};

use crate::error::RouterError;
use crate::event::NodeEvent;
use crate::session::SessionTable;
use crate::sockets::{SocketRole, SocketTable};

/// Dispatches inbound envelopes for one node
pub struct MessageRouter {
    graph: Arc<LinkGraph>,
    sockets: Arc<SocketTable>,
    sessions: Arc<SessionTable>,
    dendrite: Arc<Dendrite>,
    events: broadcast::Sender<NodeEvent>,
}

impl MessageRouter {
    pub fn new(
        graph: Arc<LinkGraph>,
        sockets: Arc<SocketTable>,
        sessions: Arc<SessionTable>,
        dendrite: Arc<Dendrite>,
        events: broadcast::Sender<NodeEvent>,
    ) -> Self {
        Self {
            graph,
            sockets,
            sessions,
            dendrite,
            events,
        }
    }

    pub fn local_iden(&self) -> Iden {
        self.graph.local_iden()
    }

    /// Handle one envelope received on `sock`
    #[instrument(skip_all, fields(kind = %envelope.kind, sock = sock.id()))]
    pub fn dispatch(&self, sock: &Arc<dyn LinkSocket>, envelope: &Envelope) {
        let Some(kind) = envelope.message_kind() else {
            debug!("Dropping message of unknown kind");
            self.dropped(&envelope.kind, DropReason::UnknownKind);
            return;
        };

        let result = match kind {
            MessageKind::Link => self.hand_link(sock, envelope),
            MessageKind::Xmit => self.hand_xmit(sock, envelope),
            MessageKind::Node => self.hand_node(envelope),
        };

        if let Err(e) = result {
            warn!(error = %e, "Message handler failed");
            if let RouterError::Wire(_) | RouterError::Payload(_) = e {
                self.dropped(&envelope.kind, DropReason::Malformed);
            }
        }
    }

    /// A peer announces itself on `sock`
    fn hand_link(&self, sock: &Arc<dyn LinkSocket>, envelope: &Envelope) -> Result<(), RouterError> {
        let LinkMesg { iden } = envelope.open()?;
        let local = self.local_iden();
        if iden == local {
            return Err(RouterError::SelfLink(iden));
        }

        // Bound under the graph lock so a concurrent close of an older
        // socket to the same peer sees this one
        let bound = self.graph.batch(|graph| {
            if !self.sockets.bind_link(sock.id(), iden)? {
                return Ok::<_, RouterError>(false);
            }
            graph.add_link(Link::new(local, iden, LinkInfo::new()));
            graph.refresh_local_record();
            Ok(true)
        })?;
        if !bound {
            trace!(peer = %iden.short_id(), "Socket already linked");
            return Ok(());
        }

        sock.transmit(&Envelope::wrap(&LinkMesg { iden: local })?)?;

        debug!(peer = %iden.short_id(), "Linked");
        self.emit(NodeEvent::Linked {
            sock: sock.id(),
            iden,
        });
        Ok(())
    }

    /// A node record announcement
    fn hand_node(&self, envelope: &Envelope) -> Result<(), RouterError> {
        let NodeMesg { record } = envelope.open()?;
        if record.iden == self.local_iden() {
            trace!("Ignoring record claiming the local iden");
            return Ok(());
        }

        let (iden, tick) = (record.iden, record.tick);
        if self.graph.set_node_record(record) {
            self.emit(NodeEvent::RecordApplied { iden, tick });
        }
        Ok(())
    }

    /// A payload to route
    fn hand_xmit(&self, sock: &Arc<dyn LinkSocket>, envelope: &Envelope) -> Result<(), RouterError> {
        let mut mesg: XmitMesg = envelope.open()?;

        if !mesg.decrement_ttl() {
            debug!(dest = %mesg.dest.short_id(), "TTL exhausted");
            self.dropped(MessageKind::Xmit.as_str(), DropReason::TtlExpired);
            return Ok(());
        }

        match self.sockets.role(sock.id()) {
            SocketRole::Link(_) => {}
            SocketRole::Session { user, .. } => {
                mesg.orig = Some(self.local_iden());
                mesg.user = user;
            }
            SocketRole::Unbound => {
                debug!("Refusing payload from unbound socket");
                self.dropped(MessageKind::Xmit.as_str(), DropReason::Unbound);
                return Ok(());
            }
        }

        self.route(mesg)
    }

    /// Deliver `mesg` locally or forward it toward its destination
    pub fn route(&self, mesg: XmitMesg) -> Result<(), RouterError> {
        if mesg.dest == self.local_iden() {
            return self.deliver_local(mesg);
        }

        let Some(next) = self.graph.next_hop(&mesg.dest) else {
            debug!(dest = %mesg.dest.short_id(), "No route");
            self.dropped(MessageKind::Xmit.as_str(), DropReason::NoRoute);
            return Ok(());
        };

        let Some(link) = self.sockets.link_sock(&next) else {
            debug!(dest = %mesg.dest.short_id(), next = %next.short_id(), "No socket for next hop");
            self.dropped(MessageKind::Xmit.as_str(), DropReason::NoSocket);
            return Ok(());
        };

        link.transmit(&Envelope::wrap(&mesg)?)?;
        trace!(
            dest = %mesg.dest.short_id(),
            next = %next.short_id(),
            ttl = mesg.ttl,
            "Forwarded"
        );
        self.emit(NodeEvent::Forwarded {
            dest: mesg.dest,
            next,
            ttl: mesg.ttl,
        });
        Ok(())
    }

    fn deliver_local(&self, mesg: XmitMesg) -> Result<(), RouterError> {
        if let Some(sess) = mesg.sess {
            let Some(session) = self.sessions.get(&sess) else {
                debug!(sess = %sess.short_id(), "No such session");
                self.dropped(MessageKind::Xmit.as_str(), DropReason::NoSession);
                return Ok(());
            };

            session.deliver(&mesg)?;
            self.emit(NodeEvent::Delivered {
                sess,
                orig: mesg.orig,
            });
            return Ok(());
        }

        let work = Work::from_bytes(&mesg.data).map_err(|e| RouterError::Payload(e.to_string()))?;
        let task = Task::new();
        self.dendrite.exec(&task, &work);

        if let Some(result) = task.result() {
            debug!(op = %work.name, ok = result.is_ok(), "Executed local operation");
            self.emit(NodeEvent::Executed {
                name: work.name,
                orig: mesg.orig,
                result,
            });
        }
        Ok(())
    }

    fn dropped(&self, kind: &str, reason: DropReason) {
        self.emit(NodeEvent::Dropped {
            kind: kind.to_string(),
            reason,
        });
    }

    fn emit(&self, event: NodeEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

//! # Axon Node
//!
//! Mesh node coordinator for the axon peer mesh.
//!
//! This crate provides [`MeshNode`], which ties together:
//! - The link graph and its route cache ([`axon_routing::LinkGraph`])
//! - Message routing for `link`, `xmit`, and `node` messages
//! - The node's embedded operation registry ([`axon_dendrite::Dendrite`])
//! - Durable identity via [`Keystore`]
//!
//! The transport is not owned here. It hands the node each socket and each
//! received envelope; the node answers through [`axon_core::LinkSocket`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use axon_node::{MeshNode, NodeConfig};
//!
//! let config = NodeConfig::with_dir("./my-node").with_link("tcp://peer.example:4040");
//! let node = MeshNode::new(config).await?;
//!
//! // Transport callbacks
//! node.link_sock(sock.clone())?;
//! node.on_sock_mesg(sock.clone(), envelope);
//!
//! let mut events = node.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

mod config;
mod error;
mod keystore;
pub mod event;
pub mod pool;
pub mod router;
pub mod session;
pub mod sockets;

pub use config::{
    DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_TTL, FifoConfig, LinkEntry, LinkProto, LinkTarget,
    NodeConfig, Opts,
};
pub use error::{ConfigError, NodeError, NodeResult, RouterError};
pub use event::NodeEvent;
pub use keystore::Keystore;
pub use pool::{InlinePool, TokioPool};
pub use router::MessageRouter;
pub use session::SessionTable;
pub use sockets::{SocketRole, SocketTable};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use axon_core::{
    ATTR_HOST, Envelope, Iden, IdentityStore, LinkKey, LinkMesg, LinkSocket, NodeMesg, NodeRecord,
    Session, SockId, WorkerPool, XmitMesg, now_tick,
};
use axon_dendrite::{Dendrite, ErrorInfo};
use axon_logging::NodeContextGuard;
use axon_routing::LinkGraph;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// A mesh node
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct MeshNode {
    config: NodeConfig,
    iden: Iden,
    /// Distinguishes this run of the node in logs
    instance_id: Uuid,
    graph: Arc<LinkGraph>,
    sockets: Arc<SocketTable>,
    sessions: Arc<SessionTable>,
    dendrite: Arc<Dendrite>,
    router: Arc<MessageRouter>,
    pool: Arc<dyn WorkerPool>,
    events: broadcast::Sender<NodeEvent>,
}

impl MeshNode {
    /// Create a node that handles messages on the current tokio runtime
    #[instrument(skip(config), fields(dir = %config.dir.display()))]
    pub async fn new(config: NodeConfig) -> NodeResult<Self> {
        let pool = TokioPool::current()?;
        Self::with_pool(config, Arc::new(pool)).await
    }

    /// Create a node that hands message handling to `pool`
    pub async fn with_pool(config: NodeConfig, pool: Arc<dyn WorkerPool>) -> NodeResult<Self> {
        config.validate()?;

        let fifo_dir = config.fifo_dir();
        create_private_dir(&fifo_dir).await?;

        let iden = Keystore::new(&config.dir).load_or_create().await?;

        let mut record = NodeRecord::new(iden, now_tick());
        if let Ok(host) = std::env::var("HOSTNAME") {
            record = record.with_attr(ATTR_HOST, host);
        }

        let graph = Arc::new(LinkGraph::new(record));
        let sockets = Arc::new(SocketTable::new());
        let sessions = Arc::new(SessionTable::new());
        let dendrite = Arc::new(Dendrite::new());
        let (events, _) = broadcast::channel(config.event_channel_capacity);

        let router = Arc::new(MessageRouter::new(
            Arc::clone(&graph),
            Arc::clone(&sockets),
            Arc::clone(&sessions),
            Arc::clone(&dendrite),
            events.clone(),
        ));

        info!(
            iden = %iden.short_id(),
            dir = %config.dir.display(),
            fifo = %fifo_dir.display(),
            links = config.links.len(),
            "Node created"
        );

        Ok(Self {
            config,
            iden,
            instance_id: Uuid::new_v4(),
            graph,
            sockets,
            sessions,
            dendrite,
            router,
            pool,
            events,
        })
    }

    pub fn iden(&self) -> Iden {
        self.iden
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<LinkGraph> {
        &self.graph
    }

    /// The node's operation registry
    pub fn dendrite(&self) -> &Arc<Dendrite> {
        &self.dendrite
    }

    pub fn sockets(&self) -> &Arc<SocketTable> {
        &self.sockets
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    /// Subscribe to node events
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    /// Transport callback: an envelope arrived on `sock`
    ///
    /// Returns immediately. Handling runs on the worker pool, so two
    /// envelopes from the same socket may be handled in either order.
    pub fn on_sock_mesg(&self, sock: Arc<dyn LinkSocket>, envelope: Envelope) {
        self.sockets.register(&sock);

        let router = Arc::clone(&self.router);
        let (iden, instance_id) = (self.iden, self.instance_id);

        self.pool.execute(Box::new(move || {
            let _ctx = NodeContextGuard::with_instance_id(&iden, instance_id);
            let handled = catch_unwind(AssertUnwindSafe(|| router.dispatch(&sock, &envelope)));
            if let Err(payload) = handled {
                let info = ErrorInfo::from_panic(payload.as_ref());
                error!(
                    sock = sock.id(),
                    kind = %envelope.kind,
                    panic = %info.mesg,
                    "Message handler panicked"
                );
            }
        }));
    }

    /// Transport callback: `sock` is gone
    ///
    /// A link socket takes its local link with it unless a newer socket to
    /// the same peer has taken over. A session socket detaches its session
    /// unless another socket is still bound to it. Returns the role the
    /// socket had.
    pub fn on_sock_fini(&self, id: SockId) -> Option<SocketRole> {
        // Same lock as the handshake, so a re-link cannot land between the
        // check and the removal
        let role = self.graph.batch(|graph| {
            let role = self.sockets.remove(id)?;
            if let SocketRole::Link(peer) = &role {
                if self.sockets.link_sock(peer).is_none() {
                    if graph.remove_link(&LinkKey::new(self.iden, *peer)) {
                        graph.refresh_local_record();
                    }
                    info!(peer = %peer.short_id(), sock = id, "Link closed");
                }
            }
            Some(role)
        })?;

        if let SocketRole::Session { sess, .. } = &role {
            if !self.sockets.session_bound(sess) && self.sessions.remove(sess).is_some() {
                info!(sess = %sess.short_id(), sock = id, "Session closed");
            }
        }
        Some(role)
    }

    /// Open the link handshake on an outbound socket
    pub fn link_sock(&self, sock: Arc<dyn LinkSocket>) -> NodeResult<()> {
        self.sockets.register(&sock);
        sock.transmit(&Envelope::wrap(&LinkMesg { iden: self.iden })?)?;
        debug!(sock = sock.id(), "Sent link request");
        Ok(())
    }

    /// Bind `sock` to a local client session
    ///
    /// Payloads the session sends are stamped with this node as origin and
    /// with `user`; payloads addressed to the session are delivered to it.
    pub fn bind_session(
        &self,
        sock: Arc<dyn LinkSocket>,
        session: Arc<dyn Session>,
        user: Option<String>,
    ) -> NodeResult<()> {
        let sess = session.iden();
        self.sockets.register(&sock);
        self.sockets.bind_session(sock.id(), sess, user)?;
        self.sessions.add(session);
        debug!(sess = %sess.short_id(), sock = sock.id(), "Session bound");
        Ok(())
    }

    /// Detach a session; its socket stays registered
    pub fn unbind_session(&self, sess: &Iden) -> bool {
        self.sessions.remove(sess).is_some()
    }

    /// Re-author the local record and send it to every linked peer
    ///
    /// Returns the number of peers it was handed to.
    pub fn announce(&self) -> NodeResult<usize> {
        let record = self.graph.refresh_local_record();
        let tick = record.tick;
        let envelope = Envelope::wrap(&NodeMesg { record })?;

        let mut sent = 0;
        for (peer, sock) in self.sockets.link_socks() {
            match sock.transmit(&envelope) {
                Ok(()) => sent += 1,
                Err(e) => warn!(peer = %peer.short_id(), error = %e, "Announce failed"),
            }
        }

        debug!(tick, peers = sent, "Announced local record");
        Ok(sent)
    }

    /// Originate a payload for `dest`, optionally for one of its sessions
    ///
    /// Undeliverable payloads are dropped and reported as
    /// [`NodeEvent::Dropped`], not as errors.
    pub fn send(&self, dest: Iden, data: Vec<u8>, sess: Option<Iden>) -> NodeResult<()> {
        let mut mesg = XmitMesg::new(dest, self.config.default_ttl, data);
        mesg.sess = sess;
        mesg.orig = Some(self.iden);
        self.router.route(mesg)?;
        Ok(())
    }
}

/// Create `path` if needed, accessible by the owner only
async fn create_private_dir(path: &Path) -> NodeResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| NodeError::Io(format!("Failed to create {}: {}", path.display(), e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .map_err(|e| NodeError::Io(format!("Failed to restrict {}: {}", path.display(), e)))?;
    }
    Ok(())
}

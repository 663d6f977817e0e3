//! The link graph
//!
//! [`LinkGraph`] owns every known [`NodeRecord`], the directed links they
//! declare, and the [`RouteCache`] derived from them. All state sits behind
//! one reentrant lock owned by the graph instance: public operations hold it
//! for their whole duration, and [`LinkGraph::batch`] lets a caller hold it
//! across several nested public calls on the same thread.
//!
//! Internally each public operation borrows the state once and works on
//! `&mut GraphState`, so nested helpers never re-enter the lock.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use axon_core::{now_tick, Iden, Link, LinkKey, NodeRecord, Route};
use parking_lot::ReentrantMutex;
use tracing::{debug, trace, warn};

use crate::cache::RouteCache;
use crate::path::shortest_route;

/// Node records, links, and cached routes of one mesh node
pub struct LinkGraph {
    local: Iden,
    state: ReentrantMutex<RefCell<GraphState>>,
}

#[derive(Debug)]
struct GraphState {
    nodes: HashMap<Iden, NodeRecord>,
    links: HashMap<LinkKey, Link>,
    /// Outbound link keys per node, in registration order
    links_by_src: HashMap<Iden, Vec<LinkKey>>,
    /// Inbound link keys per node, in registration order
    links_by_dst: HashMap<Iden, Vec<LinkKey>>,
    routes: RouteCache,
}

impl GraphState {
    fn add_link(&mut self, link: Link) {
        let key = link.key;
        match self.links.get(&key) {
            Some(existing) => {
                let merged = existing.merged(&link.info);
                if merged.info != existing.info {
                    // Cached routes carry copies of the old info
                    self.routes.invalidate_link(&key);
                }
                self.links.insert(key, merged);
            }
            None => {
                trace!(link = %key, "Adding link");
                self.links_by_src.entry(key.src).or_default().push(key);
                self.links_by_dst.entry(key.dst).or_default().push(key);
                self.links.insert(key, link);
            }
        }
    }

    fn remove_link(&mut self, key: &LinkKey) -> bool {
        if self.links.remove(key).is_none() {
            return false;
        }

        if let Some(keys) = self.links_by_src.get_mut(&key.src) {
            keys.retain(|k| k != key);
        }
        if let Some(keys) = self.links_by_dst.get_mut(&key.dst) {
            keys.retain(|k| k != key);
        }

        let purged = self.routes.invalidate_link(key);
        debug!(link = %key, purged, "Removed link");
        true
    }

    fn set_node_record(&mut self, record: NodeRecord) -> bool {
        let iden = record.iden;

        if let Some(existing) = self.nodes.get(&iden) {
            if existing.tick >= record.tick {
                trace!(
                    node = %iden.short_id(),
                    have = existing.tick,
                    got = record.tick,
                    "Ignoring stale node record"
                );
                return false;
            }

            let dropped: Vec<LinkKey> = self
                .outbound_keys(iden)
                .filter(|key| !record.declares(&key.dst))
                .collect();
            for key in dropped {
                self.remove_link(&key);
            }
        }

        let links: Vec<Link> = record.declared_links().collect();
        debug!(
            node = %iden.short_id(),
            tick = record.tick,
            links = links.len(),
            "Applied node record"
        );
        self.nodes.insert(iden, record);

        for link in links {
            self.add_link(link);
        }
        true
    }

    fn outbound_keys(&self, iden: Iden) -> impl Iterator<Item = LinkKey> + '_ {
        self.links_by_src
            .get(&iden)
            .into_iter()
            .flat_map(|keys| keys.iter().copied())
    }

    fn outbound(&self, iden: Iden) -> impl Iterator<Item = &Link> + '_ {
        let links = &self.links;
        self.links_by_src
            .get(&iden)
            .into_iter()
            .flat_map(move |keys| keys.iter().filter_map(move |key| links.get(key)))
    }

    fn inbound(&self, iden: Iden) -> impl Iterator<Item = &Link> + '_ {
        let links = &self.links;
        self.links_by_dst
            .get(&iden)
            .into_iter()
            .flat_map(move |keys| keys.iter().filter_map(move |key| links.get(key)))
    }

    fn route_to(&mut self, local: Iden, target: Iden) -> Option<Arc<Route>> {
        if let Some(route) = self.routes.get(&target) {
            return Some(route);
        }

        let route = shortest_route(local, target, |node| self.outbound(*node))?;
        debug!(
            target = %target.short_id(),
            hops = route.hop_count(),
            "Computed route"
        );
        Some(self.routes.insert(route))
    }
}

impl LinkGraph {
    /// Create a graph for the local node described by `local`
    pub fn new(local: NodeRecord) -> Self {
        let iden = local.iden;
        let mut state = GraphState {
            nodes: HashMap::new(),
            links: HashMap::new(),
            links_by_src: HashMap::new(),
            links_by_dst: HashMap::new(),
            routes: RouteCache::new(),
        };
        state.set_node_record(local);

        Self {
            local: iden,
            state: ReentrantMutex::new(RefCell::new(state)),
        }
    }

    /// The local node's iden
    pub fn local_iden(&self) -> Iden {
        self.local
    }

    /// Run `f` while holding the graph lock
    ///
    /// Public operations called from inside `f` reuse the held lock, so a
    /// sequence of them is applied without interleaving from other threads.
    pub fn batch<R>(&self, f: impl FnOnce(&LinkGraph) -> R) -> R {
        let _guard = self.state.lock();
        f(self)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut GraphState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    /// Store a node record if it is newer than the one held
    ///
    /// Returns `false`, changing nothing, when the held record's tick is
    /// greater than or equal to the incoming one. Otherwise links the old
    /// record declared but the new one omits are removed, the record is
    /// stored, and its declared links are created or updated.
    pub fn set_node_record(&self, record: NodeRecord) -> bool {
        self.with_state(|state| state.set_node_record(record))
    }

    /// Add a link, or merge its info into an existing one
    pub fn add_link(&self, link: Link) {
        self.with_state(|state| state.add_link(link))
    }

    /// Remove a link and every cached route that uses it
    ///
    /// Returns `false` if the link was not present.
    pub fn remove_link(&self, key: &LinkKey) -> bool {
        self.with_state(|state| state.remove_link(key))
    }

    pub fn get_link(&self, key: &LinkKey) -> Option<Link> {
        self.with_state(|state| state.links.get(key).cloned())
    }

    /// A minimum-hop route from the local node to `target`
    ///
    /// Successful results are cached and returned as the same `Arc` until a
    /// link they use is removed or its info changes. Unreachable targets are not cached.
    pub fn get_route_to(&self, target: &Iden) -> Option<Arc<Route>> {
        let local = self.local;
        self.with_state(|state| state.route_to(local, *target))
    }

    /// The neighbor to hand a message for `target` to
    pub fn next_hop(&self, target: &Iden) -> Option<Iden> {
        self.get_route_to(target).map(|route| route.next_hop())
    }

    pub fn get_node_record(&self, iden: &Iden) -> Option<NodeRecord> {
        self.with_state(|state| state.nodes.get(iden).cloned())
    }

    /// Outbound links of `iden`, in registration order
    pub fn links_from(&self, iden: &Iden) -> Vec<Link> {
        self.with_state(|state| state.outbound(*iden).cloned().collect())
    }

    /// Inbound links of `iden`, in registration order
    pub fn links_to(&self, iden: &Iden) -> Vec<Link> {
        self.with_state(|state| state.inbound(*iden).cloned().collect())
    }

    pub fn node_count(&self) -> usize {
        self.with_state(|state| state.nodes.len())
    }

    pub fn link_count(&self) -> usize {
        self.with_state(|state| state.links.len())
    }

    pub fn route_cache_len(&self) -> usize {
        self.with_state(|state| state.routes.len())
    }

    /// The local node's current record
    pub fn local_record(&self) -> NodeRecord {
        let local = self.local;
        self.with_state(|state| {
            state
                .nodes
                .get(&local)
                .cloned()
                .unwrap_or_else(|| NodeRecord::new(local, 0))
        })
    }

    /// Re-author the local record from the local node's current links
    ///
    /// The new record keeps the local attributes, declares every outbound
    /// link the graph holds for the local node, and carries a tick strictly
    /// newer than the previous local record. A tick already at `u64::MAX`
    /// stays there.
    pub fn refresh_local_record(&self) -> NodeRecord {
        let local = self.local;
        self.with_state(|state| {
            let previous = state
                .nodes
                .get(&local)
                .cloned()
                .unwrap_or_else(|| NodeRecord::new(local, 0));
            let tick = now_tick().max(previous.tick.saturating_add(1));

            let mut record = NodeRecord::new(local, tick);
            record.attrs = previous.attrs;
            let links: Vec<Link> = state.outbound(local).cloned().collect();
            for link in links {
                record = record.with_link(link.dst(), link.info);
            }

            if tick > previous.tick {
                state.set_node_record(record.clone());
            } else {
                // Tick exhausted; the record only mirrors links already held
                warn!(tick, "Local record tick cannot advance");
                state.nodes.insert(local, record.clone());
            }
            record
        })
    }
}

//! # Axon Routing
//!
//! Membership graph and route computation for the axon mesh.
//!
//! ## Core Components
//!
//! - [`LinkGraph`]: node records and directed links behind one reentrant lock
//! - [`RouteCache`]: memoized routes, purged when a link they use is removed
//! - [`shortest_route`]: breadth-first, minimum-hop path finding
//!
//! ## Update Ordering
//!
//! Node records are last-writer-wins on their `tick`. A record whose tick is
//! not strictly newer than the held one is discarded whole. An accepted
//! record replaces the held one and prunes any link it no longer declares.
//!
//! ## Cache Consistency
//!
//! Cached routes are never re-validated on read. Instead every link removal
//! purges the routes registered against that link, so a cached route can
//! never contain a removed link. Failed lookups are not cached.
//!
//! ## Example
//!
//! ```rust,ignore
//! use axon_core::{Iden, Link, LinkInfo, NodeRecord};
//! use axon_routing::LinkGraph;
//!
//! let graph = LinkGraph::new(NodeRecord::new(local, now_tick()));
//! graph.set_node_record(peer_record);
//! graph.add_link(Link::new(local, peer, LinkInfo::new()));
//!
//! if let Some(route) = graph.get_route_to(&target) {
//!     forward_to(route.next_hop());
//! }
//! ```

pub mod cache;
pub mod graph;
pub mod path;

// Re-export main types
pub use cache::RouteCache;
pub use graph::LinkGraph;
pub use path::shortest_route;

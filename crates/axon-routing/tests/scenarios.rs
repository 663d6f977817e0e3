//! End-to-end graph scenarios
//!
//! Walks a small mesh through the record and link lifecycle and checks that
//! routes always reflect the current graph.

use std::sync::Arc;

use axon_core::{Iden, Link, LinkInfo, LinkKey, NodeRecord};
use axon_routing::LinkGraph;

fn link(src: Iden, dst: Iden) -> Link {
    Link::new(src, dst, LinkInfo::new())
}

struct Mesh {
    graph: LinkGraph,
    n: Iden,
    a: Iden,
    b: Iden,
    c: Iden,
}

/// `N -> A`, with `A` declaring `A -> B` and `A -> C` at tick 10
fn mesh() -> Mesh {
    let (n, a, b, c) = (Iden::random(), Iden::random(), Iden::random(), Iden::random());
    let graph = LinkGraph::new(NodeRecord::new(n, 1));

    assert!(graph.set_node_record(NodeRecord::new(b, 1)));
    assert!(graph.set_node_record(
        NodeRecord::new(a, 10)
            .with_link(b, LinkInfo::new())
            .with_link(c, LinkInfo::new())
    ));
    graph.add_link(link(n, a));

    Mesh { graph, n, a, b, c }
}

#[test]
fn test_two_hop_route() {
    let Mesh { graph, n, a, b, .. } = mesh();

    let route = graph.get_route_to(&b).expect("B should be reachable");
    let keys: Vec<LinkKey> = route.links().iter().map(|l| l.key).collect();
    assert_eq!(keys, vec![LinkKey::new(n, a), LinkKey::new(a, b)]);
    assert_eq!(route.source(), n);
    assert_eq!(route.target(), b);
}

#[test]
fn test_removed_link_makes_target_unreachable() {
    let Mesh { graph, a, b, .. } = mesh();

    assert!(graph.get_route_to(&b).is_some());
    assert!(graph.remove_link(&LinkKey::new(a, b)));
    assert!(graph.get_route_to(&b).is_none());
}

#[test]
fn test_stale_record_does_not_restore_link() {
    let Mesh { graph, a, b, .. } = mesh();
    graph.remove_link(&LinkKey::new(a, b));

    let equal = NodeRecord::new(a, 10).with_link(b, LinkInfo::new());
    assert!(!graph.set_node_record(equal));

    let older = NodeRecord::new(a, 4).with_link(b, LinkInfo::new());
    assert!(!graph.set_node_record(older));

    assert!(graph.get_link(&LinkKey::new(a, b)).is_none());
    assert!(graph.get_route_to(&b).is_none());
}

#[test]
fn test_newer_record_prunes_and_invalidates() {
    let Mesh { graph, a, b, c, .. } = mesh();

    let through_c = graph.get_route_to(&c).expect("C should be reachable");
    assert_eq!(through_c.hops(), vec![a, c]);

    let newer = NodeRecord::new(a, 11).with_link(b, LinkInfo::new());
    assert!(graph.set_node_record(newer));

    assert!(graph.get_link(&LinkKey::new(a, c)).is_none());
    assert!(graph.get_route_to(&c).is_none());
    assert!(graph.get_route_to(&b).is_some());
}

#[test]
fn test_greatest_tick_wins_over_any_order() {
    let Mesh { graph, a, b, c, .. } = mesh();
    let d = Iden::random();

    // Tick 12 declares D only; later submissions with lower ticks are ignored
    let ticks = [12u64, 11, 3, 12, 7];
    let results: Vec<bool> = ticks
        .iter()
        .map(|&tick| {
            let dst = if tick == 12 { d } else { b };
            graph.set_node_record(NodeRecord::new(a, tick).with_link(dst, LinkInfo::new()))
        })
        .collect();

    assert_eq!(results, vec![true, false, false, false, false]);
    assert!(graph.get_link(&LinkKey::new(a, d)).is_some());
    assert!(graph.get_link(&LinkKey::new(a, b)).is_none());
    assert!(graph.get_link(&LinkKey::new(a, c)).is_none());
    assert_eq!(graph.get_node_record(&a).unwrap().tick, 12);
}

#[test]
fn test_repeated_lookup_is_reference_stable() {
    let Mesh { graph, b, .. } = mesh();

    let first = graph.get_route_to(&b).unwrap();
    let second = graph.get_route_to(&b).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_removal_recomputes_alternate_route() {
    let Mesh { graph, n, a, b, .. } = mesh();
    let d = Iden::random();

    // Alternate path N -> D -> X -> B, longer than N -> A -> B
    let x = Iden::random();
    graph.add_link(link(n, d));
    graph.add_link(link(d, x));
    graph.add_link(link(x, b));

    let short = graph.get_route_to(&b).unwrap();
    assert_eq!(short.hops(), vec![a, b]);

    graph.remove_link(&LinkKey::new(n, a));
    let long = graph.get_route_to(&b).unwrap();
    assert!(!Arc::ptr_eq(&short, &long));
    assert_eq!(long.hops(), vec![d, x, b]);
}

#[test]
fn test_unrelated_removal_keeps_cache() {
    let Mesh { graph, n, b, .. } = mesh();
    let d = Iden::random();
    graph.add_link(link(n, d));

    let route = graph.get_route_to(&b).unwrap();
    graph.remove_link(&LinkKey::new(n, d));
    assert!(Arc::ptr_eq(&route, &graph.get_route_to(&b).unwrap()));
}

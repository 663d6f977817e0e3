//! Breadth-first path finding over directed links
//!
//! [`shortest_route`] returns a minimum-hop route. Among routes of equal
//! length the winner is fixed by traversal order: outbound links are
//! explored in the order they were registered against each node.

use std::collections::{HashSet, VecDeque};

use axon_core::{Iden, Link, Route};

/// Find a minimum-hop route from `local` to `target`
///
/// `outbound` yields the outbound links of a node in registration order.
/// Returns `None` when the target is unreachable or is `local` itself.
pub fn shortest_route<'a, F, L>(local: Iden, target: Iden, outbound: F) -> Option<Route>
where
    F: Fn(&Iden) -> L,
    L: Iterator<Item = &'a Link>,
{
    if local == target {
        return None;
    }

    let mut done: HashSet<Iden> = HashSet::from([local]);
    let mut todo: VecDeque<Route> = VecDeque::new();

    // Direct neighbors first
    for link in outbound(&local) {
        let route = Route::direct(link.clone());
        if link.dst() == target {
            return Some(route);
        }
        todo.push_back(route);
    }

    while let Some(route) = todo.pop_front() {
        let tail = route.target();

        // Reached again through a route no shorter than the first
        if !done.insert(tail) {
            continue;
        }

        for link in outbound(&tail) {
            let node = link.dst();
            if node == target {
                return route.extended(link.clone());
            }

            if done.contains(&node) {
                continue;
            }

            if let Some(next) = route.extended(link.clone()) {
                todo.push_back(next);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axon_core::LinkInfo;

    /// Adjacency list preserving insertion order
    #[derive(Default)]
    struct Adjacency(HashMap<Iden, Vec<Link>>);

    impl Adjacency {
        fn link(&mut self, src: Iden, dst: Iden) {
            self.0
                .entry(src)
                .or_default()
                .push(Link::new(src, dst, LinkInfo::new()));
        }

        fn route(&self, local: Iden, target: Iden) -> Option<Route> {
            shortest_route(local, target, |node| {
                self.0.get(node).into_iter().flat_map(|links| links.iter())
            })
        }
    }

    fn idens<const N: usize>() -> [Iden; N] {
        std::array::from_fn(|_| Iden::random())
    }

    #[test]
    fn test_direct_neighbor() {
        let [n, a] = idens();
        let mut adj = Adjacency::default();
        adj.link(n, a);

        let route = adj.route(n, a).unwrap();
        assert_eq!(route.hops(), vec![a]);
    }

    #[test]
    fn test_two_hops() {
        let [n, a, b] = idens();
        let mut adj = Adjacency::default();
        adj.link(a, b);
        adj.link(n, a);

        assert_eq!(adj.route(n, b).unwrap().hops(), vec![a, b]);
    }

    #[test]
    fn test_unreachable() {
        let [n, a, b] = idens();
        let mut adj = Adjacency::default();
        adj.link(n, a);
        adj.link(b, a);

        assert!(adj.route(n, b).is_none());
        assert!(adj.route(n, Iden::random()).is_none());
    }

    #[test]
    fn test_no_route_to_self() {
        let [n, a] = idens();
        let mut adj = Adjacency::default();
        adj.link(n, a);
        adj.link(a, n);

        assert!(adj.route(n, n).is_none());
    }

    #[test]
    fn test_links_are_directed() {
        let [n, a] = idens();
        let mut adj = Adjacency::default();
        adj.link(a, n);

        assert!(adj.route(n, a).is_none());
    }

    #[test]
    fn test_shorter_path_wins_regardless_of_order() {
        // Long path registered first: n -> a -> b -> c -> t
        // Short path registered last: n -> d -> t
        let [n, a, b, c, d, t] = idens();
        let mut adj = Adjacency::default();
        adj.link(n, a);
        adj.link(a, b);
        adj.link(b, c);
        adj.link(c, t);
        adj.link(n, d);
        adj.link(d, t);

        assert_eq!(adj.route(n, t).unwrap().hops(), vec![d, t]);
    }

    #[test]
    fn test_equal_length_tie_breaks_by_insertion_order() {
        let [n, a, b, t] = idens();
        let mut adj = Adjacency::default();
        adj.link(n, b);
        adj.link(n, a);
        adj.link(a, t);
        adj.link(b, t);

        // b was registered first from n
        assert_eq!(adj.route(n, t).unwrap().hops(), vec![b, t]);
    }

    #[test]
    fn test_cycles_terminate() {
        let [n, a, b, t] = idens();
        let mut adj = Adjacency::default();
        adj.link(n, a);
        adj.link(a, b);
        adj.link(b, a);
        adj.link(b, n);

        assert!(adj.route(n, t).is_none());

        adj.link(b, t);
        assert_eq!(adj.route(n, t).unwrap().hops(), vec![a, b, t]);
    }
}

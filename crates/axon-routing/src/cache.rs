//! Route cache with link-keyed invalidation
//!
//! The [`RouteCache`] memoizes successful route computations by target.
//! Each cached route registers its target under every link it uses, so
//! removing a link purges exactly the routes that went through it.
//! Negative results are never cached.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axon_core::{Iden, LinkKey, Route};

/// Cached routes indexed by target, with a reverse index by link
#[derive(Debug, Default)]
pub struct RouteCache {
    /// Routes indexed by target
    routes: HashMap<Iden, Arc<Route>>,
    /// Targets whose cached route uses a given link
    by_link: HashMap<LinkKey, HashSet<Iden>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached route to `target`, if any
    pub fn get(&self, target: &Iden) -> Option<Arc<Route>> {
        self.routes.get(target).cloned()
    }

    /// Cache a route under its target and register it against its links
    pub fn insert(&mut self, route: Route) -> Arc<Route> {
        let target = route.target();
        self.purge(&target);

        for link in route.links() {
            self.by_link.entry(link.key).or_default().insert(target);
        }

        let route = Arc::new(route);
        self.routes.insert(target, Arc::clone(&route));
        route
    }

    /// Drop every route that uses `key`
    ///
    /// Returns the number of routes purged.
    pub fn invalidate_link(&mut self, key: &LinkKey) -> usize {
        let Some(targets) = self.by_link.remove(key) else {
            return 0;
        };

        targets
            .into_iter()
            .filter(|target| self.purge(target))
            .count()
    }

    /// Drop the cached route to `target` and its reverse registrations
    fn purge(&mut self, target: &Iden) -> bool {
        let Some(route) = self.routes.remove(target) else {
            return false;
        };

        for link in route.links() {
            if let Some(targets) = self.by_link.get_mut(&link.key) {
                targets.remove(target);
                if targets.is_empty() {
                    self.by_link.remove(&link.key);
                }
            }
        }
        true
    }

    /// Whether any cached route uses `key`
    pub fn uses_link(&self, key: &LinkKey) -> bool {
        self.by_link.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn clear(&mut self) {
        self.routes.clear();
        self.by_link.clear();
    }
}

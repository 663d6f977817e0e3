//! Node records and directed links
//!
//! A [`NodeRecord`] is the authored description of one mesh participant:
//! its identity, a logical tick, descriptive attributes, and the outbound
//! links it advertises. Records are immutable values; a newer record for the
//! same iden replaces the old one wholesale.
//!
//! A [`Link`] is a directed edge. `(a, b)` and `(b, a)` are unrelated keys.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::identity::Iden;

/// Opaque descriptive fields of a node (hostname and the like)
pub type Attrs = BTreeMap<String, String>;

/// Opaque properties attached to a link
pub type LinkInfo = BTreeMap<String, String>;

/// Attribute key for the host name of a node
pub const ATTR_HOST: &str = "host";

/// Current wall clock as a record tick (milliseconds since the epoch)
pub fn now_tick() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Key of a directed link: the ordered pair `(src, dst)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    pub src: Iden,
    pub dst: Iden,
}

impl LinkKey {
    pub fn new(src: Iden, dst: Iden) -> Self {
        Self { src, dst }
    }

    /// The key of the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
        }
    }
}

impl Display for LinkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.src.short_id(), self.dst.short_id())
    }
}

/// A directed, attributed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub key: LinkKey,
    pub info: LinkInfo,
}

impl Link {
    pub fn new(src: Iden, dst: Iden, info: LinkInfo) -> Self {
        Self {
            key: LinkKey::new(src, dst),
            info,
        }
    }

    pub fn src(&self) -> Iden {
        self.key.src
    }

    pub fn dst(&self) -> Iden {
        self.key.dst
    }

    /// A copy of this link with `info` merged over the existing properties
    pub fn merged(&self, info: &LinkInfo) -> Self {
        let mut merged = self.info.clone();
        merged.extend(info.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            key: self.key,
            info: merged,
        }
    }
}

/// One outbound link declared by a node record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDecl {
    pub dst: Iden,
    pub info: LinkInfo,
}

/// Authored description of a mesh participant
///
/// Declared links keep their declaration order; the link graph registers
/// them in that order, which in turn fixes route tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub iden: Iden,
    pub tick: u64,
    pub attrs: Attrs,
    pub links: Vec<LinkDecl>,
}

impl NodeRecord {
    /// Create a record with no attributes and no links
    pub fn new(iden: Iden, tick: u64) -> Self {
        Self {
            iden,
            tick,
            attrs: Attrs::new(),
            links: Vec::new(),
        }
    }

    /// Set an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Declare (or re-declare) an outbound link to `dst`
    pub fn with_link(mut self, dst: Iden, info: LinkInfo) -> Self {
        match self.links.iter_mut().find(|decl| decl.dst == dst) {
            Some(decl) => decl.info = info,
            None => self.links.push(LinkDecl { dst, info }),
        }
        self
    }

    /// Drop the declared link to `dst`, if any
    pub fn without_link(mut self, dst: &Iden) -> Self {
        self.links.retain(|decl| &decl.dst != dst);
        self
    }

    /// Replace the tick
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    /// Whether this record declares a link to `dst`
    pub fn declares(&self, dst: &Iden) -> bool {
        self.links.iter().any(|decl| &decl.dst == dst)
    }

    /// Info of the declared link to `dst`
    pub fn link_info(&self, dst: &Iden) -> Option<&LinkInfo> {
        self.links
            .iter()
            .find(|decl| &decl.dst == dst)
            .map(|decl| &decl.info)
    }

    /// The declared links as graph links
    pub fn declared_links(&self) -> impl Iterator<Item = Link> + '_ {
        self.links
            .iter()
            .map(move |decl| Link::new(self.iden, decl.dst, decl.info.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_key_reversed() {
        let a = Iden::random();
        let b = Iden::random();
        let key = LinkKey::new(a, b);
        assert_eq!(key.reversed(), LinkKey::new(b, a));
        assert_ne!(key, key.reversed());
    }

    #[test]
    fn test_link_merge_overrides_and_keeps() {
        let link = Link::new(
            Iden::random(),
            Iden::random(),
            LinkInfo::from([
                ("proto".to_string(), "tcp".to_string()),
                ("rtt".to_string(), "10".to_string()),
            ]),
        );
        let merged = link.merged(&LinkInfo::from([("rtt".to_string(), "7".to_string())]));

        assert_eq!(merged.info.get("proto").map(String::as_str), Some("tcp"));
        assert_eq!(merged.info.get("rtt").map(String::as_str), Some("7"));
        // The original value is untouched
        assert_eq!(link.info.get("rtt").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_record_link_declarations_keep_order() {
        let (a, b, c) = (Iden::random(), Iden::random(), Iden::random());
        let record = NodeRecord::new(a, 1)
            .with_link(c, LinkInfo::new())
            .with_link(b, LinkInfo::new())
            .with_link(c, LinkInfo::from([("k".to_string(), "v".to_string())]));

        let dsts: Vec<_> = record.links.iter().map(|d| d.dst).collect();
        assert_eq!(dsts, vec![c, b]);
        assert_eq!(record.link_info(&c).unwrap().len(), 1);

        let record = record.without_link(&c);
        assert!(!record.declares(&c));
        assert!(record.declares(&b));
    }

    #[test]
    fn test_declared_links() {
        let (a, b) = (Iden::random(), Iden::random());
        let record = NodeRecord::new(a, 5).with_attr(ATTR_HOST, "box");
        assert_eq!(record.declared_links().count(), 0);

        let record = record.with_link(b, LinkInfo::new());
        let links: Vec<_> = record.declared_links().collect();
        assert_eq!(links, vec![Link::new(a, b, LinkInfo::new())]);
    }

    #[test]
    fn test_now_tick_advances() {
        let first = now_tick();
        assert!(first > 0);
        assert!(now_tick() >= first);
    }
}

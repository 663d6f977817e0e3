//! Local session table
//!
//! Payloads addressed to this node that carry a `sess` iden are handed to
//! the matching [`Session`]. Sessions are attached and detached by the
//! node's owner; the router only looks them up.

use std::sync::Arc;

use axon_core::{Iden, Session};
use dashmap::DashMap;

/// Attached sessions by iden
#[derive(Default)]
pub struct SessionTable {
    sessions: DashMap<Iden, Arc<dyn Session>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a session, replacing any with the same iden
    pub fn add(&self, session: Arc<dyn Session>) {
        self.sessions.insert(session.iden(), session);
    }

    pub fn get(&self, iden: &Iden) -> Option<Arc<dyn Session>> {
        self.sessions.get(iden).map(|s| Arc::clone(s.value()))
    }

    pub fn remove(&self, iden: &Iden) -> Option<Arc<dyn Session>> {
        self.sessions.remove(iden).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_core::{TransportError, XmitMesg};

    struct Quiet(Iden);

    impl Session for Quiet {
        fn iden(&self) -> Iden {
            self.0
        }

        fn deliver(&self, _mesg: &XmitMesg) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn test_add_get_remove() {
        let table = SessionTable::new();
        let iden = Iden::random();

        table.add(Arc::new(Quiet(iden)));
        assert_eq!(table.get(&iden).unwrap().iden(), iden);
        assert!(table.get(&Iden::random()).is_none());

        assert!(table.remove(&iden).is_some());
        assert!(table.is_empty());
    }
}

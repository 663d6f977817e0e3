//! In-memory socket for testing
//!
//! [`MockSocket`] records every envelope transmitted on it so router and
//! node tests can assert on what left the node without a real transport.
//!
//! ```rust,ignore
//! use axon_core::{LinkSocket, MockSocket};
//!
//! let sock = MockSocket::new(7);
//! sock.transmit(&envelope)?;
//! assert_eq!(sock.sent().len(), 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::message::{Envelope, WireBody};
use crate::traits::{LinkSocket, SockId};

static NEXT_SOCK_ID: AtomicU64 = AtomicU64::new(1);

/// A socket that records transmitted envelopes
#[derive(Debug)]
pub struct MockSocket {
    id: SockId,
    sent: Mutex<Vec<Envelope>>,
    closed: AtomicBool,
}

impl MockSocket {
    /// Create a socket with a specific id
    pub fn new(id: SockId) -> Self {
        Self {
            id,
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a shared socket with a process-unique id
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new(NEXT_SOCK_ID.fetch_add(1, Ordering::Relaxed)))
    }

    /// Everything transmitted so far
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().clone()
    }

    /// Transmitted envelopes of one body type, decoded
    pub fn sent_of<T: WireBody>(&self) -> Vec<T> {
        self.sent
            .lock()
            .iter()
            .filter(|envelope| envelope.kind == T::KIND.as_str())
            .filter_map(|envelope| envelope.open::<T>().ok())
            .collect()
    }

    /// Forget recorded envelopes
    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Make further transmits fail
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl LinkSocket for MockSocket {
    fn id(&self) -> SockId {
        self.id
    }

    fn transmit(&self, envelope: &Envelope) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::SocketClosed);
        }
        self.sent.lock().push(envelope.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Iden;
    use crate::message::{LinkMesg, XmitMesg};

    #[test]
    fn test_records_transmits() {
        let sock = MockSocket::new(3);
        assert_eq!(sock.id(), 3);

        let iden = Iden::random();
        sock.transmit(&Envelope::wrap(&LinkMesg { iden }).unwrap())
            .unwrap();
        sock.transmit(&Envelope::wrap(&XmitMesg::new(iden, 1, vec![])).unwrap())
            .unwrap();

        assert_eq!(sock.sent().len(), 2);
        assert_eq!(sock.sent_of::<LinkMesg>(), vec![LinkMesg { iden }]);
        assert_eq!(sock.sent_of::<XmitMesg>().len(), 1);

        sock.clear();
        assert!(sock.sent().is_empty());
    }

    #[test]
    fn test_closed_socket_fails() {
        let sock = MockSocket::shared();
        sock.close();
        let result = sock.transmit(&Envelope::new("link", vec![]));
        assert!(matches!(result, Err(TransportError::SocketClosed)));
    }

    #[test]
    fn test_shared_ids_unique() {
        assert_ne!(MockSocket::shared().id(), MockSocket::shared().id());
    }
}

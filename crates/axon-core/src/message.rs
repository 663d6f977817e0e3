//! Wire messages exchanged between mesh nodes
//!
//! The transport hands the core an [`Envelope`]: a kind name plus an opaque
//! body. Bodies of the kinds this version understands are postcard-encoded
//! [`LinkMesg`], [`XmitMesg`] and [`NodeMesg`] values. Byte-stream
//! transports carry envelopes in the frames of [`crate::frame`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::WireError;
use crate::identity::Iden;
use crate::record::NodeRecord;

/// Message kinds understood by this version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Link announcement / handshake
    Link,
    /// Routed application payload
    Xmit,
    /// Node record announcement
    Node,
}

impl MessageKind {
    /// All known kinds
    pub const ALL: [MessageKind; 3] = [Self::Link, Self::Xmit, Self::Node];

    /// The kind's wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Xmit => "xmit",
            Self::Node => "node",
        }
    }

    /// Look a kind up by wire name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// A body type with a fixed message kind
pub trait WireBody: Serialize + DeserializeOwned {
    const KIND: MessageKind;
}

/// A raw `(kind, body)` message as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    pub body: Vec<u8>,
}

impl Envelope {
    /// Create an envelope with an arbitrary kind name
    pub fn new(kind: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            body,
        }
    }

    /// Encode a typed body into an envelope
    pub fn wrap<T: WireBody>(body: &T) -> Result<Self, WireError> {
        let body =
            postcard::to_allocvec(body).map_err(|e| WireError::Serialization(e.to_string()))?;
        Ok(Self::new(T::KIND.as_str(), body))
    }

    /// The known kind of this envelope, if any
    pub fn message_kind(&self) -> Option<MessageKind> {
        MessageKind::from_name(&self.kind)
    }

    /// Decode the body as `T`
    pub fn open<T: WireBody>(&self) -> Result<T, WireError> {
        postcard::from_bytes(&self.body).map_err(|e| WireError::Deserialization(e.to_string()))
    }
}

/// `link` body: the sender's iden
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMesg {
    pub iden: Iden,
}

impl WireBody for LinkMesg {
    const KIND: MessageKind = MessageKind::Link;
}

/// `node` body: an announced node record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMesg {
    pub record: NodeRecord,
}

impl WireBody for NodeMesg {
    const KIND: MessageKind = MessageKind::Node;
}

/// `xmit` body: an application payload routed across the mesh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmitMesg {
    /// Final destination
    pub dest: Iden,
    /// Remaining hop budget
    pub ttl: u32,
    /// Opaque application payload
    pub data: Vec<u8>,
    /// Session at the destination the payload is for
    pub sess: Option<Iden>,
    /// Node that first injected the message into the mesh
    pub orig: Option<Iden>,
    /// User the originating session was authenticated as
    pub user: Option<String>,
}

impl XmitMesg {
    pub fn new(dest: Iden, ttl: u32, data: Vec<u8>) -> Self {
        Self {
            dest,
            ttl,
            data,
            sess: None,
            orig: None,
            user: None,
        }
    }

    /// Address the payload to a session at the destination
    pub fn with_sess(mut self, sess: Iden) -> Self {
        self.sess = Some(sess);
        self
    }

    /// Consume one hop of budget; returns false once the budget is gone
    pub fn decrement_ttl(&mut self) -> bool {
        match self.ttl.checked_sub(1) {
            Some(ttl) => {
                self.ttl = ttl;
                true
            }
            None => false,
        }
    }
}

impl WireBody for XmitMesg {
    const KIND: MessageKind = MessageKind::Xmit;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_lookup() {
        assert_eq!(MessageKind::from_name("link"), Some(MessageKind::Link));
        assert_eq!(MessageKind::from_name("xmit"), Some(MessageKind::Xmit));
        assert_eq!(MessageKind::from_name("node"), Some(MessageKind::Node));
        assert_eq!(MessageKind::from_name("gossip"), None);
    }

    #[test]
    fn test_wrap_sets_kind() {
        let envelope = Envelope::wrap(&LinkMesg {
            iden: Iden::random(),
        })
        .unwrap();
        assert_eq!(envelope.kind, "link");
        assert_eq!(envelope.message_kind(), Some(MessageKind::Link));
    }

    #[test]
    fn test_open_rejects_garbage() {
        let envelope = Envelope::new("xmit", vec![0xff]);
        assert!(matches!(
            envelope.open::<XmitMesg>(),
            Err(WireError::Deserialization(_))
        ));
    }

    #[test]
    fn test_xmit_ttl() {
        let mut mesg = XmitMesg::new(Iden::random(), 1, vec![]);
        assert!(mesg.decrement_ttl()); // 1 -> 0
        assert_eq!(mesg.ttl, 0);
        assert!(!mesg.decrement_ttl()); // budget gone
        assert_eq!(mesg.ttl, 0);
    }
}

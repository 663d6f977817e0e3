//! Length-prefixed envelope frames
//!
//! Byte-stream transports carry each [`Envelope`] as a big-endian `u32`
//! length followed by the postcard-encoded envelope. [`FrameBuffer`]
//! reassembles envelopes from whatever chunks the stream delivers.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::WireError;
use crate::message::Envelope;

/// Largest encoded envelope a frame may carry (1 MiB)
pub const MAX_FRAME_LEN: usize = 1 << 20;

const LEN_PREFIX: usize = 4;

fn check_len(len: usize) -> Result<(), WireError> {
    if len > MAX_FRAME_LEN {
        return Err(WireError::MessageTooLarge {
            size: len,
            max: MAX_FRAME_LEN,
        });
    }
    Ok(())
}

/// Encode `envelope` as one frame
pub fn encode_frame(envelope: &Envelope) -> Result<Bytes, WireError> {
    let body =
        postcard::to_allocvec(envelope).map_err(|e| WireError::Serialization(e.to_string()))?;
    check_len(body.len())?;

    let mut frame = BytesMut::with_capacity(LEN_PREFIX + body.len());
    frame.put_u32(body.len() as u32);
    frame.put_slice(&body);
    Ok(frame.freeze())
}

/// Reassembles frames from a byte stream
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes received from the stream
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes held that do not yet form a complete frame
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete envelope, if one has fully arrived
    ///
    /// An oversized or undecodable frame is an error. The stream cannot be
    /// resynchronised after one, so the caller should drop the socket.
    pub fn next_envelope(&mut self) -> Result<Option<Envelope>, WireError> {
        if self.buf.len() < LEN_PREFIX {
            return Ok(None);
        }

        let len = (&self.buf[..LEN_PREFIX]).get_u32() as usize;
        check_len(len)?;
        if self.buf.len() < LEN_PREFIX + len {
            return Ok(None);
        }

        self.buf.advance(LEN_PREFIX);
        let body = self.buf.split_to(len);
        postcard::from_bytes(&body)
            .map(Some)
            .map_err(|e| WireError::Deserialization(e.to_string()))
    }

    /// Every complete envelope currently buffered
    pub fn drain(&mut self) -> Result<Vec<Envelope>, WireError> {
        let mut envelopes = Vec::new();
        while let Some(envelope) = self.next_envelope()? {
            envelopes.push(envelope);
        }
        Ok(envelopes)
    }
}

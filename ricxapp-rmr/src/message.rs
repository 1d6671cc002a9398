//! RMR message and frame encoding
//!
//! An RMR message is a payload plus the header fields routing depends on:
//! message type, subscription id, managed entity id (the E2 node) and a
//! transaction id. Over UDP the message is carried as one frame:
//!
//! ```text
//! marker 'R' | version | flags | mtype (i32) | sub_id (i32)
//!   [meid len (u8) | meid]      if flags & 0x01
//!   [transaction id (u16)]      if flags & 0x02
//!   payload len (u32) | payload
//! ```

use std::fmt;
use std::net::SocketAddr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ricxapp_common::{E2NodeId, MAX_MEID_LEN};
use thiserror::Error;

/// Frame marker byte
const FRAME_MARKER: u8 = b'R';

/// Frame format version
const FRAME_VERSION: u8 = 1;

const FLAG_MEID: u8 = 0x01;
const FLAG_XID: u8 = 0x02;

/// Fixed part of a frame (marker, version, flags, mtype, sub_id, payload len)
pub const FRAME_FIXED_LEN: usize = 3 + 4 + 4 + 4;

/// Subscription id used when a message belongs to no subscription
pub const RMR_VOID_SUBID: i32 = -1;

/// Errors that can occur during frame encoding/decoding
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Invalid frame marker
    #[error("invalid RMR frame marker: expected 0x52, got 0x{0:02X}")]
    InvalidMarker(u8),

    /// Unsupported frame version
    #[error("unsupported RMR frame version {0}")]
    UnsupportedVersion(u8),

    /// Buffer too short
    #[error("buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort {
        /// Number of bytes needed
        needed: usize,
        /// Number of bytes available
        available: usize,
    },

    /// Invalid MEID
    #[error("invalid MEID: {0}")]
    InvalidMeid(String),

    /// Payload exceeds the frame limit
    #[error("payload of {0} bytes exceeds the frame limit")]
    PayloadTooLarge(usize),

    /// Bytes after the payload
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// One routed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmrMessage {
    /// Message type (routing key)
    pub mtype: i32,
    /// Subscription id, or [`RMR_VOID_SUBID`]
    pub sub_id: i32,
    /// Managed entity id (E2 node) the message is for or from
    pub meid: Option<E2NodeId>,
    /// Transaction id echoed by responders
    pub transaction_id: Option<u16>,
    /// Message payload
    pub payload: Bytes,
    /// Sender address, set on receive by transports that know it
    pub source: Option<SocketAddr>,
}

impl RmrMessage {
    /// Creates a message with no subscription, MEID or transaction id.
    pub fn new(mtype: i32, payload: impl Into<Bytes>) -> Self {
        Self {
            mtype,
            sub_id: RMR_VOID_SUBID,
            meid: None,
            transaction_id: None,
            payload: payload.into(),
            source: None,
        }
    }

    /// Sets the managed entity id.
    pub fn with_meid(mut self, meid: E2NodeId) -> Self {
        self.meid = Some(meid);
        self
    }

    /// Sets the subscription id.
    pub fn with_sub_id(mut self, sub_id: i32) -> Self {
        self.sub_id = sub_id;
        self
    }

    /// Sets the transaction id.
    pub fn with_transaction_id(mut self, transaction_id: u16) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }
}

impl fmt::Display for RmrMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mtype={} sub_id={}", self.mtype, self.sub_id)?;
        if let Some(meid) = &self.meid {
            write!(f, " meid={meid}")?;
        }
        if let Some(xid) = self.transaction_id {
            write!(f, " xid={xid}")?;
        }
        write!(f, " len={}", self.payload.len())
    }
}

/// Encodes a message into a frame.
pub fn encode_frame(msg: &RmrMessage) -> Result<Bytes, FrameError> {
    let payload_len = u32::try_from(msg.payload.len())
        .map_err(|_| FrameError::PayloadTooLarge(msg.payload.len()))?;

    let mut flags = 0u8;
    if msg.meid.is_some() {
        flags |= FLAG_MEID;
    }
    if msg.transaction_id.is_some() {
        flags |= FLAG_XID;
    }

    let mut buf =
        BytesMut::with_capacity(FRAME_FIXED_LEN + 1 + MAX_MEID_LEN + 2 + msg.payload.len());
    buf.put_u8(FRAME_MARKER);
    buf.put_u8(FRAME_VERSION);
    buf.put_u8(flags);
    buf.put_i32(msg.mtype);
    buf.put_i32(msg.sub_id);
    if let Some(meid) = &msg.meid {
        // E2NodeId guarantees at most MAX_MEID_LEN bytes
        buf.put_u8(meid.as_str().len() as u8);
        buf.put_slice(meid.as_str().as_bytes());
    }
    if let Some(xid) = msg.transaction_id {
        buf.put_u16(xid);
    }
    buf.put_u32(payload_len);
    buf.put_slice(&msg.payload);
    Ok(buf.freeze())
}

fn need(buf: &[u8], needed: usize) -> Result<(), FrameError> {
    if buf.remaining() < needed {
        return Err(FrameError::BufferTooShort {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

/// Decodes one frame occupying all of `data`.
pub fn decode_frame(data: &[u8]) -> Result<RmrMessage, FrameError> {
    let mut buf = data;
    need(buf, 3)?;

    let marker = buf.get_u8();
    if marker != FRAME_MARKER {
        return Err(FrameError::InvalidMarker(marker));
    }
    let version = buf.get_u8();
    if version != FRAME_VERSION {
        return Err(FrameError::UnsupportedVersion(version));
    }
    let flags = buf.get_u8();

    need(buf, 8)?;
    let mtype = buf.get_i32();
    let sub_id = buf.get_i32();

    let meid = if flags & FLAG_MEID != 0 {
        need(buf, 1)?;
        let len = usize::from(buf.get_u8());
        need(buf, len)?;
        let name = std::str::from_utf8(&buf[..len])
            .map_err(|e| FrameError::InvalidMeid(e.to_string()))?
            .to_string();
        buf.advance(len);
        Some(E2NodeId::new(name).map_err(|e| FrameError::InvalidMeid(e.to_string()))?)
    } else {
        None
    };

    let transaction_id = if flags & FLAG_XID != 0 {
        need(buf, 2)?;
        Some(buf.get_u16())
    } else {
        None
    };

    need(buf, 4)?;
    let payload_len = buf.get_u32() as usize;
    need(buf, payload_len)?;
    let payload = Bytes::copy_from_slice(&buf[..payload_len]);
    buf.advance(payload_len);
    if buf.has_remaining() {
        return Err(FrameError::TrailingBytes(buf.remaining()));
    }

    Ok(RmrMessage {
        mtype,
        sub_id,
        meid,
        transaction_id,
        payload,
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RmrMessage {
        RmrMessage::new(12011, vec![0x01, 0x08, 0x00])
            .with_meid(E2NodeId::new("gnb_734_733_b5c67788").unwrap())
            .with_sub_id(7)
            .with_transaction_id(42)
    }

    #[test]
    fn test_frame_roundtrip() {
        let msg = sample();
        let frame = encode_frame(&msg).unwrap();
        assert_eq!(decode_frame(&frame).unwrap(), msg);

        let bare = RmrMessage::new(100, Bytes::new());
        assert_eq!(decode_frame(&encode_frame(&bare).unwrap()).unwrap(), bare);
    }

    #[test]
    fn test_bare_frame_layout() {
        let frame = encode_frame(&RmrMessage::new(100, vec![0xaa])).unwrap();
        assert_eq!(
            frame.as_ref(),
            &[
                b'R', 1, 0, 0x00, 0x00, 0x00, 0x64, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00,
                0x01, 0xaa
            ]
        );
    }

    #[test]
    fn test_truncated_frames() {
        let frame = encode_frame(&sample()).unwrap();
        for len in 0..frame.len() {
            assert!(decode_frame(&frame[..len]).is_err(), "prefix {len} decoded");
        }
    }

    #[test]
    fn test_bad_header() {
        assert_eq!(decode_frame(&[b'X', 1, 0]), Err(FrameError::InvalidMarker(b'X')));
        assert_eq!(decode_frame(&[b'R', 9, 0]), Err(FrameError::UnsupportedVersion(9)));

        let mut frame = encode_frame(&RmrMessage::new(100, vec![1])).unwrap().to_vec();
        frame.push(0);
        assert_eq!(decode_frame(&frame), Err(FrameError::TrailingBytes(1)));
    }

    #[test]
    fn test_invalid_meid_rejected() {
        // flags=meid, meid length 0
        let frame = [b'R', 1, 1, 0, 0, 0, 100, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(decode_frame(&frame), Err(FrameError::InvalidMeid(_))));
    }
}

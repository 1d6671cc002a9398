//! E2AP codec adapter
//!
//! Wraps a [`PduEngine`] behind an interface that owns all buffer sizing.
//! The engine follows the C-style contract of generated ASN.1 codecs: it packs
//! into a caller-owned buffer of explicit capacity and reports how many bytes
//! it wrote. The adapter validates fields before packing, pre-checks buffer
//! sizes before unpacking, and never reads output of a failed pack.

use std::fmt;

use bytes::Bytes;
use ricxapp_common::logging::{log_e2ap_message, Direction, HexDump};
use thiserror::Error;
use tracing::debug;

use crate::pdu::E2apPdu;
use crate::wire::WireEngine;

/// Default encode scratch buffer size
pub const ASN_BUFF_MAX_SIZE: usize = 4096;

/// Default upper bound on a PDU accepted for decoding
pub const MAX_DECODE_SIZE: usize = 65536;

/// Capacity of the diagnostic buffer (including the C terminator)
pub const ERR_BUF_SIZE: usize = 128;

/// Leading bytes of a rejected PDU included in the debug log
const DIAG_DUMP_LEN: usize = 32;

/// Classification of codec failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecErrorKind {
    /// Input violates the PDU structure or a field range
    Malformed,
    /// Procedure or message class is not handled
    UnsupportedType,
    /// A buffer is too small (encode) or input too large (decode)
    BufferTooSmall,
}

impl fmt::Display for CodecErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecErrorKind::Malformed => write!(f, "malformed"),
            CodecErrorKind::UnsupportedType => write!(f, "unsupported type"),
            CodecErrorKind::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

/// Codec failure with a bounded diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("E2AP codec error ({kind}): {message}")]
pub struct CodecError {
    /// Failure class
    pub kind: CodecErrorKind,
    /// Diagnostic, at most `ERR_BUF_SIZE - 1` bytes
    pub message: String,
}

impl CodecError {
    /// Creates an error, truncating the diagnostic to the error-buffer bound.
    pub fn new(kind: CodecErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.len() >= ERR_BUF_SIZE {
            let mut end = ERR_BUF_SIZE - 1;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        Self { kind, message }
    }

    /// Malformed input.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::Malformed, message)
    }

    /// Unsupported PDU kind.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::UnsupportedType, message)
    }

    /// Buffer too small.
    pub fn buffer_too_small(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::BufferTooSmall, message)
    }
}

/// Owned, immutable encoded PDU
///
/// Only the codec constructs these, so its length never exceeds the encode
/// buffer the PDU was packed into. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPdu(Bytes);

impl EncodedPdu {
    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Shared handle to the encoded bytes.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Encoded length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length PDU (never produced by a successful encode).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the PDU, returning its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for EncodedPdu {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Low-level PDU encoder/decoder
///
/// Implementations must not read beyond `data` on unpack and must report
/// either an error or a byte count on pack; the adapter checks the count.
pub trait PduEngine: Send + Sync + fmt::Debug {
    /// Shortest byte sequence that can be a PDU.
    fn min_pdu_len(&self) -> usize;

    /// Packs `pdu` into `out`, returning the number of bytes written.
    fn pack(&self, pdu: &E2apPdu, out: &mut [u8]) -> Result<usize, CodecError>;

    /// Unpacks one PDU occupying all of `data`.
    fn unpack(&self, data: &[u8]) -> Result<E2apPdu, CodecError>;
}

/// Codec adapter over a PDU engine
///
/// Stateless apart from its sizing, so one instance is shared by all tasks.
#[derive(Debug, Clone)]
pub struct E2apCodec<E: PduEngine = WireEngine> {
    engine: E,
    encode_buffer_size: usize,
    max_decode_size: usize,
}

impl E2apCodec<WireEngine> {
    /// Codec over the reference wire engine with default sizes.
    pub fn new() -> Self {
        Self::with_engine(WireEngine, ASN_BUFF_MAX_SIZE, MAX_DECODE_SIZE)
    }

    /// Codec over the reference wire engine with explicit sizes.
    pub fn with_buffer_sizes(encode_buffer_size: usize, max_decode_size: usize) -> Self {
        Self::with_engine(WireEngine, encode_buffer_size, max_decode_size)
    }
}

impl Default for E2apCodec<WireEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PduEngine> E2apCodec<E> {
    /// Codec over a custom engine.
    pub fn with_engine(engine: E, encode_buffer_size: usize, max_decode_size: usize) -> Self {
        Self {
            engine,
            encode_buffer_size,
            max_decode_size,
        }
    }

    /// Size of the scratch buffer handed to the engine on encode.
    pub fn encode_buffer_size(&self) -> usize {
        self.encode_buffer_size
    }

    /// Largest input accepted by [`decode`](Self::decode).
    pub fn max_decode_size(&self) -> usize {
        self.max_decode_size
    }

    /// Validates and encodes a PDU.
    pub fn encode(&self, pdu: &E2apPdu) -> Result<EncodedPdu, CodecError> {
        pdu.validate()?;

        let mut scratch = vec![0u8; self.encode_buffer_size];
        let written = self.engine.pack(pdu, &mut scratch)?;
        if written == 0 || written > scratch.len() {
            return Err(CodecError::malformed(format!(
                "engine reported {written} bytes for a {}-byte buffer",
                scratch.len()
            )));
        }
        scratch.truncate(written);
        log_e2ap_message(Direction::Tx, pdu.name(), &scratch);
        Ok(EncodedPdu(Bytes::from(scratch)))
    }

    /// Decodes and validates a PDU.
    pub fn decode(&self, data: &[u8]) -> Result<E2apPdu, CodecError> {
        match self.unpack_checked(data) {
            Ok(pdu) => {
                log_e2ap_message(Direction::Rx, pdu.name(), data);
                Ok(pdu)
            }
            Err(e) => {
                let head = &data[..data.len().min(DIAG_DUMP_LEN)];
                debug!(len = data.len(), head = %HexDump(head), "E2AP decode rejected: {}", e);
                Err(e)
            }
        }
    }

    fn unpack_checked(&self, data: &[u8]) -> Result<E2apPdu, CodecError> {
        let min = self.engine.min_pdu_len();
        if data.len() < min {
            return Err(CodecError::malformed(format!(
                "{} bytes is shorter than the minimum PDU length {min}",
                data.len()
            )));
        }
        if data.len() > self.max_decode_size {
            return Err(CodecError::buffer_too_small(format!(
                "{}-byte PDU exceeds the {}-byte decode limit",
                data.len(),
                self.max_decode_size
            )));
        }

        let pdu = self.engine.unpack(data)?;
        pdu.validate()?;
        Ok(pdu)
    }
}

/// Encodes a PDU with the default codec.
pub fn encode_e2ap_pdu(pdu: &E2apPdu) -> Result<EncodedPdu, CodecError> {
    E2apCodec::new().encode(pdu)
}

/// Decodes a PDU with the default codec.
pub fn decode_e2ap_pdu(data: &[u8]) -> Result<E2apPdu, CodecError> {
    E2apCodec::new().decode(data)
}

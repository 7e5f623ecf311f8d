//! Length-prefixed message framing.
//!
//! Every message, control keyword or data, travels the same way in both
//! directions:
//!
//! ```text
//! +----------------------+---------------------------+
//! | length               | payload                   |
//! | 4 bytes, i32 BE      | `length` bytes            |
//! +----------------------+---------------------------+
//! ```
//!
//! A zero length is legal and is used by the client as the end-of-upload
//! marker.

use crate::error::ProtocolError;
use crate::LENGTH_PREFIX_SIZE;
use bytes::{BufMut, BytesMut};

/// Largest payload representable by the signed 32-bit prefix.
pub const MAX_FRAMEABLE_SIZE: u32 = i32::MAX as u32;

/// Encodes `payload` as `i32_be(len) ++ payload`.
pub fn encode_message(payload: &[u8]) -> Result<BytesMut, ProtocolError> {
    if payload.len() > MAX_FRAMEABLE_SIZE as usize {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len() as u64,
            max: MAX_FRAMEABLE_SIZE as u64,
        });
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_i32(payload.len() as i32);
    buf.put_slice(payload);
    Ok(buf)
}

/// Interprets a 4-byte prefix as a big-endian signed length.
pub fn decode_length(prefix: [u8; LENGTH_PREFIX_SIZE]) -> Result<u32, ProtocolError> {
    let len = i32::from_be_bytes(prefix);
    if len < 0 {
        return Err(ProtocolError::NegativeLength(len));
    }
    Ok(len as u32)
}

/// Like [`decode_length`], but also rejects lengths above `max`.
pub fn decode_length_bounded(
    prefix: [u8; LENGTH_PREFIX_SIZE],
    max: u32,
) -> Result<u32, ProtocolError> {
    let len = decode_length(prefix)?;
    if len > max {
        return Err(ProtocolError::FrameTooLarge {
            size: len as u64,
            max: max as u64,
        });
    }
    Ok(len)
}

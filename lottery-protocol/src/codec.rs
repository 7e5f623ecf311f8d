//! Buffered decoder for length-prefixed messages.

use crate::error::ProtocolError;
use crate::frame::decode_length_bounded;
use crate::{LENGTH_PREFIX_SIZE, MAX_PAYLOAD_SIZE};
use bytes::{Buf, Bytes, BytesMut};

/// Accumulates bytes received in arbitrary slices and yields whole payloads.
pub struct FrameDecoder {
    buffer: BytesMut,
    max_payload: u32,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_SIZE)
    }

    pub fn with_max_payload(max_payload: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            max_payload,
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next payload from the buffer.
    ///
    /// Returns `Ok(None)` until a complete message is buffered. Nothing is
    /// consumed until the whole message is available.
    pub fn decode_frame(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        if self.buffer.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let prefix = [self.buffer[0], self.buffer[1], self.buffer[2], self.buffer[3]];
        let len = decode_length_bounded(prefix, self.max_payload)? as usize;

        if self.buffer.len() < LENGTH_PREFIX_SIZE + len {
            return Ok(None);
        }

        self.buffer.advance(LENGTH_PREFIX_SIZE);
        Ok(Some(self.buffer.split_to(len).freeze()))
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_message;

    #[test]
    fn test_partial_frame_decoding() {
        let encoded = encode_message(b"Santiago,Lorca,30904465,1999-03-17,2201,1").unwrap();

        let mut decoder = FrameDecoder::new();

        // Prefix only, then half the payload
        decoder.extend(&encoded[..2]);
        assert!(decoder.decode_frame().unwrap().is_none());
        decoder.extend(&encoded[2..10]);
        assert!(decoder.decode_frame().unwrap().is_none());
        assert_eq!(decoder.buffered(), 10);

        decoder.extend(&encoded[10..]);
        let payload = decoder.decode_frame().unwrap().unwrap();
        assert_eq!(&payload[..], b"Santiago,Lorca,30904465,1999-03-17,2201,1");
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_multiple_frames_in_buffer() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&encode_message(b"REQWINN").unwrap());
        decoder.extend(&encode_message(b"3").unwrap());
        decoder.extend(&encode_message(b"").unwrap());

        assert_eq!(&decoder.decode_frame().unwrap().unwrap()[..], b"REQWINN");
        assert_eq!(&decoder.decode_frame().unwrap().unwrap()[..], b"3");
        assert!(decoder.decode_frame().unwrap().unwrap().is_empty());
        assert!(decoder.decode_frame().unwrap().is_none());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut decoder = FrameDecoder::with_max_payload(4);
        decoder.extend(&encode_message(b"WINNERS").unwrap());
        let result = decoder.decode_frame();
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_negative_prefix_rejected() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0xFF, 0xFF, 0xFF, 0xFE]);
        let result = decoder.decode_frame();
        assert!(matches!(result, Err(ProtocolError::NegativeLength(-2))));
    }

    #[test]
    fn test_decoder_buffered() {
        let mut decoder = FrameDecoder::default();
        assert_eq!(decoder.buffered(), 0);

        decoder.extend(b"some data");
        assert_eq!(decoder.buffered(), 9);

        decoder.clear();
        assert_eq!(decoder.buffered(), 0);
    }
}

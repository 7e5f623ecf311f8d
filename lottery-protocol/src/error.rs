//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors: the bytes arrived, but they do not make sense.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u64, max: u64 },

    #[error("unexpected reply keyword: {}", String::from_utf8_lossy(.0))]
    UnexpectedReply(Vec<u8>),

    #[error("invalid UTF-8 in payload")]
    InvalidUtf8,
}

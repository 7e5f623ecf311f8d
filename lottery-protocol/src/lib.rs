//! # lottery-protocol
//!
//! Wire protocol spoken between a lottery agency and the lottery server.
//!
//! This crate provides:
//! - Length-prefixed framing (4-byte big-endian signed length + payload)
//! - The fixed control keywords and the decoded server reply type
//! - The batcher that turns bet records into bounded chunks
//!
//! It performs no I/O; the client crate drives sockets on top of it.

pub mod batch;
pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use batch::{split_into_chunks, Batcher, Chunk};
pub use codec::FrameDecoder;
pub use error::ProtocolError;
pub use frame::{decode_length, decode_length_bounded, encode_message};
pub use message::{Keyword, Reply, ReplyKind, WinnerList};

/// Size of the length prefix in front of every message.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default upper bound for a payload accepted from the server (16 MiB).
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Default port of the lottery server.
pub const DEFAULT_PORT: u16 = 12345;

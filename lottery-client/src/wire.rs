//! Byte-exact I/O over a stream socket.
//!
//! A single `write`/`read` on a socket may move fewer bytes than asked for.
//! These helpers loop until exactly the requested amount has moved, and
//! fail on the first error or on a closed connection. On failure nothing
//! partial is returned and the connection should be considered unusable.

use crate::error::{ClientError, Phase};
use bytes::Bytes;
use lottery_protocol::{decode_length_bounded, encode_message, LENGTH_PREFIX_SIZE};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Writes all of `bytes`, looping over partial writes, then flushes.
pub async fn write_exact<W>(conn: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0;
    while written < bytes.len() {
        let n = conn.write(&bytes[written..]).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "connection accepted no data with {} of {} bytes written",
                    written,
                    bytes.len()
                ),
            ));
        }
        written += n;
    }
    conn.flush().await
}

/// Reads exactly `length` bytes, looping over partial reads.
pub async fn read_exact<R>(conn: &mut R, length: usize) -> io::Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; length];
    let mut filled = 0;
    while filled < length {
        let n = conn.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection closed after {} of {} bytes", filled, length),
            ));
        }
        filled += n;
    }
    Ok(Bytes::from(buf))
}

/// Frames `payload` and writes it.
pub async fn send_message<W>(conn: &mut W, payload: &[u8], phase: Phase) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let encoded = encode_message(payload).map_err(ClientError::protocol(phase))?;
    tracing::debug!("Sending {} byte message ({})", payload.len(), phase);
    write_exact(conn, &encoded)
        .await
        .map_err(ClientError::io(phase))
}

/// Reads one framed payload of at most `max_payload` bytes.
pub async fn recv_message<R>(conn: &mut R, max_payload: u32, phase: Phase) -> Result<Bytes, ClientError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let prefix = read_exact(conn, LENGTH_PREFIX_SIZE)
        .await
        .map_err(ClientError::io(phase))?;
    let prefix = [prefix[0], prefix[1], prefix[2], prefix[3]];
    let len = decode_length_bounded(prefix, max_payload).map_err(ClientError::protocol(phase))?;

    tracing::debug!("Receiving {} byte message ({})", len, phase);
    read_exact(conn, len as usize)
        .await
        .map_err(ClientError::io(phase))
}

/// Reads `\n`-terminated text lines of at most `max_len` bytes each.
///
/// Bytes of an unfinished line stay in the reader, so a read cut short by a
/// timeout or by cancellation resumes the same line on the next call. The
/// terminator (and a preceding `\r`) is stripped.
#[derive(Debug)]
pub struct LineReader {
    buf: Vec<u8>,
    max_len: usize,
    overflowed: bool,
}

impl LineReader {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_len: max_len.max(1),
            overflowed: false,
        }
    }

    /// Returns true if part of a line has been consumed but not yet returned.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty() || self.overflowed
    }

    /// Reads the next line. A line longer than `max_len` is consumed up to
    /// its terminator and reported as `InvalidData`.
    pub async fn read_line<R>(&mut self, conn: &mut R) -> io::Result<String>
    where
        R: AsyncBufRead + Unpin + ?Sized,
    {
        loop {
            let budget = (self.max_len - self.buf.len()) as u64;
            let n = (&mut *conn).take(budget).read_until(b'\n', &mut self.buf).await?;

            if self.buf.last() == Some(&b'\n') {
                let mut line = std::mem::take(&mut self.buf);
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if std::mem::replace(&mut self.overflowed, false) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line exceeds {} bytes", self.max_len),
                    ));
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }

            if n == 0 {
                self.buf.clear();
                self.overflowed = false;
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before end of line",
                ));
            }

            // Keep consuming the oversized line until its terminator
            if self.buf.len() >= self.max_len {
                self.buf.clear();
                self.overflowed = true;
            }
        }
    }
}

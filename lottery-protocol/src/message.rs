//! Control keywords and server replies.
//!
//! Control messages carry no type byte: a keyword is an ordinary framed
//! payload, and the receiver knows to expect one from the protocol phase it
//! is in.

use crate::error::ProtocolError;
use bytes::Bytes;
use std::fmt;

/// Fixed control keywords (exact ASCII, case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// Client → server: a bet upload follows.
    BetData,
    /// Client → server: request the winners of the sending agency.
    ReqWinn,
    /// Server → client: a framed winner list follows.
    Winners,
    /// Server → client: the draw has not happened yet.
    NoWinn,
}

impl Keyword {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Keyword::BetData => b"BETDATA",
            Keyword::ReqWinn => b"REQWINN",
            Keyword::Winners => b"WINNERS",
            Keyword::NoWinn => b"NOWINN",
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"BETDATA" => Some(Keyword::BetData),
            b"REQWINN" => Some(Keyword::ReqWinn),
            b"WINNERS" => Some(Keyword::Winners),
            b"NOWINN" => Some(Keyword::NoWinn),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Every keyword is ASCII
        f.write_str(std::str::from_utf8(self.as_bytes()).unwrap_or("?"))
    }
}

/// First half of a server reply: what the keyword announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyKind {
    Winners,
    NoWinner,
    Unrecognized(Bytes),
}

impl ReplyKind {
    /// Classifies a reply keyword payload. Client-side keywords are not valid
    /// replies and classify as unrecognized.
    pub fn from_keyword(payload: Bytes) -> Self {
        match Keyword::from_bytes(&payload) {
            Some(Keyword::Winners) => ReplyKind::Winners,
            Some(Keyword::NoWinn) => ReplyKind::NoWinner,
            _ => ReplyKind::Unrecognized(payload),
        }
    }
}

/// A fully decoded reply to a `REQWINN` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Winners(WinnerList),
    NoWinner,
    Unrecognized(Bytes),
}

/// Documents of the winning bets of one agency.
///
/// An empty payload is its own outcome rather than a list holding one empty
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinnerList {
    Empty,
    Documents(Vec<String>),
}

impl WinnerList {
    /// Parses a comma-joined list of document numbers.
    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.is_empty() {
            return Ok(WinnerList::Empty);
        }
        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
        Ok(WinnerList::Documents(
            text.split(',').map(str::to_string).collect(),
        ))
    }

    /// Number of winners.
    pub fn count(&self) -> usize {
        match self {
            WinnerList::Empty => 0,
            WinnerList::Documents(docs) => docs.len(),
        }
    }

    pub fn documents(&self) -> &[String] {
        match self {
            WinnerList::Empty => &[],
            WinnerList::Documents(docs) => docs,
        }
    }
}

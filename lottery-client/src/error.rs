//! Client error types.

use crate::config::ConfigError;
use lottery_protocol::ProtocolError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Protocol step an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Announce,
    Upload,
    Ack,
    EndOfData,
    Request,
    Reply,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Connect => write!(f, "connect"),
            Phase::Announce => write!(f, "announce"),
            Phase::Upload => write!(f, "upload"),
            Phase::Ack => write!(f, "ack"),
            Phase::EndOfData => write!(f, "end_of_data"),
            Phase::Request => write!(f, "request"),
            Phase::Reply => write!(f, "reply"),
        }
    }
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error during {phase}: {source}")]
    Io {
        phase: Phase,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol error during {phase}: {source}")]
    Protocol {
        phase: Phase,
        #[source]
        source: ProtocolError,
    },

    #[error("timeout during {phase}")]
    Timeout { phase: Phase },

    #[error("failed to read records from '{}': {source}", path.display())]
    Records {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bet: {0}")]
    InvalidBet(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub(crate) fn io(phase: Phase) -> impl FnOnce(std::io::Error) -> Self {
        move |source| ClientError::Io { phase, source }
    }

    pub(crate) fn protocol(phase: Phase) -> impl FnOnce(ProtocolError) -> Self {
        move |source| ClientError::Protocol { phase, source }
    }

    /// Returns the protocol step the error happened in, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ClientError::Io { phase, .. }
            | ClientError::Protocol { phase, .. }
            | ClientError::Timeout { phase } => Some(*phase),
            _ => None,
        }
    }
}

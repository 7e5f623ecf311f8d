//! Winner polling phase.
//!
//! Each attempt opens a fresh connection:
//!
//! ```text
//! client                                  server
//!   | -- [len]REQWINN -------------------->  |
//!   | -- [len]<client id> ---------------->  |
//!   | <-------------------- [len]NOWINN      |   -> close, back off, retry
//!   | <-------------------- [len]WINNERS     |
//!   | <-------------------- [len]doc,doc...  |   -> done
//! ```
//!
//! The winners only exist once every agency has finished uploading, so the
//! poller keeps asking until it gets them or shutdown is requested.

use crate::connection::Connector;
use crate::error::{ClientError, Phase};
use crate::shutdown::Shutdown;
use crate::wire;
use lottery_protocol::{Keyword, ProtocolError, Reply, ReplyKind, WinnerList, MAX_PAYLOAD_SIZE};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Default wait between a NOWINN reply and the next request.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Identifier whose winners are requested.
    pub client_id: String,
    /// Wait after each NOWINN.
    pub backoff: Duration,
    /// Largest reply payload accepted.
    pub max_reply_size: u32,
}

impl PollerConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            backoff: DEFAULT_BACKOFF,
            max_reply_size: MAX_PAYLOAD_SIZE,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_reply_size(mut self, max: u32) -> Self {
        self.max_reply_size = max;
        self
    }
}

/// How polling ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The server sent the winner list.
    Winners { winners: WinnerList, attempts: u32 },
    /// Shutdown was requested before the winners arrived.
    Cancelled { attempts: u32 },
}

impl PollOutcome {
    /// Number of request round-trips issued.
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Winners { attempts, .. } | PollOutcome::Cancelled { attempts } => *attempts,
        }
    }
}

/// Polls the server for this client's winners.
pub struct ResultPoller<C> {
    connector: C,
    config: PollerConfig,
}

impl<C: Connector> ResultPoller<C> {
    pub fn new(connector: C, config: PollerConfig) -> Self {
        Self { connector, config }
    }

    /// Requests the winners until they arrive, a request fails, or shutdown
    /// is requested.
    pub async fn run(&self, shutdown: &Shutdown) -> Result<PollOutcome, ClientError> {
        let mut attempts = 0;

        loop {
            if shutdown.is_requested() {
                return Ok(self.cancelled(attempts));
            }

            attempts += 1;
            let mut conn = self.connector.connect().await?;
            let reply = self.request(&mut conn, shutdown).await;
            if let Err(e) = conn.shutdown().await {
                tracing::debug!("Connection shutdown failed: {}", e);
            }

            match reply? {
                None => return Ok(self.cancelled(attempts)),
                Some(Reply::Winners(winners)) => {
                    tracing::info!(
                        "action: consulta_ganadores | result: success | cant_ganadores: {}",
                        winners.count()
                    );
                    return Ok(PollOutcome::Winners { winners, attempts });
                }
                Some(Reply::NoWinner) => {
                    tracing::debug!(
                        "No winners yet for client {} (attempt {}), retrying in {:?}",
                        self.config.client_id,
                        attempts,
                        self.config.backoff
                    );
                }
                Some(Reply::Unrecognized(keyword)) => {
                    let err = ClientError::Protocol {
                        phase: Phase::Reply,
                        source: ProtocolError::UnexpectedReply(keyword.to_vec()),
                    };
                    tracing::error!(
                        "action: consulta_ganadores | result: fail | client_id: {} | error: {}",
                        self.config.client_id,
                        err
                    );
                    return Err(err);
                }
            }

            tokio::select! {
                biased;

                _ = shutdown.requested() => return Ok(self.cancelled(attempts)),
                _ = tokio::time::sleep(self.config.backoff) => {}
            }
        }
    }

    /// One round-trip. Returns `None` if shutdown was requested while
    /// waiting for the reply; the request itself is always sent whole.
    async fn request<S>(&self, conn: &mut S, shutdown: &Shutdown) -> Result<Option<Reply>, ClientError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        wire::send_message(conn, Keyword::ReqWinn.as_bytes(), Phase::Request).await?;
        wire::send_message(conn, self.config.client_id.as_bytes(), Phase::Request).await?;

        tokio::select! {
            biased;

            _ = shutdown.requested() => Ok(None),
            reply = self.read_reply(conn) => reply.map(Some),
        }
    }

    async fn read_reply<S>(&self, conn: &mut S) -> Result<Reply, ClientError>
    where
        S: AsyncRead + Unpin,
    {
        let max = self.config.max_reply_size;
        let keyword = wire::recv_message(conn, max, Phase::Reply).await?;

        Ok(match ReplyKind::from_keyword(keyword) {
            ReplyKind::Winners => {
                let payload = wire::recv_message(conn, max, Phase::Reply).await?;
                Reply::Winners(
                    WinnerList::parse(&payload).map_err(ClientError::protocol(Phase::Reply))?,
                )
            }
            ReplyKind::NoWinner => Reply::NoWinner,
            ReplyKind::Unrecognized(keyword) => Reply::Unrecognized(keyword),
        })
    }

    fn cancelled(&self, attempts: u32) -> PollOutcome {
        tracing::info!(
            "action: consulta_ganadores | result: cancelled | client_id: {} | attempts: {}",
            self.config.client_id,
            attempts
        );
        PollOutcome::Cancelled { attempts }
    }
}

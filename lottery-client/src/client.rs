//! High-level client API.
//!
//! A [`Client`] runs the full agency flow: upload the bets over one
//! connection, then poll for the winners over fresh ones. Polling only starts
//! after a completed upload.

use crate::bet::Bet;
use crate::config::Config;
use crate::connection::{ConnectionConfig, Connector, TcpConnector};
use crate::error::ClientError;
use crate::poller::{PollOutcome, PollerConfig, ResultPoller};
use crate::records::load_records;
use crate::shutdown::Shutdown;
use crate::upload::{UploadConfig, UploadOutcome, UploadReport, UploadSession};
use std::path::Path;

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// How the upload ended.
    pub upload: UploadOutcome,
    /// How polling ended; `None` when the upload was aborted.
    pub poll: Option<PollOutcome>,
}

impl RunSummary {
    /// Returns true if shutdown cut the run short.
    pub fn is_cancelled(&self) -> bool {
        !self.upload.is_completed() || matches!(self.poll, Some(PollOutcome::Cancelled { .. }))
    }
}

/// High-level client for one agency.
pub struct Client<C = TcpConnector> {
    connector: C,
    upload: UploadConfig,
    poll: PollerConfig,
}

impl Client<TcpConnector> {
    /// Creates a TCP client from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let connector = TcpConnector::new(
            ConnectionConfig::new(config.server.address.clone())
                .with_connect_timeout(config.server.connect_timeout()),
        );
        let upload = UploadConfig::new(config.id.clone(), config.batch.max_amount)
            .with_ack_timeout(config.batch.ack_timeout());
        let poll = PollerConfig::new(config.id.clone())
            .with_backoff(config.poll.backoff())
            .with_max_reply_size(config.poll.max_reply_size);

        Self::new(connector, upload, poll)
    }
}

impl<C> Client<C>
where
    C: Connector + Sync,
{
    pub fn new(connector: C, upload: UploadConfig, poll: PollerConfig) -> Self {
        Self {
            connector,
            upload,
            poll,
        }
    }

    /// Returns the client identifier.
    pub fn id(&self) -> &str {
        &self.upload.client_id
    }

    /// Uploads `records` over a new connection.
    pub async fn upload<I>(&self, records: I, shutdown: &Shutdown) -> Result<UploadOutcome, ClientError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if shutdown.is_requested() {
            return Ok(UploadOutcome::Aborted(UploadReport::default()));
        }

        let stream = self.connector.connect().await.map_err(|e| {
            tracing::error!(
                "action: connect | result: fail | client_id: {} | error: {}",
                self.id(),
                e
            );
            e
        })?;

        UploadSession::new(stream, self.upload.clone())
            .run(records, shutdown)
            .await
    }

    /// Polls for the winners until they arrive or shutdown is requested.
    pub async fn poll_winners(&self, shutdown: &Shutdown) -> Result<PollOutcome, ClientError> {
        ResultPoller::new(&self.connector, self.poll.clone())
            .run(shutdown)
            .await
    }

    /// Uploads `records`, then polls for the winners.
    pub async fn run<I>(&self, records: I, shutdown: &Shutdown) -> Result<RunSummary, ClientError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let upload = self.upload(records, shutdown).await?;
        if !upload.is_completed() {
            return Ok(RunSummary { upload, poll: None });
        }

        let poll = self.poll_winners(shutdown).await?;
        Ok(RunSummary {
            upload,
            poll: Some(poll),
        })
    }

    /// Runs with the records of the bet file at `path`.
    pub async fn run_file(&self, path: impl AsRef<Path>, shutdown: &Shutdown) -> Result<RunSummary, ClientError> {
        let records = load_records(path).await?;
        self.run(records, shutdown).await
    }

    /// Runs with a single bet.
    pub async fn run_bet(&self, bet: &Bet, shutdown: &Shutdown) -> Result<RunSummary, ClientError> {
        let summary = self.run([bet.to_record()], shutdown).await?;
        if summary.upload.is_completed() {
            tracing::info!(
                "action: apuesta_enviada | result: success | dni: {} | numero: {}",
                bet.document,
                bet.number
            );
        }
        Ok(summary)
    }
}

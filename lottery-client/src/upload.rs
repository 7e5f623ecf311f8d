//! Bet upload phase.
//!
//! Wire sequence on one connection:
//!
//! ```text
//! client                                  server
//!   | -- [len]BETDATA -------------------->  |
//!   | -- [len]chunk ---------------------->  |
//!   | <------------------------ ack line\n   |   (advisory, repeated per chunk)
//!   | -- [0] ----------------------------->  |   (end of upload)
//! ```

use crate::error::{ClientError, Phase};
use crate::shutdown::Shutdown;
use crate::wire::{self, LineReader};
use lottery_protocol::{Batcher, Keyword};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Default wait for a chunk acknowledgment.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest acknowledgment line accepted.
pub const MAX_ACK_LEN: usize = 4096;

/// Upload configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Identifier appended to every record.
    pub client_id: String,
    /// Maximum records per chunk.
    pub max_batch_size: usize,
    /// How long to wait for each acknowledgment.
    pub ack_timeout: Duration,
}

impl UploadConfig {
    pub fn new(client_id: impl Into<String>, max_batch_size: usize) -> Self {
        Self {
            client_id: client_id.into(),
            max_batch_size,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }
}

/// Upload session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// Nothing sent yet.
    Init,
    /// BETDATA sent.
    Announced,
    /// At least one chunk sent.
    Streaming,
    /// End marker sent.
    Completed,
    /// An I/O or protocol error ended the session.
    Failed,
    /// Shutdown was requested before the end marker.
    Aborted,
}

/// Result of waiting for a chunk acknowledgment. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Received(String),
    Unavailable(String),
}

/// Counters for one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub chunks_sent: usize,
    pub records_sent: usize,
    /// Chunks whose ack was not received in time, or was unreadable.
    pub acks_missing: usize,
    /// Acks that arrived after their wait expired and were skipped.
    pub acks_late: usize,
}

/// How an upload ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed(UploadReport),
    Aborted(UploadReport),
}

impl UploadOutcome {
    pub fn report(&self) -> &UploadReport {
        match self {
            UploadOutcome::Completed(report) | UploadOutcome::Aborted(report) => report,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, UploadOutcome::Completed(_))
    }
}

/// Drives one upload over an exclusively owned connection.
pub struct UploadSession<S> {
    conn: BufReader<S>,
    acks: LineReader,
    /// Timed-out acks still expected on the wire, ahead of the next one.
    acks_owed: usize,
    config: UploadConfig,
    state: UploadState,
    report: UploadReport,
}

impl<S> UploadSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: UploadConfig) -> Self {
        Self {
            conn: BufReader::new(stream),
            acks: LineReader::new(MAX_ACK_LEN),
            acks_owed: 0,
            config,
            state: UploadState::Init,
            report: UploadReport::default(),
        }
    }

    /// Returns the session state.
    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Returns the counters so far.
    pub fn report(&self) -> &UploadReport {
        &self.report
    }

    /// Uploads `records` and shuts the connection down on every exit path.
    ///
    /// Shutdown is checked before the announcement, before every chunk and
    /// before the end marker, and interrupts acknowledgment waits.
    pub async fn run<I>(&mut self, records: I, shutdown: &Shutdown) -> Result<UploadOutcome, ClientError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let result = self.drive(records, shutdown).await;

        match &result {
            Ok(UploadOutcome::Completed(report)) => {
                tracing::info!(
                    "action: apuestas_enviadas | result: success | client_id: {} | chunks: {} | bets: {}",
                    self.config.client_id,
                    report.chunks_sent,
                    report.records_sent
                );
            }
            Ok(UploadOutcome::Aborted(report)) => {
                tracing::info!(
                    "action: upload_aborted | result: success | client_id: {} | chunks: {}",
                    self.config.client_id,
                    report.chunks_sent
                );
            }
            Err(e) => {
                self.state = UploadState::Failed;
                tracing::error!(
                    "action: apuestas_enviadas | result: fail | client_id: {} | error: {}",
                    self.config.client_id,
                    e
                );
            }
        }

        if let Err(e) = self.conn.get_mut().shutdown().await {
            tracing::debug!("Connection shutdown failed: {}", e);
        }
        result
    }

    async fn drive<I>(&mut self, records: I, shutdown: &Shutdown) -> Result<UploadOutcome, ClientError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if shutdown.is_requested() {
            return Ok(self.abort());
        }

        wire::send_message(&mut self.conn, Keyword::BetData.as_bytes(), Phase::Announce).await?;
        self.state = UploadState::Announced;
        tracing::debug!("Announced upload for client {}", self.config.client_id);

        let chunks = Batcher::new(
            records,
            self.config.max_batch_size,
            self.config.client_id.as_str(),
        );

        for chunk in chunks {
            if shutdown.is_requested() {
                return Ok(self.abort());
            }

            wire::send_message(&mut self.conn, chunk.as_bytes(), Phase::Upload).await?;
            self.state = UploadState::Streaming;
            self.report.chunks_sent += 1;
            self.report.records_sent += chunk.record_count();

            match self.await_ack(shutdown).await {
                Some(Ack::Received(line)) => {
                    tracing::info!("{}", line);
                }
                Some(Ack::Unavailable(reason)) => {
                    self.report.acks_missing += 1;
                    tracing::warn!(
                        "action: receive_ack | result: fail | client_id: {} | chunk: {} | error: {}",
                        self.config.client_id,
                        self.report.chunks_sent,
                        reason
                    );
                }
                None => return Ok(self.abort()),
            }
        }

        if shutdown.is_requested() {
            return Ok(self.abort());
        }

        wire::send_message(&mut self.conn, &[], Phase::EndOfData).await?;
        self.state = UploadState::Completed;
        Ok(UploadOutcome::Completed(self.report.clone()))
    }

    /// Waits for one acknowledgment line. Returns `None` if shutdown was
    /// requested while waiting.
    ///
    /// Acks arrive in chunk order. Lines owed to earlier chunks whose wait
    /// expired are read and skipped first, so each ack is matched to the
    /// chunk it belongs to.
    async fn await_ack(&mut self, shutdown: &Shutdown) -> Option<Ack> {
        let timeout = self.config.ack_timeout;

        let result = tokio::select! {
            biased;

            _ = shutdown.requested() => return None,
            result = tokio::time::timeout(timeout, self.read_ack()) => result,
        };

        Some(match result {
            Ok(Ok(line)) => Ack::Received(line),
            Ok(Err(e)) => Ack::Unavailable(e.to_string()),
            Err(_) => {
                self.acks_owed += 1;
                Ack::Unavailable(format!("no ack within {:?}", timeout))
            }
        })
    }

    async fn read_ack(&mut self) -> io::Result<String> {
        while self.acks_owed > 0 {
            let late = self.acks.read_line(&mut self.conn).await;
            self.acks_owed -= 1;
            self.report.acks_late += 1;
            tracing::debug!("Skipped late ack: {:?}", late);
        }
        self.acks.read_line(&mut self.conn).await
    }

    fn abort(&mut self) -> UploadOutcome {
        self.state = UploadState::Aborted;
        UploadOutcome::Aborted(self.report.clone())
    }
}

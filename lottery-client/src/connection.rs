//! Connection establishment.
//!
//! Each protocol phase takes exclusive ownership of the stream it is given
//! and releases it on every exit path. The poller opens a fresh connection
//! per attempt, so connections are produced through a [`Connector`].

use crate::error::{ClientError, Phase};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces connected byte streams.
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Opens a new connection.
    fn connect(&self) -> impl Future<Output = Result<Self::Stream, ClientError>> + Send;
}

impl<C: Connector + Sync> Connector for &C {
    type Stream = C::Stream;

    fn connect(&self) -> impl Future<Output = Result<Self::Stream, ClientError>> + Send {
        (**self).connect()
    }
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address as `host:port`; resolved on every connect.
    pub addr: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Plain TCP connector.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: ConnectionConfig,
}

impl TcpConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> impl Future<Output = Result<TcpStream, ClientError>> + Send {
        async move {
            tracing::debug!("Connecting to {}...", self.config.addr);

            let stream = tokio::time::timeout(
                self.config.connect_timeout,
                TcpStream::connect(self.config.addr.as_str()),
            )
            .await
            .map_err(|_| {
                tracing::debug!("Connection timeout");
                ClientError::Timeout {
                    phase: Phase::Connect,
                }
            })?
            .map_err(|e| {
                tracing::debug!("Connection failed: {}", e);
                ClientError::Io {
                    phase: Phase::Connect,
                    source: e,
                }
            })?;

            // Chunks are written as prefix + payload; don't let Nagle hold them
            stream.set_nodelay(true).ok();

            tracing::debug!("TCP connected to {}", self.config.addr);
            Ok(stream)
        }
    }
}

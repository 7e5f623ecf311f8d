//! # lottery-client
//!
//! Client library for a lottery agency.
//!
//! This crate provides:
//! - Byte-exact framed I/O over async streams
//! - The bet upload session (`BETDATA` phase)
//! - The winner poller (`REQWINN` phase)
//! - A cooperative shutdown gate observed at every blocking step
//! - Configuration loading and bet file reading

pub mod bet;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod poller;
pub mod records;
pub mod shutdown;
pub mod upload;
pub mod wire;

pub use bet::Bet;
pub use client::{Client, RunSummary};
pub use config::{Config, ConfigError};
pub use connection::{ConnectionConfig, Connector, TcpConnector};
pub use error::{ClientError, Phase};
pub use poller::{PollOutcome, PollerConfig, ResultPoller};
pub use records::load_records;
pub use shutdown::{listen_for_signals, Shutdown, ShutdownTrigger};
pub use upload::{Ack, UploadConfig, UploadOutcome, UploadReport, UploadSession, UploadState};

//! lottery-agency - Lottery agency client
//!
//! Uploads the agency's bets to the lottery server, then polls until the
//! draw winners for the agency are available.

use clap::{Parser, Subcommand};
use lottery_client::{
    listen_for_signals, shutdown, Bet, Client, ClientError, Config, ConfigError, PollOutcome,
    RunSummary, Shutdown,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lottery-agency")]
#[command(about = "Lottery agency client: uploads bets and polls for the winners")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Agency identifier (overrides config and CLI_ID)
    #[arg(long, global = true)]
    id: Option<String>,

    /// Server address as host:port (overrides config and CLI_SERVER_ADDRESS)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Maximum bets per chunk (overrides config and CLI_BATCH_MAXAMOUNT)
    #[arg(long, global = true)]
    max_batch: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the agency bet file, then poll for the winners (default)
    Run {
        /// Bet file (defaults to <data_dir>/agency-<id>.csv)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Upload the single bet described by NOMBRE, APELLIDO, DOCUMENTO,
    /// NACIMIENTO and NUMERO, then poll for the winners
    Bet,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            // Log through the default filter; the configured level is unknown
            init_logging("info");
            tracing::error!("action: config | result: fail | error: {}", e);
            return Err(e.into());
        }
    };

    init_logging(&config.log.level);

    tracing::info!(
        "action: config | result: success | client_id: {} | server_address: {} | batch_max_amount: {} | log_level: {}",
        config.id,
        config.server.address,
        config.batch.max_amount,
        config.log.level
    );

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(listen_for_signals(trigger));

    let client = Client::from_config(&config);
    let result = match cli.command.unwrap_or(Commands::Run { file: None }) {
        Commands::Run { file } => {
            let path = file.unwrap_or_else(|| config.records_path());
            client.run_file(&path, &shutdown).await
        }
        Commands::Bet => run_env_bet(&client, &config, &shutdown).await,
    };

    match result {
        Ok(summary) => {
            report(&config, &summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "action: exit | result: fail | client_id: {} | error: {}",
                config.id,
                e
            );
            Err(e.into())
        }
    }
}

/// Loads configuration (file, then env overrides, then flags) and validates it.
fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(id) = &cli.id {
        config.id = id.clone();
    }
    if let Some(server) = &cli.server {
        config.server.address = server.clone();
    }
    if let Some(max) = cli.max_batch {
        config.batch.max_amount = max;
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

async fn run_env_bet(client: &Client, config: &Config, shutdown: &Shutdown) -> Result<RunSummary, ClientError> {
    let bet = Bet::from_env(config.id.clone())?;
    client.run_bet(&bet, shutdown).await
}

fn report(config: &Config, summary: &RunSummary) {
    match &summary.poll {
        Some(PollOutcome::Winners { winners, attempts }) => {
            tracing::debug!("Winners after {} request(s): {:?}", attempts, winners.documents());
        }
        _ if summary.is_cancelled() => {
            tracing::info!(
                "action: client_shutdown | result: success | client_id: {}",
                config.id
            );
        }
        _ => {}
    }
    tracing::info!("action: exit | result: success | client_id: {}", config.id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "id: \"2\"\nbatch:\n  max_amount: 8\n").unwrap();

        let cli = Cli::parse_from([
            "lottery-agency",
            "--config",
            path.to_str().unwrap(),
            "--server",
            "127.0.0.1:9000",
            "--max-batch",
            "3",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.id, "2");
        assert_eq!(config.server.address, "127.0.0.1:9000");
        assert_eq!(config.batch.max_amount, 3);
    }

    #[test]
    fn test_invalid_flag_fails_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "id: \"2\"\n").unwrap();

        let cli = Cli::parse_from([
            "lottery-agency",
            "--config",
            path.to_str().unwrap(),
            "--max-batch",
            "0",
            "run",
        ]);
        assert!(matches!(load_config(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unreadable_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "lottery-agency",
            "--config",
            dir.path().join("missing.yaml").to_str().unwrap(),
        ]);
        assert!(matches!(load_config(&cli), Err(ConfigError::Io { .. })));
    }
}

//! Agency bet files.
//!
//! A bet file is plain text with one record per line, in the order the bets
//! must be uploaded. The file is read in full before batching starts.

use crate::error::ClientError;
use std::path::Path;

/// Reads every record line of the file at `path`.
///
/// Line terminators (`\n` or `\r\n`) are stripped. Every line is a record,
/// blank ones included; a final terminator does not start an extra one.
pub async fn load_records(path: impl AsRef<Path>) -> Result<Vec<String>, ClientError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ClientError::Records {
            path: path.to_path_buf(),
            source,
        })?;

    let records = parse_records(&content);
    tracing::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn parse_records(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

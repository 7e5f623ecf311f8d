//! A single bet placed at an agency.

use crate::error::ClientError;
use std::fmt;

/// Environment variables a bet is read from, in record order.
pub const BET_ENV_VARS: [&str; 5] = ["NOMBRE", "APELLIDO", "DOCUMENTO", "NACIMIENTO", "NUMERO"];

/// One bet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    pub agency: String,
    pub first_name: String,
    pub last_name: String,
    pub document: String,
    pub birthdate: String,
    pub number: String,
}

impl Bet {
    /// Reads the bet for `agency` from the process environment.
    pub fn from_env(agency: impl Into<String>) -> Result<Self, ClientError> {
        Self::from_lookup(agency, |key| std::env::var(key).ok())
    }

    /// Reads the bet for `agency` through `lookup`. Every field is required
    /// and none may contain a comma or a line break.
    pub fn from_lookup<F>(agency: impl Into<String>, lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let field = |key: &str| -> Result<String, ClientError> {
            let value = lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ClientError::InvalidBet(format!("{} is not set", key)))?;
            if value.contains([',', '\n', '\r']) {
                return Err(ClientError::InvalidBet(format!(
                    "{} contains a separator: {:?}",
                    key, value
                )));
            }
            Ok(value)
        };

        Ok(Self {
            agency: agency.into(),
            first_name: field("NOMBRE")?,
            last_name: field("APELLIDO")?,
            document: field("DOCUMENTO")?,
            birthdate: field("NACIMIENTO")?,
            number: field("NUMERO")?,
        })
    }

    /// Renders the bet as an upload record. The agency is not included; the
    /// batcher appends it.
    pub fn to_record(&self) -> String {
        [
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.document.as_str(),
            self.birthdate.as_str(),
            self.number.as_str(),
        ]
        .join(",")
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agency {} | {} {} | dni: {} | numero: {}",
            self.agency, self.first_name, self.last_name, self.document, self.number
        )
    }
}

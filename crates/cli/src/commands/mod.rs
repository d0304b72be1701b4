//! Command implementations.

pub mod credentials;
pub mod export;
pub mod fetch;

use std::io::Write;

use partner_map_dashboard::config::{ConfigError, SalesforceConfig};
use partner_map_dashboard::credentials::{CredentialsError, SalesforceCredentials};
use partner_map_dashboard::queries::QueryFileError;
use partner_map_dashboard::salesforce::{SalesforceClient, SalesforceError};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Query file error: {0}")]
    QueryFile(#[from] QueryFileError),

    #[error("Salesforce error: {0}")]
    Salesforce(#[from] SalesforceError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load Salesforce settings, reading `.env` first if present.
///
/// # Errors
///
/// Returns `CliError::Config` for unparseable variables.
pub fn load_config() -> Result<SalesforceConfig, CliError> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();
    Ok(SalesforceConfig::from_env()?)
}

/// Read the credentials file and log in.
///
/// The file is read before the client is built, so a missing file fails
/// without any network traffic.
///
/// # Errors
///
/// Returns `CliError::Credentials` or `CliError::Salesforce`.
pub async fn connect(config: &SalesforceConfig) -> Result<SalesforceClient, CliError> {
    let credentials = SalesforceCredentials::from_file(&config.credentials_file)?;
    let client = SalesforceClient::new(config)?;
    client.authenticate(&credentials).await?;
    Ok(client)
}

/// Write each item as one line of JSON.
///
/// # Errors
///
/// Returns `CliError::Json` or `CliError::Io`.
pub fn write_json_lines<W, T>(mut out: W, items: impl IntoIterator<Item = T>) -> Result<usize, CliError>
where
    W: Write,
    T: Serialize,
{
    let mut written = 0;
    for item in items {
        serde_json::to_writer(&mut out, &item)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

//! Credential check.
//!
//! # Usage
//!
//! ```bash
//! pm-cli check-credentials
//! ```
//!
//! # Environment Variables
//!
//! - `SALESFORCE_CREDENTIALS_FILE` - Credentials file (default: salesforce_login.txt)
//! - `SALESFORCE_LOGIN_URL` - Login host (default: <https://login.salesforce.com>)

use std::io::Write;

use partner_map_dashboard::config::SalesforceConfig;
use partner_map_dashboard::credentials::SalesforceCredentials;
use partner_map_dashboard::salesforce::SalesforceClient;

use super::CliError;

/// Log in once and print the instance URL.
///
/// # Errors
///
/// Returns an error if the credentials file is missing or the login is
/// rejected.
pub async fn check(config: &SalesforceConfig) -> Result<(), CliError> {
    let credentials = SalesforceCredentials::from_file(&config.credentials_file)?;
    let client = SalesforceClient::new(config)?;
    let session = client.authenticate(&credentials).await?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "Logged in. Instance: {}", session.instance_url)?;
    Ok(())
}

//! One-shot startup: credentials, login, fetch, join.
//!
//! Runs before the server binds. Any failure aborts the process; there is no
//! retry and no partially loaded dashboard.

use chrono::Utc;
use tracing::instrument;

use crate::config::SalesforceConfig;
use crate::credentials::SalesforceCredentials;
use crate::error::StartupError;
use crate::map::DashboardContext;
use crate::queries::QuerySet;
use crate::salesforce::SalesforceClient;

/// Load credentials and queries, log in once, fetch all four tables and
/// build the dashboard context.
///
/// Credentials are read before any network call, so a missing file fails
/// fast.
///
/// # Errors
///
/// Returns the first credentials, query-file or Salesforce failure.
#[instrument(skip(config), fields(login_url = %config.login_url))]
pub async fn load_context(config: &SalesforceConfig) -> Result<DashboardContext, StartupError> {
    let credentials = SalesforceCredentials::from_file(&config.credentials_file)?;
    let queries = QuerySet::load(&config.queries_dir)?;

    let client = SalesforceClient::new(config)?;
    client.authenticate(&credentials).await?;

    let tables = client.fetch_snapshot(&queries).await?;
    let context = DashboardContext::from_tables(tables, Utc::now());

    tracing::info!(
        rows = context.rows().len(),
        sellers = context.sellers().len(),
        categories = context.categories().len(),
        dropped = context.dropped().total(),
        "Dashboard data loaded"
    );
    Ok(context)
}

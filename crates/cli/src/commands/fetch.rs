//! Fetch one source table.
//!
//! # Usage
//!
//! ```bash
//! pm-cli fetch materials > materials.jsonl
//! ```

use partner_map_dashboard::config::SalesforceConfig;
use partner_map_dashboard::queries::{QueryKind, StoredQuery};

use super::{CliError, connect, write_json_lines};

/// Run the stored query for `kind` and print its records as JSON lines.
///
/// Records are printed as returned by Salesforce, minus `attributes`.
///
/// # Errors
///
/// Returns an error if the query file is missing, the login fails or the
/// query is rejected.
pub async fn table(config: &SalesforceConfig, kind: QueryKind) -> Result<(), CliError> {
    let query = StoredQuery::load(&config.queries_dir, kind)?;
    let client = connect(config).await?;

    let records = client.query_all(&query.soql).await?;
    let written = write_json_lines(std::io::stdout().lock(), records)?;

    tracing::info!(table = %kind, records = written, "Fetch complete");
    Ok(())
}

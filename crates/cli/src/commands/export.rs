//! Export the joined cart table.
//!
//! # Usage
//!
//! ```bash
//! pm-cli export                     # JSON lines on stdout
//! pm-cli export --output cart.jsonl
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use partner_map_dashboard::config::SalesforceConfig;
use partner_map_dashboard::pipeline::build_cart_table;
use partner_map_dashboard::queries::QuerySet;

use super::{CliError, connect, write_json_lines};

/// Fetch all four tables, join them and write one JSON line per cart row.
///
/// # Errors
///
/// Returns an error if any query file is missing, the login or a query
/// fails, or the output cannot be written.
pub async fn cart(config: &SalesforceConfig, output: Option<&Path>) -> Result<(), CliError> {
    let queries = QuerySet::load(&config.queries_dir)?;
    let client = connect(config).await?;

    let tables = client.fetch_snapshot(&queries).await?;
    let outcome = build_cart_table(&tables);

    let written = match output {
        Some(path) => write_json_lines(BufWriter::new(File::create(path)?), &outcome.rows)?,
        None => write_json_lines(std::io::stdout().lock(), &outcome.rows)?,
    };

    tracing::info!(
        rows = written,
        dropped = outcome.dropped.total(),
        "Export complete"
    );
    Ok(())
}

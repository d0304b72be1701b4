//! Stored SOQL queries.
//!
//! Each source table is defined by a plain-text file in the queries directory
//! (`accounts_query`, `materials_query`, `orders_query`, `cart_query`). Files
//! may span several lines for readability; line breaks are collapsed before
//! the text is sent to Salesforce.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Errors that can occur while loading a stored query.
#[derive(Debug, Error)]
pub enum QueryFileError {
    /// The query file does not exist or could not be read.
    #[error("failed to read query {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The query file contains only whitespace.
    #[error("query {} is empty", .path.display())]
    Empty { path: PathBuf },
}

/// The four source tables the dashboard is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Accounts,
    Materials,
    Orders,
    Cart,
}

impl QueryKind {
    /// All kinds, in the order they are fetched at startup.
    pub const ALL: [Self; 4] = [Self::Accounts, Self::Materials, Self::Orders, Self::Cart];

    /// Table name as used on the command line and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Materials => "materials",
            Self::Orders => "orders",
            Self::Cart => "cart",
        }
    }

    /// File name of the stored query inside the queries directory.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}_query", self.as_str())
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown table '{s}' (expected accounts, materials, orders or cart)"))
    }
}

/// A SOQL query loaded from disk, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuery {
    pub kind: QueryKind,
    pub soql: String,
}

impl StoredQuery {
    /// Load the query for `kind` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns `QueryFileError::Io` if the file cannot be read and
    /// `QueryFileError::Empty` if it holds no query text.
    pub fn load(dir: &Path, kind: QueryKind) -> Result<Self, QueryFileError> {
        let path = dir.join(kind.file_name());
        let contents = std::fs::read_to_string(&path).map_err(|source| QueryFileError::Io {
            path: path.clone(),
            source,
        })?;

        let soql = collapse_lines(&contents);
        if soql.is_empty() {
            return Err(QueryFileError::Empty { path });
        }

        Ok(Self { kind, soql })
    }
}

/// All four stored queries.
#[derive(Debug, Clone)]
pub struct QuerySet {
    pub accounts: StoredQuery,
    pub materials: StoredQuery,
    pub orders: StoredQuery,
    pub cart: StoredQuery,
}

impl QuerySet {
    /// Load every stored query from `dir`.
    ///
    /// # Errors
    ///
    /// Returns the first `QueryFileError` encountered.
    pub fn load(dir: &Path) -> Result<Self, QueryFileError> {
        Ok(Self {
            accounts: StoredQuery::load(dir, QueryKind::Accounts)?,
            materials: StoredQuery::load(dir, QueryKind::Materials)?,
            orders: StoredQuery::load(dir, QueryKind::Orders)?,
            cart: StoredQuery::load(dir, QueryKind::Cart)?,
        })
    }
}

/// Join lines with single spaces so a clause split across lines stays valid.
fn collapse_lines(contents: &str) -> String {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

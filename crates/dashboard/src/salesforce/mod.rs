//! Salesforce API client.
//!
//! Provides read-only access to the CRM records the dashboard is built from:
//! accounts, materials, orders and cart items.
//!
//! # Architecture
//!
//! - Two-step access: SOAP `login` (username + password + security token)
//!   yields a session id, which is then used as a bearer token for the REST
//!   query endpoint
//! - One session per process; `authenticate` is idempotent
//! - `query_all` follows `nextRecordsUrl` pagination and strips the
//!   per-record `attributes` metadata
//! - All four tables are fetched once at startup; a failure aborts startup

pub mod auth;
pub mod client;

pub use auth::SalesforceSession;
pub use client::{Record, SalesforceClient};

use partner_map_core::{Account, CartItem, Material, Order};
use thiserror::Error;

/// Errors that can occur when interacting with the Salesforce API.
#[derive(Debug, Error)]
pub enum SalesforceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login was rejected (invalid username, password or security token).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A query was attempted before `authenticate`.
    #[error("No session - Salesforce authentication required")]
    NotAuthenticated,

    /// The session has expired.
    #[error("Session expired")]
    SessionExpired,

    /// The query endpoint returned an error response.
    #[error("Query failed (HTTP {status}): {}", format_api_errors(.errors))]
    Query { status: u16, errors: Vec<ApiError> },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The login response was missing an expected element or held an
    /// unusable URL.
    #[error("Malformed login response: {0}")]
    MalformedLogin(String),
}

/// An error entry returned by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "errorCode")]
    pub error_code: String,
}

fn format_api_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.error_code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The four source tables, fetched once at startup.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub accounts: Vec<Account>,
    pub materials: Vec<Material>,
    pub orders: Vec<Order>,
    pub cart: Vec<CartItem>,
}

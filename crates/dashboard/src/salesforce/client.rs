//! Salesforce REST query client.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::{Deserialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use super::auth::{SalesforceSession, login};
use super::{ApiError, SalesforceError, SourceTables};
use crate::config::SalesforceConfig;
use crate::credentials::SalesforceCredentials;
use crate::queries::{QuerySet, StoredQuery};

/// A single record with its `attributes` metadata removed.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Metadata key Salesforce attaches to every record.
const ATTRIBUTES_FIELD: &str = "attributes";

/// Salesforce API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct SalesforceClient {
    inner: Arc<SalesforceClientInner>,
}

struct SalesforceClientInner {
    client: reqwest::Client,
    login_url: String,
    api_version: String,
    session: RwLock<Option<SalesforceSession>>,
}

/// One page of a REST query response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    total_size: u64,
    done: bool,
    #[serde(default)]
    next_records_url: Option<String>,
    records: Vec<Record>,
}

impl SalesforceClient {
    /// Create a new client without a session.
    ///
    /// # Errors
    ///
    /// Returns `SalesforceError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SalesforceConfig) -> Result<Self, SalesforceError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(SalesforceClientInner {
                client,
                login_url: config.login_url.trim_end_matches('/').to_string(),
                api_version: config.api_version.clone(),
                session: RwLock::new(None),
            }),
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in, unless a live session is already cached.
    ///
    /// Calling this twice performs a single login.
    ///
    /// # Errors
    ///
    /// Returns `SalesforceError::AuthenticationFailed` if the credentials are
    /// rejected.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn authenticate(
        &self,
        credentials: &SalesforceCredentials,
    ) -> Result<SalesforceSession, SalesforceError> {
        let mut guard = self.inner.session.write().await;

        if let Some(session) = guard.as_ref()
            && !session.is_expired()
        {
            tracing::debug!("Reusing cached Salesforce session");
            return Ok(session.clone());
        }

        let session = login(
            &self.inner.client,
            &self.inner.login_url,
            &self.inner.api_version,
            credentials,
        )
        .await?;
        tracing::info!(instance = %session.instance_url, "Salesforce login succeeded");

        *guard = Some(session.clone());
        Ok(session)
    }

    /// Check if we have a valid (non-expired) session.
    pub async fn is_authenticated(&self) -> bool {
        self.inner
            .session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| !s.is_expired())
    }

    async fn current_session(&self) -> Result<SalesforceSession, SalesforceError> {
        match self.inner.session.read().await.as_ref() {
            Some(session) if session.is_expired() => Err(SalesforceError::SessionExpired),
            Some(session) => Ok(session.clone()),
            None => Err(SalesforceError::NotAuthenticated),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Run a SOQL query and return every record across all result pages.
    ///
    /// # Errors
    ///
    /// Returns `SalesforceError::NotAuthenticated` before `authenticate`,
    /// `SalesforceError::Query` if the backend rejects the query, and
    /// `SalesforceError::Http`/`Parse` on transport or decoding failures.
    #[instrument(skip(self, soql), fields(soql_len = soql.len()))]
    pub async fn query_all(&self, soql: &str) -> Result<Vec<Record>, SalesforceError> {
        let session = self.current_session().await?;
        let query_url = self.endpoint(&session, &format!("services/data/v{}/query", self.inner.api_version))?;

        let mut page = self
            .fetch_page(&session, self.inner.client.get(query_url).query(&[("q", soql)]))
            .await?;
        let total = page.total_size;
        let mut records = Vec::new();

        loop {
            records.extend(page.records.into_iter().map(strip_attributes));
            match page.next_records_url {
                Some(next) if !page.done => {
                    let next_url = self.endpoint(&session, &next)?;
                    page = self
                        .fetch_page(&session, self.inner.client.get(next_url))
                        .await?;
                }
                _ => break,
            }
        }

        tracing::debug!(total, fetched = records.len(), "Query complete");
        Ok(records)
    }

    /// Run a SOQL query and deserialize each record into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`query_all`](Self::query_all), plus `SalesforceError::Parse`
    /// if a record does not match `T`.
    pub async fn query_as<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>, SalesforceError> {
        self.query_all(soql)
            .await?
            .into_iter()
            .map(|record| serde_json::from_value(serde_json::Value::Object(record)).map_err(Into::into))
            .collect()
    }

    /// Fetch all four source tables, in order.
    ///
    /// # Errors
    ///
    /// Returns the first query failure; nothing is retried.
    #[instrument(skip(self, queries))]
    pub async fn fetch_snapshot(&self, queries: &QuerySet) -> Result<SourceTables, SalesforceError> {
        let accounts = self.fetch_table(&queries.accounts).await?;
        let materials = self.fetch_table(&queries.materials).await?;
        let orders = self.fetch_table(&queries.orders).await?;
        let cart = self.fetch_table(&queries.cart).await?;

        Ok(SourceTables {
            accounts,
            materials,
            orders,
            cart,
        })
    }

    async fn fetch_table<T: DeserializeOwned>(&self, query: &StoredQuery) -> Result<Vec<T>, SalesforceError> {
        let rows: Vec<T> = self.query_as(&query.soql).await?;
        tracing::info!(table = %query.kind, rows = rows.len(), "Fetched Salesforce table");
        Ok(rows)
    }

    fn endpoint(&self, session: &SalesforceSession, path: &str) -> Result<Url, SalesforceError> {
        session
            .instance_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SalesforceError::MalformedLogin(format!("cannot build query URL: {e}")))
    }

    async fn fetch_page(
        &self,
        session: &SalesforceSession,
        request: reqwest::RequestBuilder,
    ) -> Result<QueryResponse, SalesforceError> {
        let response = request
            .bearer_auth(session.session_id.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SalesforceError::SessionExpired);
        }

        let body = response.text().await?;
        let errors: Vec<ApiError> = serde_json::from_str(&body).unwrap_or_else(|_| {
            vec![ApiError {
                message: body.clone(),
                error_code: "UNKNOWN_ERROR".to_string(),
            }]
        });
        Err(SalesforceError::Query {
            status: status.as_u16(),
            errors,
        })
    }
}

/// Drop the per-record metadata Salesforce attaches to every result.
fn strip_attributes(mut record: Record) -> Record {
    record.remove(ATTRIBUTES_FIELD);
    record
}

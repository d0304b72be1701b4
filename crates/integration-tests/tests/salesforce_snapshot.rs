//! Integration tests for the Salesforce client and startup load.
//!
//! These run against [`MockSalesforce`], a local server that speaks the SOAP
//! login and the paginated REST query endpoint.
//!
//! Run with: cargo test -p partner-map-integration-tests

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::Path;
use std::time::Duration;

use partner_map_dashboard::config::SalesforceConfig;
use partner_map_dashboard::credentials::SalesforceCredentials;
use partner_map_dashboard::error::StartupError;
use partner_map_dashboard::queries::QuerySet;
use partner_map_dashboard::salesforce::{SalesforceClient, SalesforceError};
use partner_map_dashboard::startup::load_context;
use partner_map_integration_tests::{MockSalesforce, PASSWORD, SECURITY_TOKEN, USERNAME};

fn config(mock: &MockSalesforce, dir: &Path) -> SalesforceConfig {
    SalesforceConfig {
        credentials_file: dir.join("salesforce_login.txt"),
        queries_dir: dir.join("queries"),
        login_url: mock.url(),
        api_version: "59.0".to_string(),
        timeout: Duration::from_secs(10),
    }
}

fn write_credentials(dir: &Path, password: &str) {
    std::fs::write(
        dir.join("salesforce_login.txt"),
        format!("{USERNAME}\n{password}\n{SECURITY_TOKEN}\n"),
    )
    .unwrap();
}

fn write_queries(dir: &Path) {
    let queries = dir.join("queries");
    std::fs::create_dir_all(&queries).unwrap();
    std::fs::write(
        queries.join("accounts_query"),
        "SELECT Id, Name, BillingLatitude, BillingLongitude,\n       Segment__c, IsBuyer__c, IsSeller__c\nFROM Account\n",
    )
    .unwrap();
    std::fs::write(queries.join("materials_query"), "SELECT Id, Name, Category__c\nFROM Material__c\n").unwrap();
    std::fs::write(queries.join("orders_query"), "SELECT Id\nFROM Order__c\n").unwrap();
    std::fs::write(
        queries.join("cart_query"),
        "SELECT Id, Material__c, Order__c, SellerRef__c, BuyerRef__c,\n       QuantitiyPurchase__c, TotalPricePurchase__c, TotalPriceSell__c, Margin__c\nFROM CartItem__c\n",
    )
    .unwrap();
}

async fn authenticated_client(mock: &MockSalesforce, dir: &Path) -> SalesforceClient {
    write_credentials(dir, PASSWORD);
    let config = config(mock, dir);
    let client = SalesforceClient::new(&config).unwrap();
    let credentials = SalesforceCredentials::from_file(&config.credentials_file).unwrap();
    client.authenticate(&credentials).await.unwrap();
    client
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_authenticate_logs_in_once() {
    let mock = MockSalesforce::start(100).await;
    let dir = tempfile::tempdir().unwrap();
    write_credentials(dir.path(), PASSWORD);

    let config = config(&mock, dir.path());
    let client = SalesforceClient::new(&config).unwrap();
    let credentials = SalesforceCredentials::from_file(&config.credentials_file).unwrap();

    let first = client.authenticate(&credentials).await.unwrap();
    let second = client.authenticate(&credentials).await.unwrap();

    assert_eq!(mock.logins(), 1);
    assert_eq!(first.instance_url, second.instance_url);
    assert_eq!(first.instance_url.as_str(), format!("{}/", mock.url()));
    assert!(client.is_authenticated().await);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let mock = MockSalesforce::start(100).await;
    let dir = tempfile::tempdir().unwrap();
    write_credentials(dir.path(), "wrong password");

    let config = config(&mock, dir.path());
    let client = SalesforceClient::new(&config).unwrap();
    let credentials = SalesforceCredentials::from_file(&config.credentials_file).unwrap();

    let err = client.authenticate(&credentials).await.unwrap_err();
    match err {
        SalesforceError::AuthenticationFailed(reason) => assert!(reason.starts_with("INVALID_LOGIN")),
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
    assert!(!client.is_authenticated().await);
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_query_all_follows_pagination() {
    let mock = MockSalesforce::start(2).await;
    let dir = tempfile::tempdir().unwrap();
    let client = authenticated_client(&mock, dir.path()).await;

    let records = client
        .query_all("SELECT Id, Material__c FROM CartItem__c")
        .await
        .unwrap();

    // 7 records in pages of 2
    assert_eq!(records.len(), 7);
    assert_eq!(mock.pages(), 4);
    assert_eq!(records[0]["Id"], "a0C1");
    assert_eq!(records[6]["Id"], "a0C7");
}

#[tokio::test]
async fn test_query_all_ignores_reported_total_size() {
    let mock = MockSalesforce::start_reporting_total(3, u64::MAX).await;
    let dir = tempfile::tempdir().unwrap();
    let client = authenticated_client(&mock, dir.path()).await;

    let records = client
        .query_all("SELECT Id, Material__c FROM CartItem__c")
        .await
        .unwrap();

    assert_eq!(records.len(), 7);
    assert_eq!(mock.pages(), 3);
}

#[tokio::test]
async fn test_query_all_strips_attributes() {
    let mock = MockSalesforce::start(100).await;
    let dir = tempfile::tempdir().unwrap();
    let client = authenticated_client(&mock, dir.path()).await;

    let records = client.query_all("SELECT Id, Name FROM Account").await.unwrap();

    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| !r.contains_key("attributes")));
    assert_eq!(records[0]["Name"], "Schrottwolf GmbH");
}

#[tokio::test]
async fn test_rejected_query_surfaces_api_error() {
    let mock = MockSalesforce::start(100).await;
    let dir = tempfile::tempdir().unwrap();
    let client = authenticated_client(&mock, dir.path()).await;

    let err = client.query_all("SELECT Id FROM Opportunity").await.unwrap_err();
    match err {
        SalesforceError::Query { status, errors } => {
            assert_eq!(status, 400);
            assert_eq!(errors[0].error_code, "INVALID_TYPE");
        }
        other => panic!("expected Query error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_snapshot_reads_all_tables() {
    let mock = MockSalesforce::start(3).await;
    let dir = tempfile::tempdir().unwrap();
    write_queries(dir.path());
    let client = authenticated_client(&mock, dir.path()).await;

    let queries = QuerySet::load(&dir.path().join("queries")).unwrap();
    let tables = client.fetch_snapshot(&queries).await.unwrap();

    assert_eq!(tables.accounts.len(), 5);
    assert_eq!(tables.materials.len(), 4);
    assert_eq!(tables.orders.len(), 2);
    assert_eq!(tables.cart.len(), 7);
    assert_eq!(tables.materials[3].category, None);
    assert_eq!(tables.accounts[4].billing_latitude, None);
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_load_context_end_to_end() {
    let mock = MockSalesforce::start(2).await;
    let dir = tempfile::tempdir().unwrap();
    write_credentials(dir.path(), PASSWORD);
    write_queries(dir.path());

    let context = load_context(&config(&mock, dir.path())).await.unwrap();

    assert_eq!(mock.logins(), 1);
    assert_eq!(context.rows().len(), 7);
    assert_eq!(context.dropped().total(), 0);
    assert_eq!(
        context.sellers(),
        ["Schrottwolf GmbH".to_string(), "Metallhandel Nord".to_string()]
    );
    assert_eq!(
        context.categories(),
        ["Kupfer".to_string(), "Aluminium".to_string()]
    );
}

#[tokio::test]
async fn test_load_context_without_credentials_never_calls_salesforce() {
    let mock = MockSalesforce::start(100).await;
    let dir = tempfile::tempdir().unwrap();
    write_queries(dir.path());

    let err = load_context(&config(&mock, dir.path())).await.unwrap_err();

    assert!(matches!(err, StartupError::Credentials(_)));
    assert!(err.to_string().starts_with("missing credentials"));
    assert_eq!(mock.logins(), 0);
    assert_eq!(mock.pages(), 0);
}

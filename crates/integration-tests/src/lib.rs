//! Integration test fixtures for the partner map.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p partner-map-integration-tests
//! ```
//!
//! Nothing here talks to a real Salesforce org. [`MockSalesforce`] serves
//! the SOAP login and the paginated REST query endpoint on a local port,
//! backed by the same fixture records [`fixture_tables`] deserializes.
//!
//! # Fixture geography
//!
//! The seller Schrottwolf GmbH sits in Essen. Buyers are in Bochum (about
//! 15 km away), Hamburg (about 308 km), Munich (about 490 km), plus one
//! buyer without a billing address.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{TimeZone, Utc};
use partner_map_dashboard::config::DashboardDefaults;
use partner_map_dashboard::map::DashboardContext;
use partner_map_dashboard::salesforce::SourceTables;
use partner_map_dashboard::state::AppState;
use serde::Deserialize;
use serde_json::{Value, json};

/// Username the mock accepts.
pub const USERNAME: &str = "ops@schrottwolf.de";
/// Password the mock accepts.
pub const PASSWORD: &str = "hunter 2";
/// Security token the mock accepts.
pub const SECURITY_TOKEN: &str = "TOKEN123";

const SESSION_ID: &str = "00D-SESSION";
const API_VERSION: &str = "59.0";

/// Fixture accounts as Salesforce returns them.
#[must_use]
pub fn account_records() -> Vec<Value> {
    vec![
        account("001A1", "Schrottwolf GmbH", Some((51.4556, 7.0116)), "Schrott", false, true),
        account("001A2", "Metallhandel Nord", Some((53.5511, 9.9937)), "Handel", true, true),
        account("001A3", "Recycling Ruhr", Some((51.4818, 7.2162)), "Recycling", true, false),
        account("001A4", "Alu Süd", Some((48.1351, 11.5820)), "Giesserei", true, false),
        account("001A5", "Ohne Adresse KG", None, "Handel", true, false),
    ]
}

/// Fixture materials. `Unsortiert` has no category.
#[must_use]
pub fn material_records() -> Vec<Value> {
    vec![
        material("a0M1", "Kupfer Millberry", Some("Kupfer")),
        material("a0M2", "Kupferkabel", Some("Kupfer")),
        material("a0M3", "Alu Profile", Some("Aluminium")),
        material("a0M4", "Unsortiert", None),
    ]
}

/// Fixture orders.
#[must_use]
pub fn order_records() -> Vec<Value> {
    vec![
        json!({"attributes": attributes("Order__c", "a0O1"), "Id": "a0O1"}),
        json!({"attributes": attributes("Order__c", "a0O2"), "Id": "a0O2"}),
    ]
}

/// Fixture cart items.
#[must_use]
pub fn cart_records() -> Vec<Value> {
    vec![
        cart_item("a0C1", "a0M1", "a0O1", "001A1", "001A3", 10.0),
        cart_item("a0C2", "a0M2", "a0O1", "001A1", "001A3", 5.0),
        cart_item("a0C3", "a0M1", "a0O1", "001A1", "001A2", 20.0),
        cart_item("a0C4", "a0M3", "a0O2", "001A1", "001A4", 7.0),
        cart_item("a0C5", "a0M2", "a0O2", "001A1", "001A5", 3.0),
        cart_item("a0C6", "a0M4", "a0O2", "001A1", "001A3", 1.0),
        cart_item("a0C7", "a0M1", "a0O2", "001A2", "001A3", 4.0),
    ]
}

fn attributes(object: &str, id: &str) -> Value {
    json!({
        "type": object,
        "url": format!("/services/data/v{API_VERSION}/sobjects/{object}/{id}"),
    })
}

fn account(
    id: &str,
    name: &str,
    location: Option<(f64, f64)>,
    segment: &str,
    is_buyer: bool,
    is_seller: bool,
) -> Value {
    json!({
        "attributes": attributes("Account", id),
        "Id": id,
        "Name": name,
        "BillingLatitude": location.map(|(lat, _)| lat),
        "BillingLongitude": location.map(|(_, lon)| lon),
        "Segment__c": segment,
        "IsBuyer__c": is_buyer,
        "IsSeller__c": is_seller,
    })
}

fn material(id: &str, name: &str, category: Option<&str>) -> Value {
    json!({
        "attributes": attributes("Material__c", id),
        "Id": id,
        "Name": name,
        "Category__c": category,
    })
}

fn cart_item(id: &str, material: &str, order: &str, seller: &str, buyer: &str, weight: f64) -> Value {
    json!({
        "attributes": attributes("CartItem__c", id),
        "Id": id,
        "Material__c": material,
        "Order__c": order,
        "SellerRef__c": seller,
        "BuyerRef__c": buyer,
        "QuantitiyPurchase__c": weight,
        "TotalPricePurchase__c": weight * 6.5,
        "TotalPriceSell__c": weight * 7.25,
        "Margin__c": weight * 0.75,
    })
}

/// The fixture records, typed.
///
/// # Panics
///
/// Panics if a fixture record does not deserialize.
#[must_use]
#[allow(clippy::expect_used)]
pub fn fixture_tables() -> SourceTables {
    fn typed<T: serde::de::DeserializeOwned>(records: Vec<Value>) -> Vec<T> {
        records
            .into_iter()
            .map(|r| serde_json::from_value(r).expect("fixture record should deserialize"))
            .collect()
    }

    SourceTables {
        accounts: typed(account_records()),
        materials: typed(material_records()),
        orders: typed(order_records()),
        cart: typed(cart_records()),
    }
}

/// Application state over the fixture tables with the stock defaults.
#[must_use]
pub fn fixture_state() -> AppState {
    fixture_state_with(DashboardDefaults::default())
}

/// Application state over the fixture tables with custom widget defaults.
#[must_use]
pub fn fixture_state_with(defaults: DashboardDefaults) -> AppState {
    let fetched_at = Utc
        .with_ymd_and_hms(2026, 3, 2, 8, 30, 0)
        .single()
        .unwrap_or_else(Utc::now);
    AppState::new(
        DashboardContext::from_tables(fixture_tables(), fetched_at),
        defaults,
    )
}

// =============================================================================
// Mock Salesforce
// =============================================================================

/// A local stand-in for the Salesforce login and query endpoints.
pub struct MockSalesforce {
    addr: SocketAddr,
    state: Arc<MockState>,
}

struct MockState {
    page_size: usize,
    reported_total: Option<u64>,
    logins: AtomicUsize,
    pages: AtomicUsize,
}

impl MockSalesforce {
    /// Start the mock on an ephemeral port, serving `page_size` records per
    /// query page.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(page_size: usize) -> Self {
        Self::spawn(page_size, None).await
    }

    /// Like [`start`](Self::start), but every page claims `total` as its
    /// `totalSize` regardless of how many records exist.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start_reporting_total(page_size: usize, total: u64) -> Self {
        Self::spawn(page_size, Some(total)).await
    }

    #[allow(clippy::expect_used)]
    async fn spawn(page_size: usize, reported_total: Option<u64>) -> Self {
        let state = Arc::new(MockState {
            page_size: page_size.max(1),
            reported_total,
            logins: AtomicUsize::new(0),
            pages: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/services/Soap/u/{version}", post(login))
            .route("/services/data/{version}/query", get(query))
            .route("/services/data/{version}/query/{locator}", get(query_more))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock Salesforce");
        let addr = listener.local_addr().expect("mock Salesforce address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL to use as the login URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of SOAP logins served so far.
    #[must_use]
    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    /// Number of query pages served so far.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.state.pages.load(Ordering::SeqCst)
    }
}

async fn login(State(state): State<Arc<MockState>>, headers: HeaderMap, body: String) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("127.0.0.1");
    let expected_password = format!("{PASSWORD}{SECURITY_TOKEN}");

    if !body.contains(&format!("<n1:username>{USERNAME}</n1:username>"))
        || !body.contains(&format!("<n1:password>{expected_password}</n1:password>"))
    {
        let fault = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<soapenv:Body><soapenv:Fault><faultcode>INVALID_LOGIN</faultcode>",
            "<faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>",
            "</soapenv:Fault></soapenv:Body></soapenv:Envelope>"
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, fault).into_response();
    }

    let ok = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns="urn:partner.soap.sforce.com"><soapenv:Body><loginResponse><result>"#,
            "<serverUrl>http://{host}/services/Soap/u/{version}/00D0900000ABC</serverUrl>",
            "<sessionId>{session}</sessionId>",
            "<sessionSecondsValid>7200</sessionSecondsValid>",
            "</result></loginResponse></soapenv:Body></soapenv:Envelope>"
        ),
        host = host,
        version = API_VERSION,
        session = SESSION_ID,
    );
    (StatusCode::OK, ok).into_response()
}

#[derive(Deserialize)]
struct QueryParams {
    q: String,
}

async fn query(
    State(state): State<Arc<MockState>>,
    Path(version): Path<String>,
    headers: HeaderMap,
    Query(params): Query<QueryParams>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match table_for(&params.q) {
        Some(table) => page(&state, &version, table, 0),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!([{"message": "sObject type is not supported", "errorCode": "INVALID_TYPE"}])),
        )
            .into_response(),
    }
}

async fn query_more(
    State(state): State<Arc<MockState>>,
    Path((version, locator)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let parsed = locator
        .split_once('-')
        .and_then(|(table, offset)| Some((table_named(table)?, offset.parse().ok()?)));
    match parsed {
        Some((table, offset)) => page(&state, &version, table, offset),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!([{"message": "invalid query locator", "errorCode": "INVALID_QUERY_LOCATOR"}])),
        )
            .into_response(),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        == Some(format!("Bearer {SESSION_ID}").as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!([{"message": "Session expired or invalid", "errorCode": "INVALID_SESSION_ID"}])),
    )
        .into_response()
}

#[derive(Clone, Copy)]
enum Table {
    Accounts,
    Materials,
    Orders,
    Cart,
}

impl Table {
    const fn name(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Materials => "materials",
            Self::Orders => "orders",
            Self::Cart => "cart",
        }
    }

    fn records(self) -> Vec<Value> {
        match self {
            Self::Accounts => account_records(),
            Self::Materials => material_records(),
            Self::Orders => order_records(),
            Self::Cart => cart_records(),
        }
    }
}

fn table_named(name: &str) -> Option<Table> {
    [Table::Accounts, Table::Materials, Table::Orders, Table::Cart]
        .into_iter()
        .find(|t| t.name() == name)
}

fn table_for(soql: &str) -> Option<Table> {
    let mut words = soql.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case("FROM"))?;
    match words.next()? {
        "Account" => Some(Table::Accounts),
        "Material__c" => Some(Table::Materials),
        "Order__c" => Some(Table::Orders),
        "CartItem__c" => Some(Table::Cart),
        _ => None,
    }
}

fn page(state: &MockState, version: &str, table: Table, offset: usize) -> Response {
    state.pages.fetch_add(1, Ordering::SeqCst);

    let records = table.records();
    let total = records.len();
    let end = (offset + state.page_size).min(total);
    let chunk: Vec<Value> = records.into_iter().skip(offset).take(end.saturating_sub(offset)).collect();
    let done = end >= total;

    let mut body = json!({
        "totalSize": state.reported_total.unwrap_or_else(|| u64::try_from(total).unwrap_or(u64::MAX)),
        "done": done,
        "records": chunk,
    });
    if !done {
        body["nextRecordsUrl"] = json!(format!("/services/data/{version}/query/{}-{end}", table.name()));
    }
    Json(body).into_response()
}

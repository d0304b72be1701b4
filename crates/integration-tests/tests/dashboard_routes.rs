//! Integration tests for the dashboard HTTP surface.
//!
//! The router runs in-process over the fixture snapshot; no server or
//! Salesforce org is needed.
//!
//! Run with: cargo test -p partner-map-integration-tests

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use partner_map_dashboard::config::DashboardDefaults;
use partner_map_dashboard::routes;
use partner_map_dashboard::state::AppState;
use partner_map_integration_tests::{fixture_state, fixture_state_with};
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    routes::routes().with_state(fixture_state())
}

async fn get(uri: &str) -> (StatusCode, String) {
    get_from(app(), uri).await
}

async fn get_from(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn get_json(uri: &str) -> Value {
    let (status, body) = get(uri).await;
    assert_eq!(status, StatusCode::OK, "{uri}: {body}");
    serde_json::from_str(&body).unwrap()
}

fn buyers(map: &Value) -> Vec<(String, String, f64)> {
    map["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            (
                p["buyer"].as_str().unwrap().to_string(),
                p["group"].as_str().unwrap().to_string(),
                p["weight"].as_f64().unwrap(),
            )
        })
        .collect()
}

// ============================================================================
// Page
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_page_renders_default_controls() {
    let (status, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);

    assert!(body.contains("Map showing buyers of Kupfer, in a radius of 200 km of Schrottwolf GmbH."));
    assert!(body.contains(r#"<option value="Schrottwolf GmbH" selected>"#));
    assert!(body.contains(r#"<option value="Metallhandel Nord">"#));
    assert!(body.contains(r#"<option value="Kupfer" selected>"#));
    assert!(body.contains(r#"<option value="Aluminium">"#));
    assert!(body.contains(r#"<select id="material" disabled>"#));
    assert!(body.contains(r#"max="3000""#));
    assert!(body.contains(r#"value="200""#));
    assert!(body.contains("2026-03-02 08:30 UTC"));
}

fn initial_map(body: &str) -> Value {
    let start = body.find(r#"<script id="initial-map" type="application/json">"#).unwrap();
    let json_start = body[start..].find('>').unwrap() + start + 1;
    let json_end = body[json_start..].find("</script>").unwrap() + json_start;
    serde_json::from_str(&body[json_start..json_end]).unwrap()
}

#[tokio::test]
async fn test_page_embeds_initial_map() {
    let (_, body) = get("/").await;
    let map = initial_map(&body);

    assert_eq!(map["grouped_by"], "category");
    assert_eq!(buyers(&map), vec![("Recycling Ruhr".to_string(), "Kupfer".to_string(), 19.0)]);
}

#[tokio::test]
async fn test_unlisted_default_seller_starts_unset() {
    let state: AppState = fixture_state_with(DashboardDefaults {
        seller: Some("Nobody AG".to_string()),
        ..DashboardDefaults::default()
    });
    let (status, body) = get_from(routes::routes().with_state(state), "/").await;
    assert_eq!(status, StatusCode::OK);

    // Dropdown, caption and initial map all agree the seller is unset.
    assert!(!body.contains("Nobody AG"));
    assert!(!body.contains(r#"<option value="Schrottwolf GmbH" selected>"#));
    assert!(body.contains(r#"<option value="Kupfer" selected>"#));
    assert!(body.contains("Map showing buyers of Kupfer, in a radius of 200 km of None."));

    let map = initial_map(&body);
    assert_eq!(map["seller_location"], Value::Null);
    assert_eq!(map["points"], serde_json::json!([]));
}

// ============================================================================
// Material choices
// ============================================================================

#[tokio::test]
async fn test_materials_for_category() {
    let choices = get_json("/api/materials?category=Kupfer").await;
    assert_eq!(choices["disabled"], false);
    assert_eq!(
        choices["options"],
        serde_json::json!(["Kupfer Millberry", "Kupferkabel"])
    );
}

#[tokio::test]
async fn test_materials_without_category_are_disabled() {
    for uri in ["/api/materials", "/api/materials?category="] {
        let choices = get_json(uri).await;
        assert_eq!(choices["disabled"], true, "{uri}");
        assert_eq!(choices["options"], serde_json::json!([]), "{uri}");
    }
}

// ============================================================================
// Buyer map
// ============================================================================

#[tokio::test]
async fn test_default_selection_shows_nearby_buyers_by_category() {
    let map = get_json("/api/buyers?seller=Schrottwolf%20GmbH&category=Kupfer&distance=200").await;

    assert_eq!(map["grouped_by"], "category");
    assert_eq!(
        map["caption"],
        "Map showing buyers of Kupfer, in a radius of 200 km of Schrottwolf GmbH."
    );
    assert_eq!(map["seller_location"], serde_json::json!([51.4556, 7.0116]));
    // Bochum only; Hamburg is outside 200 km.
    assert_eq!(buyers(&map), vec![("Recycling Ruhr".to_string(), "Kupfer".to_string(), 19.0)]);
}

#[tokio::test]
async fn test_wider_radius_includes_more_buyers() {
    let map = get_json("/api/buyers?seller=Schrottwolf%20GmbH&category=Kupfer&distance=350").await;

    assert_eq!(
        buyers(&map),
        vec![
            ("Metallhandel Nord".to_string(), "Kupfer".to_string(), 20.0),
            ("Recycling Ruhr".to_string(), "Kupfer".to_string(), 19.0),
        ]
    );
    let radii: Vec<f64> = map["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["marker_radius"].as_f64().unwrap())
        .collect();
    assert!(radii[0] > radii[1], "heavier buyer gets the larger marker");
}

#[tokio::test]
async fn test_material_selection_groups_by_material() {
    let map = get_json(
        "/api/buyers?seller=Schrottwolf%20GmbH&category=Kupfer&material=Kupferkabel&distance=200",
    )
    .await;

    assert_eq!(map["grouped_by"], "material");
    // The buyer without an address never appears.
    assert_eq!(buyers(&map), vec![("Recycling Ruhr".to_string(), "Kupferkabel".to_string(), 5.0)]);
}

#[tokio::test]
async fn test_no_seller_no_category_shows_every_located_buyer() {
    let map = get_json("/api/buyers?seller=&category=&distance=0").await;

    assert_eq!(map["grouped_by"], "category");
    assert_eq!(map["seller_location"], Value::Null);
    assert_eq!(
        map["caption"],
        "Map showing buyers of None, in a radius of 0 km of None."
    );
    assert_eq!(
        buyers(&map),
        vec![
            ("Alu Süd".to_string(), "Aluminium".to_string(), 7.0),
            ("Metallhandel Nord".to_string(), "Kupfer".to_string(), 20.0),
            ("Recycling Ruhr".to_string(), "Kupfer".to_string(), 19.0),
        ]
    );
}

#[tokio::test]
async fn test_unknown_seller_yields_empty_map() {
    let map = get_json("/api/buyers?seller=Nobody&category=Kupfer&distance=3000").await;
    assert_eq!(map["points"], serde_json::json!([]));
}

#[tokio::test]
async fn test_missing_distance_uses_default() {
    let map = get_json("/api/buyers?seller=Schrottwolf%20GmbH&category=Kupfer").await;
    assert_eq!(
        map["caption"],
        "Map showing buyers of Kupfer, in a radius of 200 km of Schrottwolf GmbH."
    );
}

#[tokio::test]
async fn test_invalid_distance_is_rejected() {
    let (status, body) = get("/api/buyers?seller=Schrottwolf%20GmbH&distance=far").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("distance"));
}

//! JSON endpoints backing the dashboard controls.
//!
//! The page calls these whenever a control changes; each one maps to a single
//! handler on [`DashboardContext`](crate::map::DashboardContext).

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    error::AppError,
    map::{BuyerMap, MaterialChoices, Selection},
    state::AppState,
};

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/materials", get(materials))
        .route("/buyers", get(buyers))
}

/// Query for the material dropdown.
#[derive(Debug, Deserialize)]
pub struct MaterialsQuery {
    pub category: Option<String>,
}

/// Query for the buyer map. Empty strings mean "unset".
#[derive(Debug, Deserialize)]
pub struct BuyersQuery {
    pub seller: Option<String>,
    pub category: Option<String>,
    pub material: Option<String>,
    pub distance: Option<String>,
}

/// Material options for the selected category.
#[instrument(skip(state))]
pub async fn materials(
    State(state): State<AppState>,
    Query(query): Query<MaterialsQuery>,
) -> Json<MaterialChoices> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    Json(state.context().material_choices(category))
}

/// Buyer markers and caption for the current selection.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if `distance` is not a finite number.
#[instrument(skip(state))]
pub async fn buyers(
    State(state): State<AppState>,
    Query(query): Query<BuyersQuery>,
) -> Result<Json<BuyerMap>, AppError> {
    let distance_km = match query.distance.as_deref().map(str::trim) {
        None | Some("") => state.defaults().distance_km,
        Some(raw) => parse_distance(raw)?,
    };

    let selection = Selection::new(query.seller, query.category, query.material, distance_km);
    let map = state.context().buyer_map(&selection);

    tracing::debug!(points = map.points.len(), "Buyer map computed");
    Ok(Json(map))
}

fn parse_distance(raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|km| km.is_finite())
        .ok_or_else(|| AppError::BadRequest(format!("distance must be a number of kilometres, got '{raw}'")))
}

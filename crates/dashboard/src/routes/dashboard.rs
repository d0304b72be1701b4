//! The dashboard page.
//!
//! Renders the controls with their initial values and embeds the first buyer
//! map, so the page draws without waiting for a round trip.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::{
    config::MAX_DISTANCE_KM,
    error::AppError,
    map::{Selection, format_km},
    state::AppState,
};

/// One `<option>` in a dropdown.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub selected: bool,
}

impl OptionView {
    fn list(values: &[String], selected: Option<&str>) -> Vec<Self> {
        values
            .iter()
            .map(|value| Self {
                selected: selected == Some(value.as_str()),
                value: value.clone(),
            })
            .collect()
    }
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub sellers: Vec<OptionView>,
    pub categories: Vec<OptionView>,
    pub materials: Vec<OptionView>,
    pub materials_disabled: bool,
    pub distance_km: String,
    pub max_distance_km: String,
    pub caption: String,
    pub tile_url: String,
    pub background_image_url: Option<String>,
    pub fetched_at: String,
    /// Initial buyer map, serialized for the page script.
    pub initial_map_json: String,
}

/// Dashboard page handler.
///
/// The material dropdown starts disabled and empty; choosing a category
/// fills it. A configured default that is not among the dropdown options
/// starts as unset, so the page and the first request agree.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let defaults = state.defaults();
    let context = state.context();

    let selection = Selection::new(
        listed_or_unset("seller", defaults.seller.as_deref(), context.sellers()),
        listed_or_unset("category", defaults.category.as_deref(), context.categories()),
        None,
        defaults.distance_km,
    );
    let map = context.buyer_map(&selection);
    let initial_map_json = serde_json::to_string(&map)
        .map_err(|e| AppError::Internal(format!("failed to serialize buyer map: {e}")))?;

    let template = DashboardTemplate {
        sellers: OptionView::list(context.sellers(), selection.seller.as_deref()),
        categories: OptionView::list(context.categories(), selection.category.as_deref()),
        materials: Vec::new(),
        materials_disabled: true,
        distance_km: format_km(selection.distance_km),
        max_distance_km: format_km(MAX_DISTANCE_KM),
        caption: map.caption.clone(),
        tile_url: defaults.tile_url.clone(),
        background_image_url: defaults.background_image_url.clone(),
        fetched_at: context.fetched_at().format("%Y-%m-%d %H:%M UTC").to_string(),
        initial_map_json: escape_script_json(&initial_map_json),
    };

    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("template render error: {e}")))
}

/// `value` if the dropdown offers it, otherwise `None`.
fn listed_or_unset(control: &str, value: Option<&str>, options: &[String]) -> Option<String> {
    let value = value?;
    if options.iter().any(|o| o == value) {
        return Some(value.to_string());
    }
    tracing::warn!(control, value, "Default not among dropdown options; starting unset");
    None
}

/// Keep embedded JSON from closing its `<script>` element.
fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
}

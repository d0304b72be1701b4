//! Buyer map: the read-only dashboard context and the two handlers driven by
//! the controls.
//!
//! - [`DashboardContext::material_choices`] runs when the category changes.
//! - [`DashboardContext::buyer_map`] runs when any control changes.
//!
//! The context is built once at startup and shared behind an `Arc`; handlers
//! only read from it.

pub mod aggregate;
pub mod selection;

pub use aggregate::{BuyerGroup, GroupBy, aggregate};
pub use selection::{Selection, format_km};

use chrono::{DateTime, Utc};
use partner_map_core::{CartRow, Coordinates, Material};
use serde::Serialize;

use crate::pipeline::{DroppedCounts, build_cart_table, category_choices, seller_choices};
use crate::salesforce::SourceTables;

/// Smallest marker radius in pixels.
pub const MIN_MARKER_RADIUS: f64 = 4.0;
/// Largest marker radius in pixels, given to the heaviest buyer.
pub const MAX_MARKER_RADIUS: f64 = 30.0;

/// Options for the material dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialChoices {
    pub options: Vec<String>,
    pub disabled: bool,
}

/// One marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerPoint {
    pub buyer: String,
    /// Category or material, depending on [`BuyerMap::grouped_by`].
    pub group: String,
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
    pub distance_km: Option<f64>,
    pub marker_radius: f64,
}

/// Everything the page needs to redraw the map and caption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerMap {
    pub grouped_by: GroupBy,
    pub points: Vec<BuyerPoint>,
    pub caption: String,
    pub seller_location: Option<Coordinates>,
}

/// Read-only state shared by every request.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    rows: Vec<CartRow>,
    materials: Vec<Material>,
    sellers: Vec<String>,
    categories: Vec<String>,
    dropped: DroppedCounts,
    fetched_at: DateTime<Utc>,
}

impl DashboardContext {
    /// Join the source tables and derive the dropdown choices.
    #[must_use]
    pub fn from_tables(tables: SourceTables, fetched_at: DateTime<Utc>) -> Self {
        let outcome = build_cart_table(&tables);
        let sellers = seller_choices(&outcome.rows);
        let categories = category_choices(&tables.materials);

        tracing::info!(
            rows = outcome.rows.len(),
            dropped = outcome.dropped.total(),
            sellers = sellers.len(),
            categories = categories.len(),
            "Dashboard context built"
        );

        Self {
            rows: outcome.rows,
            materials: tables.materials,
            sellers,
            categories,
            dropped: outcome.dropped,
            fetched_at,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[CartRow] {
        &self.rows
    }

    #[must_use]
    pub fn sellers(&self) -> &[String] {
        &self.sellers
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub const fn dropped(&self) -> DroppedCounts {
        self.dropped
    }

    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Materials belonging to `category`, in source order.
    ///
    /// With no category the dropdown is disabled and empty.
    #[must_use]
    pub fn material_choices(&self, category: Option<&str>) -> MaterialChoices {
        let Some(category) = category else {
            return MaterialChoices {
                options: Vec::new(),
                disabled: true,
            };
        };

        MaterialChoices {
            options: self
                .materials
                .iter()
                .filter(|m| m.category.as_deref() == Some(category))
                .map(|m| m.name.clone())
                .collect(),
            disabled: false,
        }
    }

    /// Location of the first row sold by `seller`.
    #[must_use]
    pub fn seller_location(&self, seller: &str) -> Option<Coordinates> {
        self.rows
            .iter()
            .find(|r| r.seller == seller)
            .and_then(|r| r.seller_coor)
    }

    /// Aggregate and filter buyers for the current selection.
    ///
    /// - no seller and no category: every located buyer, grouped by category
    /// - seller and no material: grouped by category, within the radius and
    ///   matching the category
    /// - otherwise: grouped by material, within the radius and matching the
    ///   material
    ///
    /// An unknown seller has no location, so the filtered branches come back
    /// empty instead of failing.
    #[must_use]
    pub fn buyer_map(&self, selection: &Selection) -> BuyerMap {
        let seller_location = selection
            .seller
            .as_deref()
            .and_then(|s| self.seller_location(s));

        if selection.seller.is_some() && seller_location.is_none() {
            tracing::debug!(seller = ?selection.seller, "Selected seller has no location");
        }

        let located = self.rows.iter().filter(|r| r.has_buyer_location()).map(|row| {
            let distance = seller_location
                .zip(row.buyer_coor)
                .map(|(seller, buyer)| buyer.distance_km(&seller));
            (row, distance)
        });

        let (grouped_by, wanted) = match (&selection.seller, &selection.category, &selection.material) {
            (None, None, _) => (GroupBy::Category, None),
            (Some(_), _, None) => (GroupBy::Category, Some(selection.category.as_deref())),
            _ => (GroupBy::Material, Some(selection.material.as_deref())),
        };

        let mut groups = aggregate(located, grouped_by);
        if let Some(wanted) = wanted {
            groups.retain(|g| {
                g.distance_km.is_some_and(|d| d <= selection.distance_km) && Some(g.key.as_str()) == wanted
            });
        }

        BuyerMap {
            grouped_by,
            points: to_points(groups),
            caption: selection.caption(),
            seller_location,
        }
    }
}

/// Scale marker area with weight so the heaviest buyer gets the largest marker.
fn to_points(groups: Vec<BuyerGroup>) -> Vec<BuyerPoint> {
    let max_weight = groups.iter().map(|g| g.weight).fold(0.0_f64, f64::max);

    groups
        .into_iter()
        .map(|g| {
            let marker_radius = if max_weight > 0.0 && g.weight > 0.0 {
                MIN_MARKER_RADIUS + (MAX_MARKER_RADIUS - MIN_MARKER_RADIUS) * (g.weight / max_weight).sqrt()
            } else {
                MIN_MARKER_RADIUS
            };
            BuyerPoint {
                buyer: g.buyer,
                group: g.key,
                latitude: g.latitude,
                longitude: g.longitude,
                weight: g.weight,
                distance_km: g.distance_km,
                marker_radius,
            }
        })
        .collect()
}

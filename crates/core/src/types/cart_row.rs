//! The denormalized row the dashboard works on.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coordinates::Coordinates;
use super::id::{CartItemId, OrderId};

/// One cart item joined with its material, order, seller and buyer.
///
/// Produced once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRow {
    pub cart_item_id: CartItemId,
    pub order_id: OrderId,
    pub material: String,
    pub category: Option<String>,
    pub weight: Option<f64>,
    pub cost: Option<Decimal>,
    pub sale: Option<Decimal>,
    pub margin: Option<Decimal>,
    pub seller: String,
    pub segment_seller: Option<String>,
    pub seller_lat: Option<f64>,
    pub seller_lon: Option<f64>,
    pub buyer: String,
    pub segment_buyer: Option<String>,
    pub buyer_lat: Option<f64>,
    pub buyer_lon: Option<f64>,
    pub seller_coor: Option<Coordinates>,
    pub buyer_coor: Option<Coordinates>,
}

impl CartRow {
    /// Whether this row can appear on the buyer map.
    ///
    /// Rows without a geocoded buyer stay in the table but are never
    /// distance-filtered or plotted.
    #[must_use]
    pub const fn has_buyer_location(&self) -> bool {
        self.buyer_coor.is_some()
    }

    /// Weight with missing values counted as zero, the way a column sum
    /// skips empty cells.
    #[must_use]
    pub fn weight_or_zero(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }
}

//! Raw Salesforce records as returned by the four stored queries.
//!
//! Field names follow the Salesforce API names via `#[serde(rename)]`; the
//! Rust field names are the human-readable ones used everywhere else.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coordinates::Coordinates;
use super::id::{AccountId, CartItemId, MaterialId, OrderId};

/// A business account that can act as a buyer, a seller, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "Id")]
    pub id: AccountId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "BillingLatitude", default)]
    pub billing_latitude: Option<f64>,
    #[serde(rename = "BillingLongitude", default)]
    pub billing_longitude: Option<f64>,
    #[serde(rename = "Segment__c", default)]
    pub segment: Option<String>,
    #[serde(rename = "IsBuyer__c", default)]
    pub is_buyer: bool,
    #[serde(rename = "IsSeller__c", default)]
    pub is_seller: bool,
}

impl Account {
    /// Billing location, if both halves were geocoded.
    #[must_use]
    pub fn location(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.billing_latitude, self.billing_longitude)
    }
}

/// A tradeable material (e.g. "Kupfer Millberry") and its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "Id")]
    pub id: MaterialId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Category__c", default)]
    pub category: Option<String>,
}

/// An order grouping one or more cart items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "Id")]
    pub id: OrderId,
}

/// A single purchase/sale line.
///
/// Lookup fields are optional: Salesforce returns `null` for an empty lookup
/// and such items never survive the inner joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "Id")]
    pub id: CartItemId,
    #[serde(rename = "Material__c", default)]
    pub material: Option<MaterialId>,
    #[serde(rename = "Order__c", default)]
    pub order: Option<OrderId>,
    #[serde(rename = "SellerRef__c", default)]
    pub seller: Option<AccountId>,
    #[serde(rename = "BuyerRef__c", default)]
    pub buyer: Option<AccountId>,
    /// Purchased quantity in kilograms. The API name carries a typo.
    #[serde(rename = "QuantitiyPurchase__c", default)]
    pub weight: Option<f64>,
    #[serde(rename = "TotalPricePurchase__c", default)]
    pub cost: Option<Decimal>,
    #[serde(rename = "TotalPriceSell__c", default)]
    pub sale: Option<Decimal>,
    #[serde(rename = "Margin__c", default)]
    pub margin: Option<Decimal>,
}

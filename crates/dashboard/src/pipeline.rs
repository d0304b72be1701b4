//! Join pipeline: four Salesforce tables in, one row per cart item out.
//!
//! Every join is an inner join keyed on a record id. Cart items whose
//! material, order, seller or buyer cannot be resolved are dropped; the
//! number dropped per reason is reported so the loss is visible in logs.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use partner_map_core::{Account, CartItem, CartRow, Coordinates, Material, Order};

use crate::salesforce::SourceTables;

/// Cart items dropped by each inner join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroppedCounts {
    pub missing_material: usize,
    pub missing_order: usize,
    pub missing_seller: usize,
    pub missing_buyer: usize,
}

impl DroppedCounts {
    /// Total number of cart items that did not make it into the table.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.missing_material + self.missing_order + self.missing_seller + self.missing_buyer
    }
}

/// Result of [`build_cart_table`].
#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    pub rows: Vec<CartRow>,
    pub dropped: DroppedCounts,
}

/// Join cart items to materials, orders, sellers and buyers.
///
/// Joins run in that order, so an item missing both its material and its
/// buyer is counted once, under `missing_material`. Output order follows the
/// cart.
#[must_use]
pub fn build_cart_table(tables: &SourceTables) -> JoinOutcome {
    let materials = index_by(&tables.materials, |m| &m.id, "material");
    let orders = index_by(&tables.orders, |o| &o.id, "order");
    let accounts = index_by(&tables.accounts, |a| &a.id, "account");

    let mut dropped = DroppedCounts::default();
    let mut rows = Vec::with_capacity(tables.cart.len());

    for item in &tables.cart {
        let Some(material) = lookup(&materials, item.material.as_ref()) else {
            dropped.missing_material += 1;
            continue;
        };
        let Some(order) = lookup(&orders, item.order.as_ref()) else {
            dropped.missing_order += 1;
            continue;
        };
        let Some(seller) = lookup(&accounts, item.seller.as_ref()) else {
            dropped.missing_seller += 1;
            continue;
        };
        let Some(buyer) = lookup(&accounts, item.buyer.as_ref()) else {
            dropped.missing_buyer += 1;
            continue;
        };

        rows.push(denormalize(item, material, order, seller, buyer));
    }

    if dropped.total() > 0 {
        tracing::warn!(
            missing_material = dropped.missing_material,
            missing_order = dropped.missing_order,
            missing_seller = dropped.missing_seller,
            missing_buyer = dropped.missing_buyer,
            "Cart items dropped by inner joins"
        );
    }

    JoinOutcome { rows, dropped }
}

fn denormalize(item: &CartItem, material: &Material, order: &Order, seller: &Account, buyer: &Account) -> CartRow {
    CartRow {
        cart_item_id: item.id.clone(),
        order_id: order.id.clone(),
        material: material.name.clone(),
        category: material.category.clone(),
        weight: item.weight,
        cost: item.cost,
        sale: item.sale,
        margin: item.margin,
        seller: seller.name.clone(),
        segment_seller: seller.segment.clone(),
        seller_lat: seller.billing_latitude,
        seller_lon: seller.billing_longitude,
        buyer: buyer.name.clone(),
        segment_buyer: buyer.segment.clone(),
        buyer_lat: buyer.billing_latitude,
        buyer_lon: buyer.billing_longitude,
        seller_coor: Coordinates::from_parts(seller.billing_latitude, seller.billing_longitude),
        buyer_coor: Coordinates::from_parts(buyer.billing_latitude, buyer.billing_longitude),
    }
}

/// Build an id index, keeping the first record for a duplicated id so a
/// join never fans one cart item out into several rows.
fn index_by<'a, T, K, F>(records: &'a [T], key: F, label: &str) -> HashMap<&'a K, &'a T>
where
    K: Eq + Hash + std::fmt::Display + 'a,
    F: Fn(&'a T) -> &'a K,
{
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        let id = key(record);
        if index.contains_key(id) {
            tracing::warn!(%id, table = label, "Duplicate record id; keeping first occurrence");
            continue;
        }
        index.insert(id, record);
    }
    index
}

fn lookup<'a, K: Eq + Hash, T>(index: &HashMap<&'a K, &'a T>, id: Option<&K>) -> Option<&'a T> {
    index.get(id?).copied()
}

/// Distinct sellers in first-seen order, restricted to rows whose buyer
/// has a known latitude.
#[must_use]
pub fn seller_choices(rows: &[CartRow]) -> Vec<String> {
    distinct(
        rows.iter()
            .filter(|r| r.buyer_lat.is_some())
            .map(|r| r.seller.as_str()),
    )
}

/// Distinct material categories in first-seen order.
#[must_use]
pub fn category_choices(materials: &[Material]) -> Vec<String> {
    distinct(materials.iter().filter_map(|m| m.category.as_deref()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_owned)
        .collect()
}

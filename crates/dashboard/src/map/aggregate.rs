//! Group-by-and-aggregate over buyer rows.

use std::collections::BTreeMap;

use partner_map_core::CartRow;
use serde::Serialize;

/// Second half of the aggregation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Category,
    Material,
}

impl GroupBy {
    fn key<'a>(self, row: &'a CartRow) -> Option<&'a str> {
        match self {
            Self::Category => row.category.as_deref(),
            Self::Material => Some(row.material.as_str()),
        }
    }
}

/// Aggregated values for one `(buyer, key)` group.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyerGroup {
    pub buyer: String,
    pub key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
    pub distance_km: Option<f64>,
}

/// Group located buyer rows by `(buyer, key)`.
///
/// Latitude, longitude and distance take the maximum within the group and
/// weight is summed. Rows with no key (e.g. a material without a category)
/// are left out. Groups come back sorted by buyer, then key.
///
/// `rows` pairs each row with its distance to the selected seller, if any.
#[must_use]
pub fn aggregate<'a>(rows: impl IntoIterator<Item = (&'a CartRow, Option<f64>)>, by: GroupBy) -> Vec<BuyerGroup> {
    let mut groups: BTreeMap<(&'a str, &'a str), BuyerGroup> = BTreeMap::new();

    for (row, distance) in rows {
        let Some(location) = row.buyer_coor else {
            continue;
        };
        let Some(key) = by.key(row) else {
            continue;
        };

        groups
            .entry((row.buyer.as_str(), key))
            .and_modify(|g| {
                g.latitude = g.latitude.max(location.latitude());
                g.longitude = g.longitude.max(location.longitude());
                g.weight += row.weight_or_zero();
                g.distance_km = max_option(g.distance_km, distance);
            })
            .or_insert_with(|| BuyerGroup {
                buyer: row.buyer.clone(),
                key: key.to_string(),
                latitude: location.latitude(),
                longitude: location.longitude(),
                weight: row.weight_or_zero(),
                distance_km: distance,
            });
    }

    groups.into_values().collect()
}

fn max_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use partner_map_core::{CartItemId, Coordinates, OrderId};

    fn row(buyer: &str, material: &str, category: Option<&str>, weight: f64, lat: f64, lon: f64) -> CartRow {
        CartRow {
            cart_item_id: CartItemId::new(format!("{buyer}-{material}-{weight}")),
            order_id: OrderId::new("O1"),
            material: material.to_string(),
            category: category.map(str::to_string),
            weight: Some(weight),
            cost: None,
            sale: None,
            margin: None,
            seller: "Schrottwolf GmbH".to_string(),
            segment_seller: None,
            seller_lat: Some(51.0),
            seller_lon: Some(7.0),
            buyer: buyer.to_string(),
            segment_buyer: None,
            buyer_lat: Some(lat),
            buyer_lon: Some(lon),
            seller_coor: Coordinates::from_parts(Some(51.0), Some(7.0)),
            buyer_coor: Coordinates::from_parts(Some(lat), Some(lon)),
        }
    }

    #[test]
    fn test_weights_are_summed_per_buyer_and_category() {
        let rows = [
            row("Metallhandel Nord", "Kupfer Millberry", Some("Kupfer"), 10.0, 53.5, 10.0),
            row("Metallhandel Nord", "Kupferkabel", Some("Kupfer"), 15.0, 53.5, 10.0),
        ];
        let groups = aggregate(rows.iter().map(|r| (r, Some(100.0))), GroupBy::Category);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "Kupfer");
        assert!((groups[0].weight - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_material_grouping_splits_categories() {
        let rows = [
            row("Metallhandel Nord", "Kupfer Millberry", Some("Kupfer"), 10.0, 53.5, 10.0),
            row("Metallhandel Nord", "Kupferkabel", Some("Kupfer"), 15.0, 53.5, 10.0),
        ];
        let groups = aggregate(rows.iter().map(|r| (r, None)), GroupBy::Material);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "Kupfer Millberry");
        assert_eq!(groups[1].key, "Kupferkabel");
    }

    #[test]
    fn test_location_and_distance_take_the_maximum() {
        let rows = [
            row("Alu Süd", "Alu Profile", Some("Aluminium"), 1.0, 48.1, 11.5),
            row("Alu Süd", "Alu Profile", Some("Aluminium"), 2.0, 48.2, 11.4),
        ];
        let groups = aggregate(
            [(&rows[0], Some(450.0)), (&rows[1], Some(460.0))],
            GroupBy::Category,
        );

        assert_eq!(groups.len(), 1);
        assert!((groups[0].latitude - 48.2).abs() < f64::EPSILON);
        assert!((groups[0].longitude - 11.5).abs() < f64::EPSILON);
        assert_eq!(groups[0].distance_km, Some(460.0));
    }

    #[test]
    fn test_rows_without_key_or_location_are_skipped() {
        let mut unlocated = row("Ohne Adresse KG", "Kupferkabel", Some("Kupfer"), 3.0, 50.0, 8.0);
        unlocated.buyer_coor = None;
        let rows = [
            unlocated,
            row("Metallhandel Nord", "Unsortiert", None, 4.0, 53.5, 10.0),
        ];

        let groups = aggregate(rows.iter().map(|r| (r, None)), GroupBy::Category);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_max_option() {
        assert_eq!(max_option(None, None), None);
        assert_eq!(max_option(Some(1.0), None), Some(1.0));
        assert_eq!(max_option(None, Some(2.0)), Some(2.0));
        assert_eq!(max_option(Some(3.0), Some(2.0)), Some(3.0));
    }
}

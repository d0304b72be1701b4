//! The four dashboard inputs.

use serde::{Deserialize, Serialize};

use crate::config::MAX_DISTANCE_KM;

/// Current values of the seller, category, material and distance controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub seller: Option<String>,
    pub category: Option<String>,
    pub material: Option<String>,
    pub distance_km: f64,
}

impl Selection {
    /// Build a selection, treating blank strings as unset and clamping the
    /// radius to the slider's range.
    #[must_use]
    pub fn new(
        seller: Option<String>,
        category: Option<String>,
        material: Option<String>,
        distance_km: f64,
    ) -> Self {
        Self {
            seller: seller.and_then(blank_as_none),
            category: category.and_then(blank_as_none),
            material: material.and_then(blank_as_none),
            distance_km: clamp_distance(distance_km),
        }
    }

    /// One-line description shown under the controls.
    ///
    /// Unset values render as `None`.
    #[must_use]
    pub fn caption(&self) -> String {
        format!(
            "Map showing buyers of {}, in a radius of {} km of {}.",
            self.category.as_deref().unwrap_or("None"),
            format_km(self.distance_km),
            self.seller.as_deref().unwrap_or("None"),
        )
    }
}

fn blank_as_none(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

fn clamp_distance(km: f64) -> f64 {
    if km.is_nan() {
        return 0.0;
    }
    km.clamp(0.0, MAX_DISTANCE_KM)
}

/// Radius rounded to one decimal; whole kilometres print without a
/// fractional part.
#[must_use]
pub fn format_km(km: f64) -> String {
    let rounded = (km * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0088;

/// Errors that can occur when constructing [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoordinatesError {
    /// Latitude is NaN, infinite or outside -90..=90.
    #[error("latitude must be within -90..=90 (got {0})")]
    InvalidLatitude(f64),
    /// Longitude is NaN, infinite or outside -180..=180.
    #[error("longitude must be within -180..=180 (got {0})")]
    InvalidLongitude(f64),
}

/// A `(latitude, longitude)` pair in decimal degrees.
///
/// Serialized as a two-element array so a billing location reads the same way
/// in JSON as it does in the map layer: `[51.2277, 6.7735]`.
///
/// ## Examples
///
/// ```
/// use partner_map_core::Coordinates;
///
/// let duesseldorf = Coordinates::new(51.2277, 6.7735).unwrap();
/// let essen = Coordinates::new(51.4556, 7.0116).unwrap();
///
/// let km = duesseldorf.distance_km(&essen);
/// assert!((29.0..32.0).contains(&km));
///
/// assert!(Coordinates::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "(f64, f64)", try_from = "(f64, f64)")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Create coordinates from decimal degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is not finite or lies outside
    /// its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Pair up two optional billing fields.
    ///
    /// Returns `None` unless both halves are present and valid. Salesforce
    /// leaves geocoded fields empty when an address could not be resolved.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Self::new(latitude?, longitude?).ok()
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in kilometres (haversine formula).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        // Rounding can push `a` marginally past 1 for antipodal points.
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_MEAN_RADIUS_KM * c
    }
}

impl From<Coordinates> for (f64, f64) {
    fn from(c: Coordinates) -> Self {
        (c.latitude, c.longitude)
    }
}

impl TryFrom<(f64, f64)> for Coordinates {
    type Error = CoordinatesError;

    fn try_from((latitude, longitude): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(latitude, longitude)
    }
}

impl core::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero_km_apart() {
        let p = Coordinates::new(53.5511, 9.9937).unwrap();
        assert!(p.distance_km(&p).abs() < f64::EPSILON);
    }

    #[test]
    fn test_known_distance_berlin_munich() {
        let berlin = Coordinates::new(52.5200, 13.4050).unwrap();
        let munich = Coordinates::new(48.1351, 11.5820).unwrap();
        let km = berlin.distance_km(&munich);
        // Reference great-circle distance is ~504 km.
        assert!((500.0..510.0).contains(&km), "got {km}");
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            Coordinates::new(-90.5, 0.0),
            Err(CoordinatesError::InvalidLatitude(-90.5))
        );
        assert_eq!(
            Coordinates::new(0.0, 180.5),
            Err(CoordinatesError::InvalidLongitude(180.5))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_from_parts_requires_both_halves() {
        assert!(Coordinates::from_parts(Some(50.0), None).is_none());
        assert!(Coordinates::from_parts(None, Some(8.0)).is_none());
        assert!(Coordinates::from_parts(Some(95.0), Some(8.0)).is_none());
        assert_eq!(
            Coordinates::from_parts(Some(50.0), Some(8.0)),
            Some(Coordinates::new(50.0, 8.0).unwrap())
        );
    }

    #[test]
    fn test_serializes_as_pair() {
        let p = Coordinates::new(48.0, 11.5).unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "[48.0,11.5]");

        let parsed: Coordinates = serde_json::from_str("[48.0,11.5]").unwrap();
        assert_eq!(parsed, p);
        assert!(serde_json::from_str::<Coordinates>("[120.0,11.5]").is_err());
    }
}

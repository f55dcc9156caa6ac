//! Coordinate and resolution result types.

use serde::{Deserialize, Serialize};

/// A validated latitude/longitude pair.
///
/// Construct through [`LatLng::new`]; it rejects non-finite values,
/// out-of-range values, and the `(0, 0)` pair, which providers emit as an
/// "unset" placeholder rather than a real location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if lat.abs() > 90.0 || lng.abs() > 180.0 {
            return None;
        }
        #[allow(clippy::float_cmp)]
        if lat == 0.0 && lng == 0.0 {
            return None;
        }
        Some(Self { lat, lng })
    }
}

/// Terminal output of a resolution attempt.
///
/// Every field is optional: absence means "not determined". Serialized with
/// camelCase keys and absent fields omitted, so an empty result is `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl ResolvedLocation {
    #[must_use]
    pub fn new(final_url: String, coords: Option<LatLng>) -> Self {
        Self {
            final_url: Some(final_url),
            lat: coords.map(|c| c.lat),
            lng: coords.map(|c| c.lng),
        }
    }

    /// Returns the coordinates when both halves are present.
    #[must_use]
    pub fn coords(&self) -> Option<LatLng> {
        LatLng::new(self.lat?, self.lng?)
    }
}

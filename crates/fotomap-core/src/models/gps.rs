//! GPS extraction result.

use serde::{Deserialize, Serialize};

/// Geolocation extracted from photo metadata.
///
/// One strict numeric contract: coordinates are decimal degrees, altitude is
/// meters above sea level, and `has_gps` is false whenever either coordinate
/// is missing. Formatting for display happens at the UI boundary, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsResult {
    pub has_gps: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl GpsResult {
    pub fn new(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        Self {
            has_gps: true,
            latitude: Some(latitude),
            longitude: Some(longitude),
            altitude,
        }
    }

    /// Absent metadata. This is the normal outcome for photos without
    /// location data, not an error.
    pub fn none() -> Self {
        Self {
            has_gps: false,
            latitude: None,
            longitude: None,
            altitude: None,
        }
    }
}

impl Default for GpsResult {
    fn default() -> Self {
        Self::none()
    }
}

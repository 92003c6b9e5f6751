use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A single reading from the device. Each new fix replaces the previous one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoFix {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_meters: f64,
}

impl GeoFix {
    pub fn new(lat: f64, lng: f64, accuracy_meters: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy_meters,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Shift location the worker must be near. `radius_meters` may be absent
/// upstream, in which case the configured fallback radius applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceTarget {
    pub lat: f64,
    pub lng: f64,
    pub radius_meters: Option<f64>,
}

impl GeofenceTarget {
    pub fn new(lat: f64, lng: f64, radius_meters: Option<f64>) -> Self {
        Self {
            lat,
            lng,
            radius_meters,
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

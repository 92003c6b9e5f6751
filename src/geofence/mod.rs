pub mod distance;
pub mod policy;

pub use distance::haversine_distance_meters;
pub use policy::{can_advance_from_gps_step, is_gps_coordinate_required, is_strict, GpsMode};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::PreconditionError;
use crate::models::{GeoFix, GeoPoint, GeofenceTarget};

/// Radius applied when a target arrives without one. This is a fallback for
/// incomplete shift data, not a business rule.
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// A target with its radius resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    pub fn resolve(target: &GeofenceTarget, fallback_radius_meters: f64) -> Self {
        let radius_meters = match target.radius_meters {
            Some(radius) => radius,
            None => {
                warn!(
                    "Geofence target ({}, {}) has no radius; using fallback of {}m",
                    target.lat, target.lng, fallback_radius_meters
                );
                fallback_radius_meters
            }
        };

        Self::new(target.center(), radius_meters)
    }

    pub fn evaluate(&self, fix: &GeoFix) -> GeofenceEvaluation {
        let distance_meters = haversine_distance_meters(fix.point(), self.center);
        GeofenceEvaluation {
            distance_meters,
            radius_meters: self.radius_meters,
            within: distance_meters <= self.radius_meters,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceEvaluation {
    pub distance_meters: f64,
    pub radius_meters: f64,
    pub within: bool,
}

/// Boundary is inclusive: a point exactly `radius_meters` away is inside.
pub fn is_within_radius(point: GeoPoint, fence: &Geofence) -> bool {
    haversine_distance_meters(point, fence.center) <= fence.radius_meters
}

pub fn validate_target(target: &GeofenceTarget) -> Result<(), PreconditionError> {
    if !target.center().is_valid() {
        return Err(PreconditionError::InvalidTarget(format!(
            "coordinates ({}, {}) are out of range",
            target.lat, target.lng
        )));
    }

    if let Some(radius) = target.radius_meters {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PreconditionError::InvalidTarget(format!(
                "radius {radius} must be a positive number of meters"
            )));
        }
    }

    Ok(())
}

//! Planar geometry over the route polyline.
//!
//! Curvature is measured on a local east/north projection anchored at the
//! trip origin, using latitude-aware degree scaling so segment lengths are
//! not distorted away from the equator.

use crate::error::RiskError;
use crate::models::{Coordinate, LineStringGeometry};

/// Sentinel angle for vertices that cannot form a triplet.
const STRAIGHT_DEG: f64 = 180.0;

/// Profiles averaging at this angle or wider rescale within [0, 1];
/// anything sharper saturates at full curviness.
const CURVINESS_FLOOR_DEG: f64 = 170.0;

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// A route polyline projected to meters east/north of the trip origin.
/// Built once per query from the provider geometry; immutable afterwards.
#[derive(Debug, Clone)]
pub struct RouteGeometry {
    points: Vec<(f64, f64)>,
}

impl RouteGeometry {
    /// Project a GeoJSON line string onto the local plane at `origin`.
    pub fn project(geometry: &LineStringGeometry, origin: Coordinate) -> Result<Self, RiskError> {
        if geometry.coordinates.is_empty() {
            return Err(RiskError::provider(
                "directions",
                "route geometry contains no points",
            ));
        }
        let m_per_deg_lat = meters_per_deg_lat(origin.lat);
        let m_per_deg_lon = meters_per_deg_lon(origin.lat);
        let points = geometry
            .coordinates
            .iter()
            .map(|&[lon, lat]| {
                (
                    (lon - origin.lon) * m_per_deg_lon,
                    (lat - origin.lat) * m_per_deg_lat,
                )
            })
            .collect();
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Per-vertex turn angles in degrees, one entry per polyline vertex.
    /// The first and last vertex have no neighbor triplet and get the
    /// straight sentinel, as does every vertex of a sub-3-point polyline.
    pub fn curvature_profile(&self) -> Vec<f64> {
        if self.points.len() < 3 {
            return vec![STRAIGHT_DEG; self.points.len()];
        }
        let mut profile = Vec::with_capacity(self.points.len());
        profile.push(STRAIGHT_DEG);
        for window in self.points.windows(3) {
            profile.push(turn_angle(window[0], window[1], window[2]));
        }
        profile.push(STRAIGHT_DEG);
        profile
    }

    /// Normalized curviness of the whole route, in [0, 1].
    pub fn curviness(&self) -> f64 {
        aggregate_curviness(&self.curvature_profile())
    }
}

/// Angle at `p2` between the arrows toward `p1` and `p3`, in degrees.
///
/// Computed as `atan2(|cross|, dot)`, which stays numerically stable near
/// 0 and 180. A zero-length arrow (duplicate point) yields 0: no turn is
/// defined there, and it is not an error.
pub fn turn_angle(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) -> f64 {
    let v1 = (p1.0 - p2.0, p1.1 - p2.1);
    let v2 = (p3.0 - p2.0, p3.1 - p2.1);
    if (v1.0 == 0.0 && v1.1 == 0.0) || (v2.0 == 0.0 && v2.1 == 0.0) {
        return 0.0;
    }
    let cross = v1.0 * v2.1 - v1.1 * v2.0;
    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    cross.abs().atan2(dot).to_degrees()
}

/// Collapse a curvature profile to a single score in [0, 1].
///
/// The profile mean is floored at 170 degrees, then rescaled so a dead
/// straight route (mean 180) maps to 0 and anything at or sharper than the
/// floor maps to 1.
pub fn aggregate_curviness(profile: &[f64]) -> f64 {
    if profile.is_empty() {
        return 0.0;
    }
    let mean = profile.iter().sum::<f64>() / profile.len() as f64;
    let clamped = mean.max(CURVINESS_FLOOR_DEG);
    (STRAIGHT_DEG - clamped) / (STRAIGHT_DEG - CURVINESS_FLOOR_DEG)
}

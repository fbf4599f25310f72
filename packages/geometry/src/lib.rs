#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry primitives shared by every routing and monitoring component.
//!
//! Two distance measures are provided:
//!
//! - [`haversine_km`]: great-circle distance on a sphere of radius
//!   [`EARTH_RADIUS_KM`]. Used for all route lengths and radius filters.
//! - [`point_to_segment_meters`]: an approximate planar distance from a
//!   point to a short segment, using meters-per-degree factors evaluated
//!   at the segment's midpoint latitude. Used for "is this point near
//!   that leg" checks and geofence containment only.
//!
//! Everything here is pure and deterministic.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors produced while validating coordinates.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Latitude outside [-90, 90], longitude outside [-180, 180], or a
    /// non-finite component.
    #[error("Invalid coordinate ({lat}, {lng}): latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate {
        /// The rejected latitude.
        lat: f64,
        /// The rejected longitude.
        lng: f64,
    },
}

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidCoordinate`] if either component is
    /// non-finite or out of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeometryError> {
        let coordinate = Self { lat, lng };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Checks that this coordinate is finite and within WGS84 bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidCoordinate`] if it is not.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(GeometryError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Returns `true` if both components are finite and in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Parses a `"lat,lng"` string, as typed into a manual location box.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidCoordinate`] if the text is not two
    /// comma-separated numbers or the numbers are out of range. Unparseable
    /// components are reported as `NaN`.
    pub fn parse(text: &str) -> Result<Self, GeometryError> {
        let mut parts = text.split(',').map(str::trim);
        let lat = parts.next().and_then(|s| s.parse::<f64>().ok());
        let lng = parts.next().and_then(|s| s.parse::<f64>().ok());

        match (lat, lng, parts.next()) {
            (Some(lat), Some(lng), None) => Self::new(lat, lng),
            (lat, lng, _) => Err(GeometryError::InvalidCoordinate {
                lat: lat.unwrap_or(f64::NAN),
                lng: lng.unwrap_or(f64::NAN),
            }),
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        Self::new(c.lng, c.lat)
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(p: geo::Point<f64>) -> Self {
        Self {
            lat: p.y(),
            lng: p.x(),
        }
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::coord! { x: c.lng, y: c.lat }
    }
}

/// Great-circle distance in kilometers between two points.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Meters per degree of latitude and longitude at the given latitude.
///
/// Returns `(meters_per_deg_lat, meters_per_deg_lng)`.
#[must_use]
pub fn meters_per_degree(lat: f64) -> (f64, f64) {
    let lat_rad = lat.to_radians();
    let per_lat = 1.175f64.mul_add(
        (4.0 * lat_rad).cos(),
        559.82f64.mul_add(-(2.0 * lat_rad).cos(), 111_132.92),
    );
    let per_lng = 111_412.84f64.mul_add(lat_rad.cos(), -93.5 * (3.0 * lat_rad).cos());
    (per_lat, per_lng)
}

/// Approximate distance in meters from `p` to the segment `a`–`b`.
///
/// Projects all three points onto a local plane scaled by
/// [`meters_per_degree`] at the segment's midpoint latitude and returns
/// the Euclidean distance to the closest point on the segment. A
/// degenerate segment (`a == b`) yields the point-to-point distance.
///
/// Only meaningful for short segments (a few tens of kilometers).
#[must_use]
pub fn point_to_segment_meters(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    let (per_lat, per_lng) = meters_per_degree(f64::midpoint(a.lat, b.lat));

    let (ax, ay) = (a.lng * per_lng, a.lat * per_lat);
    let (bx, by) = (b.lng * per_lng, b.lat * per_lat);
    let (px, py) = (p.lng * per_lng, p.lat * per_lat);

    let (vx, vy) = (bx - ax, by - ay);
    let (wx, wy) = (px - ax, py - ay);

    let c1 = vx.mul_add(wx, vy * wy);
    let c2 = vx.mul_add(vx, vy * vy);
    let t = if c2 == 0.0 { 0.0 } else { (c1 / c2).clamp(0.0, 1.0) };

    let (cx, cy) = (t.mul_add(vx, ax), t.mul_add(vy, ay));
    (px - cx).hypot(py - cy)
}

/// Approximate planar distance in meters between two nearby points.
#[must_use]
pub fn planar_distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    point_to_segment_meters(a, b, b)
}

/// Euclidean distance in raw degree space.
///
/// Not a physical distance; used where thresholds are expressed in
/// degrees (roughly 0.01° ≈ 1.1 km).
#[must_use]
pub fn degree_distance(a: Coordinate, b: Coordinate) -> f64 {
    (a.lat - b.lat).hypot(a.lng - b.lng)
}

/// Linear interpolation between `a` and `b` in lat/lng space.
///
/// `ratio = 0` yields `a`, `ratio = 1` yields `b`.
#[must_use]
pub fn interpolate(a: Coordinate, b: Coordinate, ratio: f64) -> Coordinate {
    Coordinate {
        lat: (b.lat - a.lat).mul_add(ratio, a.lat),
        lng: (b.lng - a.lng).mul_add(ratio, a.lng),
    }
}

/// Lat/lng midpoint of `a` and `b`.
#[must_use]
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    Coordinate {
        lat: f64::midpoint(a.lat, b.lat),
        lng: f64::midpoint(a.lng, b.lng),
    }
}

/// Sum of great-circle leg lengths along `path`, in kilometers.
#[must_use]
pub fn path_length_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHENNAI: Coordinate = Coordinate {
        lat: 13.0827,
        lng: 80.2707,
    };
    const T_NAGAR: Coordinate = Coordinate {
        lat: 13.0405,
        lng: 80.2337,
    };

    #[test]
    fn haversine_zero_for_identical_points() {
        assert!(haversine_km(CHENNAI, CHENNAI).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let a = Coordinate { lat: 0.0, lng: 0.0 };
        let b = Coordinate { lat: 1.0, lng: 0.0 };
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((haversine_km(a, b) - expected).abs() < 1e-9);
    }

    #[test]
    fn haversine_is_symmetric_and_deterministic() {
        let ab = haversine_km(CHENNAI, T_NAGAR);
        let ba = haversine_km(T_NAGAR, CHENNAI);
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab.to_bits() == haversine_km(CHENNAI, T_NAGAR).to_bits());
        // Central Chennai to T. Nagar is a little over 6 km.
        assert!(ab > 6.0 && ab < 6.5, "got {ab}");
    }

    #[test]
    fn haversine_is_finite_for_antipodal_points() {
        let half_circumference = EARTH_RADIUS_KM * std::f64::consts::PI;
        for step in -90..=90 {
            let lat = f64::from(step) * 0.5;
            let a = Coordinate { lat, lng: 0.0 };
            let b = Coordinate {
                lat: -lat,
                lng: 180.0,
            };
            let d = haversine_km(a, b);
            assert!(d.is_finite(), "NaN at lat {lat}");
            assert!((d - half_circumference).abs() < 1e-6, "lat {lat}: {d}");
        }
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Coordinate { lat: 13.0, lng: 80.0 };
        let b = Coordinate { lat: 13.0, lng: 80.01 };
        let beyond = Coordinate { lat: 13.0, lng: 80.02 };

        let to_segment = point_to_segment_meters(beyond, a, b);
        let to_endpoint = planar_distance_meters(beyond, b);
        assert!((to_segment - to_endpoint).abs() < 1e-6);
    }

    #[test]
    fn segment_distance_perpendicular_offset() {
        let a = Coordinate { lat: 13.0, lng: 80.0 };
        let b = Coordinate { lat: 13.0, lng: 80.02 };
        let above = Coordinate {
            lat: 13.001,
            lng: 80.01,
        };

        let (per_lat, _) = meters_per_degree(13.0);
        let d = point_to_segment_meters(above, a, b);
        assert!((d - 0.001 * per_lat).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn degenerate_segment_is_point_distance() {
        let d = point_to_segment_meters(T_NAGAR, CHENNAI, CHENNAI);
        let km = haversine_km(T_NAGAR, CHENNAI);
        // Planar approximation within 1% of the great-circle distance.
        assert!((d / 1000.0 - km).abs() / km < 0.01, "planar {d} m vs {km} km");
    }

    #[test]
    fn longitude_compresses_with_latitude() {
        let (_, equator) = meters_per_degree(0.0);
        let (_, north) = meters_per_degree(60.0);
        assert!(north < equator / 1.9);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn parses_manual_input() {
        assert_eq!(Coordinate::parse(" 13.0827 , 80.2707 "), Ok(CHENNAI));
        assert!(Coordinate::parse("13.0827").is_err());
        assert!(Coordinate::parse("13.0827,80.27,1").is_err());
        assert!(Coordinate::parse("north,80.27").is_err());
        assert!(Coordinate::parse("95,80.27").is_err());
    }

    #[test]
    fn path_length_sums_legs() {
        let mid = midpoint(CHENNAI, T_NAGAR);
        let total = path_length_km(&[CHENNAI, mid, T_NAGAR]);
        let direct = haversine_km(CHENNAI, T_NAGAR);
        assert!((total - direct).abs() < 1e-3);
        assert!(path_length_km(&[CHENNAI]).abs() < f64::EPSILON);
    }

    #[test]
    fn interpolate_endpoints() {
        assert_eq!(interpolate(CHENNAI, T_NAGAR, 0.0), CHENNAI);
        let end = interpolate(CHENNAI, T_NAGAR, 1.0);
        assert!((end.lat - T_NAGAR.lat).abs() < 1e-12);
        assert!((end.lng - T_NAGAR.lng).abs() < 1e-12);
    }

    #[test]
    fn geo_point_roundtrip_keeps_axis_order() {
        let point: geo::Point<f64> = CHENNAI.into();
        assert!((point.x() - CHENNAI.lng).abs() < f64::EPSILON);
        assert_eq!(Coordinate::from(point), CHENNAI);
    }
}

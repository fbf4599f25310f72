#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Safe-route planning for citizens.
//!
//! The planner checks the midpoint of the direct path against nearby
//! high-risk hotspots. If the midpoint is risky it tries four detour
//! points, offset from the midpoint north, south, east and west, and
//! inserts the one with the lowest hotspot pressure. Only one detour is
//! ever inserted; a detour that still passes close to a hotspot is
//! returned as-is.

pub mod along;

use citysafe_geometry::{Coordinate, GeometryError, degree_distance, midpoint, path_length_km};
use citysafe_hotspot_models::HotspotPoint;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

pub use along::hotspots_along_route;

/// Errors from safe-route planning.
#[derive(Debug, thiserror::Error)]
pub enum SafeRouteError {
    /// Source or destination is not a valid coordinate.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Tunables for the detour heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeRouteConfig {
    /// Hotspots at or above this intensity can make a midpoint risky.
    pub risk_intensity_threshold: f64,
    /// Degree distance within which a hotspot makes the midpoint risky.
    pub risk_radius_deg: f64,
    /// Offset of each detour candidate from the midpoint, in degrees.
    pub detour_offset_deg: f64,
    /// Added to every distance when scoring so a coincident hotspot
    /// doesn't divide by zero.
    pub score_epsilon: f64,
    /// Default corridor width for [`hotspots_along_route`], in meters.
    pub along_route_max_distance_m: f64,
}

impl Default for SafeRouteConfig {
    fn default() -> Self {
        Self {
            risk_intensity_threshold: 0.8,
            risk_radius_deg: 0.01,
            detour_offset_deg: 0.02,
            score_epsilon: 1e-4,
            along_route_max_distance_m: 10_000.0,
        }
    }
}

/// Direction a detour point was offset from the midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Heading {
    /// Positive latitude offset.
    North,
    /// Negative latitude offset.
    South,
    /// Positive longitude offset.
    East,
    /// Negative longitude offset.
    West,
}

impl Heading {
    /// Candidate order. Earlier headings win score ties.
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// Offsets `origin` by `delta` degrees in this direction.
    #[must_use]
    pub fn offset(self, origin: Coordinate, delta: f64) -> Coordinate {
        let (d_lat, d_lng) = match self {
            Self::North => (delta, 0.0),
            Self::South => (-delta, 0.0),
            Self::East => (0.0, delta),
            Self::West => (0.0, -delta),
        };
        Coordinate {
            lat: origin.lat + d_lat,
            lng: origin.lng + d_lng,
        }
    }
}

/// The detour point inserted into a [`SafeRoute`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detour {
    /// Where the detour point is.
    pub coordinate: Coordinate,
    /// Which way it was offset from the direct midpoint.
    pub heading: Heading,
    /// Its hotspot-pressure score. Lower is safer.
    pub score: f64,
}

/// A citizen route from source to destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeRoute {
    /// Starting point.
    pub source: Coordinate,
    /// End point.
    pub destination: Coordinate,
    /// `[source, destination]`, or `[source, detour, destination]`.
    pub waypoints: Vec<Coordinate>,
    /// Sum of great-circle leg lengths through `waypoints`.
    pub distance_km: f64,
    /// The inserted detour, if the direct midpoint was risky and a
    /// detour point within coordinate bounds exists.
    pub detour: Option<Detour>,
}

impl SafeRoute {
    /// Whether a detour point was inserted.
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        self.detour.is_none()
    }

    /// The route as a `geo` line string (x = longitude, y = latitude).
    #[must_use]
    pub fn to_line_string(&self) -> geo::LineString<f64> {
        self.waypoints
            .iter()
            .copied()
            .map(geo::Coord::from)
            .collect()
    }
}

/// Plans safe routes with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct SafeRoutePlanner {
    config: SafeRouteConfig,
}

impl SafeRoutePlanner {
    /// Creates a planner.
    #[must_use]
    pub const fn new(config: SafeRouteConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SafeRouteConfig {
        &self.config
    }

    /// High-risk hotspots close enough to `point` to make it unsafe.
    pub fn risky_hotspots_near<'a>(
        &'a self,
        point: Coordinate,
        hotspots: &'a [HotspotPoint],
    ) -> impl Iterator<Item = &'a HotspotPoint> + 'a {
        hotspots.iter().filter(move |h| {
            h.intensity >= self.config.risk_intensity_threshold
                && degree_distance(point, h.coordinate()) <= self.config.risk_radius_deg
        })
    }

    /// Hotspot pressure at `point`: `Σ intensity / (distance + ε)` over
    /// every hotspot, with distance in degrees.
    #[must_use]
    pub fn pressure(&self, point: Coordinate, hotspots: &[HotspotPoint]) -> f64 {
        hotspots
            .iter()
            .map(|h| h.intensity / (degree_distance(point, h.coordinate()) + self.config.score_epsilon))
            .sum()
    }

    /// Plans a route from `source` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`SafeRouteError::Geometry`] if either endpoint is invalid.
    pub fn plan_route(
        &self,
        source: Coordinate,
        destination: Coordinate,
        hotspots: &[HotspotPoint],
    ) -> Result<SafeRoute, SafeRouteError> {
        source.validate()?;
        destination.validate()?;

        let mid = midpoint(source, destination);
        let risky = self.risky_hotspots_near(mid, hotspots).count();

        let detour = if risky == 0 {
            None
        } else {
            let detour = self.best_detour(mid, hotspots);
            match &detour {
                Some(d) => log::debug!(
                    "Midpoint {mid} near {risky} high-risk hotspot(s), detouring {} to {} (score {:.2})",
                    d.heading,
                    d.coordinate,
                    d.score,
                ),
                None => log::warn!(
                    "Midpoint {mid} near {risky} high-risk hotspot(s), but every detour leaves valid coordinates"
                ),
            }
            detour
        };

        let waypoints = detour.map_or_else(
            || vec![source, destination],
            |d| vec![source, d.coordinate, destination],
        );
        let distance_km = path_length_km(&waypoints);

        log::info!(
            "Safe route {source} -> {destination}: {:.2} km, {}",
            distance_km,
            if detour.is_some() { "with detour" } else { "direct" },
        );

        Ok(SafeRoute {
            source,
            destination,
            waypoints,
            distance_km,
            detour,
        })
    }

    /// Lowest-pressure detour around `mid`. Strictly lower scores win, so
    /// ties keep [`Heading::ALL`] order. Candidates past the poles or the
    /// antimeridian are skipped; `None` if none remain.
    fn best_detour(&self, mid: Coordinate, hotspots: &[HotspotPoint]) -> Option<Detour> {
        Heading::ALL
            .into_iter()
            .map(|heading| (heading, heading.offset(mid, self.config.detour_offset_deg)))
            .filter(|(_, coordinate)| coordinate.is_valid())
            .map(|(heading, coordinate)| Detour {
                coordinate,
                heading,
                score: self.pressure(coordinate, hotspots),
            })
            .reduce(|best, candidate| {
                if candidate.score < best.score {
                    candidate
                } else {
                    best
                }
            })
    }

    /// [`hotspots_along_route`] with the configured corridor width.
    #[must_use]
    pub fn hotspots_along<'a>(
        &self,
        route: &SafeRoute,
        hotspots: &'a [HotspotPoint],
    ) -> Vec<&'a HotspotPoint> {
        hotspots_along_route(
            &route.waypoints,
            hotspots,
            self.config.along_route_max_distance_m,
        )
    }
}

/// Plans a route with the default configuration.
///
/// # Errors
///
/// See [`SafeRoutePlanner::plan_route`].
pub fn plan_route(
    source: Coordinate,
    destination: Coordinate,
    hotspots: &[HotspotPoint],
) -> Result<SafeRoute, SafeRouteError> {
    SafeRoutePlanner::default().plan_route(source, destination, hotspots)
}

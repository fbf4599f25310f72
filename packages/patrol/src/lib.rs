#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Patrol route optimizer.
//!
//! Given a starting position and a classified hotspot set, produces a
//! [`PatrolRoute`] visiting up to `max_stops` nearby hotspots:
//!
//! 1. **Local filtering**: keep hotspots within the radius of the
//!   [`areas::ServiceArea`] containing the start, or within
//!   [`PatrolConfig::default_radius_km`] when no area matches.
//! 2. **Candidate selection**: top `max_stops` by priority, then
//!   intensity.
//! 3. **Ordering**: priority-biased nearest-neighbor walk
//!   ([`scoring::order_stops`]).
//! 4. **Metrics and waypoints**: see [`path`].
//!
//! The optimizer is a pure function of its inputs apart from the route
//! id; callers own the result and drive its lifecycle.

pub mod areas;
pub mod path;
pub mod scoring;

use std::collections::BTreeSet;

use citysafe_geometry::{Coordinate, GeometryError, haversine_km};
use citysafe_hotspot_models::HotspotPoint;
use citysafe_patrol_models::{PatrolRoute, PatrolShift, PatrolStatus};
use serde::{Deserialize, Serialize};

use crate::areas::{ServiceArea, all_service_areas, find_service_area};

/// Errors that can occur while planning a patrol.
#[derive(Debug, thiserror::Error)]
pub enum PatrolError {
    /// No hotspots were supplied at all.
    #[error("No hotspot data available")]
    EmptyInput,

    /// Hotspots exist, but none are within patrol range.
    #[error("No hotspots in range: none within {radius_km} km ({area})")]
    NoLocalHotspots {
        /// The radius that was applied.
        radius_km: f64,
        /// Name of the matched service area, or `"default radius"`.
        area: String,
    },

    /// `max_stops` was zero.
    #[error("max_stops must be at least 1")]
    InvalidMaxStops,

    /// The starting position is not a valid coordinate.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Largest accepted [`PatrolConfig::max_checkpoints_per_leg`].
pub const MAX_CHECKPOINTS_PER_LEG: usize = 100;

/// Tunables for patrol planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Stops per route when the request does not say.
    pub max_stops: usize,
    /// Filtering radius when the start is outside every service area.
    pub default_radius_km: f64,
    /// Assumed travel speed for duration estimates.
    pub average_speed_kmh: f64,
    /// Legs at or below this length get no checkpoints.
    pub checkpoint_min_leg_km: f64,
    /// One checkpoint per this many kilometers of leg.
    pub checkpoint_spacing_km: f64,
    /// Upper bound on checkpoints per leg, at most [`MAX_CHECKPOINTS_PER_LEG`].
    pub max_checkpoints_per_leg: usize,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            max_stops: 6,
            default_radius_km: 15.0,
            average_speed_kmh: 30.0,
            checkpoint_min_leg_km: 2.0,
            checkpoint_spacing_km: 1.5,
            max_checkpoints_per_leg: 3,
        }
    }
}

/// Per-call options for [`PatrolOptimizer::optimize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatrolRequest {
    /// Overrides [`PatrolConfig::max_stops`].
    pub max_stops: Option<usize>,
    /// Shift used in the route name.
    pub shift: PatrolShift,
    /// Officers or units to assign.
    pub assigned_subjects: BTreeSet<String>,
}

/// Which radius local filtering applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolScope {
    /// The matched service area, if any.
    pub area: Option<ServiceArea>,
    /// The radius in kilometers.
    pub radius_km: f64,
}

impl PatrolScope {
    fn label(&self) -> String {
        self.area
            .as_ref()
            .map_or_else(|| "default radius".to_string(), |a| a.name.clone())
    }
}

/// Patrol planner bound to a configuration and service-area table.
#[derive(Debug, Clone)]
pub struct PatrolOptimizer {
    config: PatrolConfig,
    areas: Vec<ServiceArea>,
}

impl Default for PatrolOptimizer {
    fn default() -> Self {
        Self::new(PatrolConfig::default())
    }
}

impl PatrolOptimizer {
    /// Creates an optimizer using the embedded service areas.
    #[must_use]
    pub fn new(config: PatrolConfig) -> Self {
        Self {
            config,
            areas: all_service_areas(),
        }
    }

    /// Replaces the service-area table.
    #[must_use]
    pub fn with_service_areas(mut self, areas: Vec<ServiceArea>) -> Self {
        self.areas = areas;
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &PatrolConfig {
        &self.config
    }

    /// The service areas used for local filtering.
    #[must_use]
    pub fn service_areas(&self) -> &[ServiceArea] {
        &self.areas
    }

    /// Determines the filtering radius for a starting position.
    #[must_use]
    pub fn scope_for(&self, location: Coordinate) -> PatrolScope {
        find_service_area(&self.areas, location).map_or(
            PatrolScope {
                area: None,
                radius_km: self.config.default_radius_km,
            },
            |area| PatrolScope {
                area: Some(area.clone()),
                radius_km: area.radius_km,
            },
        )
    }

    /// Hotspots within patrol range of `location`, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`PatrolError::NoLocalHotspots`] if none are in range.
    pub fn local_hotspots<'a>(
        &self,
        location: Coordinate,
        hotspots: &'a [HotspotPoint],
    ) -> Result<(Vec<&'a HotspotPoint>, PatrolScope), PatrolError> {
        let scope = self.scope_for(location);

        let local: Vec<&HotspotPoint> = hotspots
            .iter()
            .filter(|h| haversine_km(location, h.coordinate()) <= scope.radius_km)
            .collect();

        log::debug!(
            "Filtered {} local hotspots from {} total ({} km, {})",
            local.len(),
            hotspots.len(),
            scope.radius_km,
            scope.label(),
        );

        if local.is_empty() {
            return Err(PatrolError::NoLocalHotspots {
                radius_km: scope.radius_km,
                area: scope.label(),
            });
        }

        Ok((local, scope))
    }

    /// Plans a patrol route from `current_location` over `hotspots`.
    ///
    /// # Errors
    ///
    /// * [`PatrolError::Geometry`] if `current_location` is invalid.
    /// * [`PatrolError::EmptyInput`] if `hotspots` is empty.
    /// * [`PatrolError::InvalidMaxStops`] if the effective `max_stops` is 0.
    /// * [`PatrolError::NoLocalHotspots`] if nothing is in range.
    pub fn optimize(
        &self,
        current_location: Coordinate,
        hotspots: &[HotspotPoint],
        request: &PatrolRequest,
    ) -> Result<PatrolRoute, PatrolError> {
        current_location.validate()?;
        if hotspots.is_empty() {
            return Err(PatrolError::EmptyInput);
        }
        let max_stops = request.max_stops.unwrap_or(self.config.max_stops);
        if max_stops == 0 {
            return Err(PatrolError::InvalidMaxStops);
        }

        let (local, scope) = self.local_hotspots(current_location, hotspots)?;
        let candidates = scoring::select_candidates(local, max_stops);
        let stops = scoring::order_stops(current_location, candidates);

        let metrics = path::route_metrics(current_location, &stops, self.config.average_speed_kmh);
        let waypoints = path::materialize_waypoints(current_location, &stops, &self.config);

        let route = PatrolRoute {
            id: format!("route_{}", uuid::Uuid::new_v4()),
            name: format!("{} Patrol Route", request.shift),
            waypoints,
            total_distance_km: metrics.total_distance_km,
            estimated_duration_min: metrics.estimated_duration_min,
            status: PatrolStatus::Scheduled,
            assigned_subjects: request.assigned_subjects.clone(),
            start_time: None,
            end_time: None,
            efficiency_score: metrics.efficiency_score,
        };

        log::info!(
            "Planned {} in {}: {} stops, {:.2} km, {:.0} min, efficiency {}",
            route.name,
            scope.label(),
            stops.len(),
            route.total_distance_km,
            route.estimated_duration_min,
            route.efficiency_score,
        );

        Ok(route)
    }
}

/// Plans a route with default configuration and the given stop limit.
///
/// # Errors
///
/// See [`PatrolOptimizer::optimize`].
pub fn optimize(
    current_location: Coordinate,
    hotspots: &[HotspotPoint],
    max_stops: usize,
) -> Result<PatrolRoute, PatrolError> {
    PatrolOptimizer::default().optimize(
        current_location,
        hotspots,
        &PatrolRequest {
            max_stops: Some(max_stops),
            ..PatrolRequest::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use citysafe_hotspot::sample::sample_hotspots;
    use citysafe_hotspot_models::RiskLevel;
    use citysafe_patrol_models::{WaypointStatus, WaypointType};

    use super::*;

    const CHENNAI: Coordinate = Coordinate {
        lat: 13.0827,
        lng: 80.2707,
    };

    fn hotspot(area: &str, lat: f64, lng: f64, intensity: f64, level: RiskLevel) -> HotspotPoint {
        HotspotPoint::new(Coordinate { lat, lng }, intensity, level, area, 0)
    }

    fn high_risk_five() -> Vec<HotspotPoint> {
        vec![
            hotspot("T. Nagar", 13.0405, 80.2337, 0.95, RiskLevel::High),
            hotspot("Mylapore", 13.0368, 80.2676, 0.92, RiskLevel::High),
            hotspot("Guindy", 13.0064, 80.2206, 0.88, RiskLevel::High),
            hotspot("Anna Nagar", 13.0850, 80.2101, 0.85, RiskLevel::High),
            hotspot("Kilpauk", 13.0827, 80.2442, 0.82, RiskLevel::High),
        ]
    }

    fn stop_coordinates(route: &PatrolRoute) -> Vec<Coordinate> {
        route.hotspot_stops().map(citysafe_patrol_models::Waypoint::coordinate).collect()
    }

    #[test]
    fn chennai_high_risk_example() {
        let route = optimize(CHENNAI, &high_risk_five(), 6).unwrap();

        assert_eq!(route.hotspot_stops().count(), 5);
        assert!(route.efficiency_score > 80);
        assert_eq!(route.status, PatrolStatus::Scheduled);
        assert_eq!(route.name, "Morning Patrol Route");
        assert!(route.id.starts_with("route_"));
    }

    #[test]
    fn total_distance_is_sum_of_haversine_legs() {
        let route = optimize(CHENNAI, &sample_hotspots(), 6).unwrap();

        let mut expected = 0.0;
        let mut previous = CHENNAI;
        for stop in stop_coordinates(&route) {
            expected += haversine_km(previous, stop);
            previous = stop;
        }
        assert!(
            (route.total_distance_km - expected).abs() < 1e-9,
            "{} vs {expected}",
            route.total_distance_km
        );
    }

    #[test]
    fn duration_is_dwell_plus_travel() {
        let route = optimize(CHENNAI, &high_risk_five(), 6).unwrap();
        let dwell: u32 = route.hotspot_stops().map(|w| w.estimated_time).sum();
        let expected = f64::from(dwell) + route.total_distance_km / 30.0 * 60.0;
        assert!((route.estimated_duration_min - expected).abs() < 1e-9);
    }

    #[test]
    fn never_exceeds_max_stops() {
        let hotspots = sample_hotspots();
        for max_stops in 1..=10 {
            let route = optimize(CHENNAI, &hotspots, max_stops).unwrap();
            assert!(route.hotspot_stops().count() <= max_stops);
        }
    }

    #[test]
    fn never_selects_outside_service_radius() {
        let mut hotspots = high_risk_five();
        // Salem: well outside Chennai's 25 km radius.
        hotspots.push(hotspot("Salem Junction", 11.6643, 78.1460, 1.0, RiskLevel::High));

        let route = optimize(CHENNAI, &hotspots, 6).unwrap();
        assert_eq!(route.hotspot_stops().count(), 5);
        for stop in stop_coordinates(&route) {
            assert!(haversine_km(CHENNAI, stop) <= 25.0);
        }
    }

    #[test]
    fn default_radius_outside_service_areas() {
        let trichy = Coordinate {
            lat: 10.7905,
            lng: 78.7047,
        };
        let hotspots = vec![
            hotspot("near", 10.80, 78.70, 0.9, RiskLevel::High),
            // ~20 km north: inside a 25 km city radius, outside the 15 km default.
            hotspot("outer", 10.97, 78.7047, 0.9, RiskLevel::High),
        ];

        let route = optimize(trichy, &hotspots, 6).unwrap();
        let names: Vec<&str> = route.hotspot_stops().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["near"]);
    }

    #[test]
    fn higher_priority_seeds_route_at_equal_intensity() {
        let hotspots = vec![
            hotspot("medium-near", 13.0830, 80.2710, 0.7, RiskLevel::Medium),
            hotspot("high-far", 13.0064, 80.2206, 0.7, RiskLevel::High),
        ];
        let route = optimize(CHENNAI, &hotspots, 6).unwrap();
        assert_eq!(route.hotspot_stops().next().map(|w| w.name.as_str()), Some("high-far"));
    }

    #[test]
    fn first_waypoint_is_completed_station() {
        let route = optimize(CHENNAI, &sample_hotspots(), 3).unwrap();
        let first = &route.waypoints[0];
        assert_eq!(first.waypoint_type, WaypointType::Station);
        assert_eq!(first.status, WaypointStatus::Completed);
        assert_eq!(first.coordinate(), CHENNAI);
        assert!(route.waypoints[1..].iter().all(|w| w.status == WaypointStatus::Pending));
    }

    #[test]
    fn no_local_hotspots_is_reported() {
        let delhi = Coordinate {
            lat: 28.6139,
            lng: 77.2090,
        };
        let err = optimize(delhi, &sample_hotspots(), 6).unwrap_err();
        assert!(matches!(
            err,
            PatrolError::NoLocalHotspots { radius_km, .. } if (radius_km - 15.0).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn input_validation() {
        assert!(matches!(
            optimize(CHENNAI, &[], 6),
            Err(PatrolError::EmptyInput)
        ));
        assert!(matches!(
            optimize(CHENNAI, &sample_hotspots(), 0),
            Err(PatrolError::InvalidMaxStops)
        ));
        let bad = Coordinate {
            lat: 13.0,
            lng: 181.0,
        };
        assert!(matches!(
            optimize(bad, &sample_hotspots(), 6),
            Err(PatrolError::Geometry(_))
        ));
    }

    #[test]
    fn request_options_flow_into_route() {
        let request = PatrolRequest {
            max_stops: Some(2),
            shift: PatrolShift::Night,
            assigned_subjects: ["Officer Priya".to_string()].into_iter().collect(),
        };
        let route = PatrolOptimizer::default()
            .optimize(CHENNAI, &sample_hotspots(), &request)
            .unwrap();

        assert_eq!(route.name, "Night Patrol Route");
        assert_eq!(route.hotspot_stops().count(), 2);
        assert!(route.assigned_subjects.contains("Officer Priya"));
    }

    #[test]
    fn custom_service_areas_replace_embedded_table() {
        let optimizer = PatrolOptimizer::default().with_service_areas(vec![ServiceArea {
            id: "tiny".to_string(),
            name: "Tiny".to_string(),
            center_lat: CHENNAI.lat,
            center_lng: CHENNAI.lng,
            radius_km: 5.0,
        }]);
        let route = optimizer
            .optimize(CHENNAI, &sample_hotspots(), &PatrolRequest::default())
            .unwrap();
        for stop in stop_coordinates(&route) {
            assert!(haversine_km(CHENNAI, stop) <= 5.0);
        }
    }
}

//! Route metrics and waypoint materialization.

use citysafe_geometry::{Coordinate, haversine_km, interpolate};
use citysafe_hotspot_models::HotspotPoint;
use citysafe_patrol_models::{Waypoint, WaypointStatus, WaypointType};

use crate::PatrolConfig;

/// Distance, duration, and efficiency of an ordered stop list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteMetrics {
    /// Start-to-first-stop leg plus every stop-to-stop leg, in km.
    pub total_distance_km: f64,
    /// Dwell minutes at every stop plus travel minutes.
    pub estimated_duration_min: f64,
    /// `round(mean(priority × intensity) × 100)`.
    pub efficiency_score: u32,
}

/// Computes metrics for visiting `stops` in order from `start`.
///
/// Checkpoints never enter here; they are visual only.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn route_metrics(start: Coordinate, stops: &[&HotspotPoint], average_speed_kmh: f64) -> RouteMetrics {
    let mut total_distance_km = 0.0;
    let mut previous = start;
    for stop in stops {
        total_distance_km += haversine_km(previous, stop.coordinate());
        previous = stop.coordinate();
    }

    let dwell_min: f64 = stops
        .iter()
        .map(|s| f64::from(s.estimated_dwell_minutes))
        .sum();
    let travel_min = total_distance_km / average_speed_kmh * 60.0;

    let efficiency_score = if stops.is_empty() {
        0
    } else {
        let mean = stops.iter().map(|s| s.weighted_intensity()).sum::<f64>() / stops.len() as f64;
        (mean * 100.0).round() as u32
    };

    RouteMetrics {
        total_distance_km,
        estimated_duration_min: dwell_min + travel_min,
        efficiency_score,
    }
}

/// Builds the waypoint list: the station, then each stop preceded by the
/// checkpoints of the leg leading to it.
#[must_use]
pub fn materialize_waypoints(
    start: Coordinate,
    stops: &[&HotspotPoint],
    config: &PatrolConfig,
) -> Vec<Waypoint> {
    let mut waypoints = vec![Waypoint {
        lat: start.lat,
        lng: start.lng,
        name: "Current Location".to_string(),
        waypoint_type: WaypointType::Station,
        priority: 0,
        estimated_time: 0,
        status: WaypointStatus::Completed,
    }];

    let mut previous = start;
    for (index, stop) in stops.iter().enumerate() {
        waypoints.extend(leg_checkpoints(previous, stop.coordinate(), index + 1, config));
        waypoints.push(Waypoint {
            lat: stop.lat,
            lng: stop.lng,
            name: stop.area.clone(),
            waypoint_type: WaypointType::Hotspot,
            priority: stop.priority,
            estimated_time: stop.estimated_dwell_minutes,
            status: WaypointStatus::Pending,
        });
        previous = stop.coordinate();
    }

    waypoints
}

/// Number of checkpoints to place on a leg of `distance_km`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn checkpoint_count(distance_km: f64, config: &PatrolConfig) -> usize {
    if distance_km <= config.checkpoint_min_leg_km || config.checkpoint_spacing_km <= 0.0 {
        return 0;
    }
    let by_spacing = (distance_km / config.checkpoint_spacing_km).floor() as usize;
    by_spacing.min(config.max_checkpoints_per_leg)
}

#[allow(clippy::cast_precision_loss)]
fn leg_checkpoints(
    from: Coordinate,
    to: Coordinate,
    segment: usize,
    config: &PatrolConfig,
) -> Vec<Waypoint> {
    let count = checkpoint_count(haversine_km(from, to), config);

    (1..=count)
        .map(|i| {
            let point = interpolate(from, to, i as f64 / (count + 1) as f64);
            Waypoint {
                lat: point.lat,
                lng: point.lng,
                name: format!("Route Point {segment}.{i}"),
                waypoint_type: WaypointType::Checkpoint,
                priority: 0,
                estimated_time: 0,
                status: WaypointStatus::Pending,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use citysafe_hotspot_models::RiskLevel;

    use super::*;

    const START: Coordinate = Coordinate {
        lat: 13.0827,
        lng: 80.2707,
    };

    #[test]
    fn checkpoint_count_rules() {
        let config = PatrolConfig::default();
        assert_eq!(checkpoint_count(1.0, &config), 0);
        assert_eq!(checkpoint_count(2.0, &config), 0);
        assert_eq!(checkpoint_count(2.5, &config), 1);
        assert_eq!(checkpoint_count(3.1, &config), 2);
        assert_eq!(checkpoint_count(4.6, &config), 3);
        assert_eq!(checkpoint_count(40.0, &config), 3);
    }

    #[test]
    fn checkpoints_are_evenly_spaced_and_weightless() {
        let far = HotspotPoint::new(
            Coordinate {
                lat: 13.0064,
                lng: 80.2206,
            },
            0.9,
            RiskLevel::High,
            "Guindy",
            0,
        );
        let waypoints = materialize_waypoints(START, &[&far], &PatrolConfig::default());

        // Station, three checkpoints, then the hotspot.
        assert_eq!(waypoints.len(), 5);
        let checkpoints = &waypoints[1..4];
        for (i, cp) in checkpoints.iter().enumerate() {
            assert_eq!(cp.waypoint_type, WaypointType::Checkpoint);
            assert_eq!(cp.priority, 0);
            assert_eq!(cp.estimated_time, 0);
            assert_eq!(cp.name, format!("Route Point 1.{}", i + 1));
        }
        let quarter = interpolate(START, far.coordinate(), 0.25);
        assert!((checkpoints[0].lat - quarter.lat).abs() < 1e-12);
        assert!((checkpoints[0].lng - quarter.lng).abs() < 1e-12);
    }

    #[test]
    fn unbounded_checkpoint_limit_only_follows_spacing() {
        let config = PatrolConfig {
            max_checkpoints_per_leg: usize::MAX,
            ..PatrolConfig::default()
        };
        let far = HotspotPoint::new(
            Coordinate {
                lat: 13.0064,
                lng: 80.2206,
            },
            0.9,
            RiskLevel::High,
            "Guindy",
            0,
        );
        let leg = haversine_km(START, far.coordinate());
        let waypoints = materialize_waypoints(START, &[&far, &far], &config);

        // About 10 km at 1.5 km spacing gives six checkpoints; the zero-length
        // second leg gives none.
        assert!(leg > 9.0 && leg < 10.5, "got {leg}");
        assert_eq!(checkpoint_count(leg, &config), 6);
        assert_eq!(waypoints.len(), 1 + 6 + 2);
    }

    #[test]
    fn metrics_for_single_stop() {
        let stop = HotspotPoint::new(
            Coordinate {
                lat: 13.0405,
                lng: 80.2337,
            },
            0.9,
            RiskLevel::High,
            "T. Nagar",
            0,
        );
        let metrics = route_metrics(START, &[&stop], 30.0);
        let leg = haversine_km(START, stop.coordinate());

        assert!((metrics.total_distance_km - leg).abs() < 1e-12);
        assert!((metrics.estimated_duration_min - (15.0 + leg * 2.0)).abs() < 1e-9);
        assert_eq!(metrics.efficiency_score, 270);
    }
}

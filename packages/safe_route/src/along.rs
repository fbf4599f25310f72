//! Hotspots near a route.

use citysafe_geometry::{Coordinate, planar_distance_meters, point_to_segment_meters};
use citysafe_hotspot_models::HotspotPoint;

/// Hotspots within `max_distance_m` of any leg of `waypoints`, in input
/// order.
///
/// A single-point route is treated as a point; an empty route matches
/// nothing.
#[must_use]
pub fn hotspots_along_route<'a>(
    waypoints: &[Coordinate],
    hotspots: &'a [HotspotPoint],
    max_distance_m: f64,
) -> Vec<&'a HotspotPoint> {
    let near = |h: &HotspotPoint| match waypoints {
        [] => false,
        [only] => planar_distance_meters(h.coordinate(), *only) <= max_distance_m,
        _ => waypoints
            .windows(2)
            .any(|leg| point_to_segment_meters(h.coordinate(), leg[0], leg[1]) <= max_distance_m),
    };

    let found: Vec<&HotspotPoint> = hotspots.iter().filter(|h| near(*h)).collect();
    log::debug!(
        "{} of {} hotspots within {max_distance_m} m of route",
        found.len(),
        hotspots.len()
    );
    found
}

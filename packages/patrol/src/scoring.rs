//! Stop selection and ordering heuristics.
//!
//! Ordering is a priority-biased nearest-neighbor walk, not an optimal
//! tour. Every score is `priority × 1000 + intensity × 100 + proximity`,
//! so priority dominates and distance only separates near-equals. Ties go
//! to whichever candidate comes first in `(priority desc, intensity desc)`
//! order.

use citysafe_geometry::{Coordinate, haversine_km};
use citysafe_hotspot_models::HotspotPoint;

const PRIORITY_WEIGHT: f64 = 1000.0;
const INTENSITY_WEIGHT: f64 = 100.0;
const PROXIMITY_BASE: f64 = 1000.0;

/// Proximity penalty per kilometer when choosing the first stop.
pub const SEED_DISTANCE_WEIGHT: f64 = 50.0;

/// Proximity penalty per kilometer once en route.
pub const EN_ROUTE_DISTANCE_WEIGHT: f64 = 100.0;

/// Scores `hotspot` as the next stop after `from`.
#[must_use]
pub fn stop_score(hotspot: &HotspotPoint, from: Coordinate, distance_weight: f64) -> f64 {
    let distance = haversine_km(from, hotspot.coordinate());
    let proximity = distance_weight.mul_add(-distance, PROXIMITY_BASE).max(0.0);

    f64::from(hotspot.priority).mul_add(
        PRIORITY_WEIGHT,
        hotspot.intensity.mul_add(INTENSITY_WEIGHT, proximity),
    )
}

/// Sorts by `(priority desc, intensity desc)` and keeps the first
/// `max_stops`. The sort is stable, so equal hotspots keep input order.
#[must_use]
pub fn select_candidates(mut local: Vec<&HotspotPoint>, max_stops: usize) -> Vec<&HotspotPoint> {
    local.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.intensity.total_cmp(&a.intensity))
    });
    local.truncate(max_stops);
    local
}

/// Orders `candidates` into a visit sequence starting from `start`.
#[must_use]
pub fn order_stops<'a>(start: Coordinate, mut candidates: Vec<&'a HotspotPoint>) -> Vec<&'a HotspotPoint> {
    let mut route = Vec::with_capacity(candidates.len());
    let mut current = start;
    let mut weight = SEED_DISTANCE_WEIGHT;

    while let Some(index) = best_index(&candidates, current, weight) {
        let next = candidates.remove(index);
        log::debug!(
            "Stop {}: {} (priority {}, intensity {:.2}, {:.2} km from previous)",
            route.len() + 1,
            next.area,
            next.priority,
            next.intensity,
            haversine_km(current, next.coordinate()),
        );
        current = next.coordinate();
        route.push(next);
        weight = EN_ROUTE_DISTANCE_WEIGHT;
    }

    route
}

/// Index of the highest-scoring candidate; the earliest wins ties.
fn best_index(candidates: &[&HotspotPoint], from: Coordinate, weight: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, hotspot) in candidates.iter().enumerate() {
        let score = stop_score(hotspot, from, weight);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use citysafe_hotspot_models::RiskLevel;

    use super::*;

    fn hotspot(area: &str, lat: f64, lng: f64, intensity: f64, level: RiskLevel) -> HotspotPoint {
        HotspotPoint::new(Coordinate { lat, lng }, intensity, level, area, 0)
    }

    const START: Coordinate = Coordinate {
        lat: 13.0827,
        lng: 80.2707,
    };

    #[test]
    fn candidates_sorted_by_priority_then_intensity() {
        let a = hotspot("a", 13.0, 80.0, 0.9, RiskLevel::Medium);
        let b = hotspot("b", 13.0, 80.0, 0.4, RiskLevel::High);
        let c = hotspot("c", 13.0, 80.0, 0.95, RiskLevel::Medium);
        let d = hotspot("d", 13.0, 80.0, 0.1, RiskLevel::Low);

        let picked = select_candidates(vec![&a, &b, &c, &d], 3);
        let names: Vec<&str> = picked.iter().map(|h| h.area.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn priority_beats_distance_for_seed() {
        let near_medium = hotspot("near", 13.083, 80.271, 0.9, RiskLevel::Medium);
        let far_high = hotspot("far", 13.0064, 80.2206, 0.9, RiskLevel::High);

        let order = order_stops(START, vec![&near_medium, &far_high]);
        assert_eq!(order[0].area, "far");
        assert_eq!(order[1].area, "near");
    }

    #[test]
    fn distance_breaks_equal_priority() {
        let far = hotspot("far", 13.0064, 80.2206, 0.85, RiskLevel::High);
        let near = hotspot("near", 13.0800, 80.2700, 0.85, RiskLevel::High);

        let order = order_stops(START, vec![&far, &near]);
        assert_eq!(order[0].area, "near");
    }

    #[test]
    fn exact_ties_keep_list_order() {
        let first = hotspot("first", 13.0, 80.0, 0.9, RiskLevel::High);
        let second = hotspot("second", 13.0, 80.0, 0.9, RiskLevel::High);

        let order = order_stops(START, vec![&first, &second]);
        assert_eq!(order[0].area, "first");
    }

    #[test]
    fn proximity_floors_at_zero() {
        let remote = hotspot("remote", 28.6, 77.2, 0.5, RiskLevel::Medium);
        let score = stop_score(&remote, START, SEED_DISTANCE_WEIGHT);
        assert!((score - 2050.0).abs() < 1e-9);
    }

    #[test]
    fn empty_candidates_yield_empty_order() {
        assert!(order_stops(START, Vec::new()).is_empty());
    }
}

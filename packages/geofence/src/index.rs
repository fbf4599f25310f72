//! R-tree containment index over qualifying hotspots.

use citysafe_geometry::{Coordinate, meters_per_degree, planar_distance_meters};
use citysafe_hotspot_models::HotspotPoint;
use rstar::{AABB, RTree, RTreeObject};

/// A hotspot fence stored in the R-tree. `order` is the hotspot's
/// position in the input so the first listed hotspot wins overlaps.
struct FenceEntry {
    order: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for FenceEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Circular fences around every hotspot above an intensity threshold.
///
/// Envelopes are `[lng, lat]` boxes sized with the same meters-per-degree
/// scale [`planar_distance_meters`] applies at the hotspot, so the box
/// query never misses a point the exact check would accept.
pub struct GeofenceIndex {
    hotspots: Vec<HotspotPoint>,
    tree: RTree<FenceEntry>,
    radius_m: f64,
}

impl std::fmt::Debug for GeofenceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeofenceIndex")
            .field("fences", &self.hotspots.len())
            .field("radius_m", &self.radius_m)
            .finish()
    }
}

impl GeofenceIndex {
    /// Builds fences of `radius_m` around hotspots with intensity strictly
    /// above `intensity_threshold`.
    #[must_use]
    pub fn new(hotspots: &[HotspotPoint], radius_m: f64, intensity_threshold: f64) -> Self {
        let hotspots: Vec<HotspotPoint> = hotspots
            .iter()
            .filter(|h| h.intensity > intensity_threshold && h.coordinate().is_valid())
            .cloned()
            .collect();

        let entries = hotspots
            .iter()
            .enumerate()
            .map(|(order, h)| FenceEntry {
                order,
                envelope: fence_envelope(h.coordinate(), radius_m),
            })
            .collect();

        log::debug!(
            "Built geofence index with {} fences of {radius_m} m",
            hotspots.len()
        );

        Self {
            hotspots,
            tree: RTree::bulk_load(entries),
            radius_m,
        }
    }

    /// Number of fences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    /// Whether there are no fences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    /// The first qualifying hotspot (in input order) whose fence contains
    /// `location`.
    #[must_use]
    pub fn containing(&self, location: Coordinate) -> Option<&HotspotPoint> {
        let query = AABB::from_point([location.lng, location.lat]);

        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter(|entry| {
                let hotspot = &self.hotspots[entry.order];
                planar_distance_meters(location, hotspot.coordinate()) <= self.radius_m
            })
            .map(|entry| entry.order)
            .min()
            .map(|order| &self.hotspots[order])
    }
}

fn fence_envelope(center: Coordinate, radius_m: f64) -> AABB<[f64; 2]> {
    let (per_lat, per_lng) = meters_per_degree(center.lat);
    let d_lat = radius_m / per_lat;
    let d_lng = radius_m / per_lng.max(f64::MIN_POSITIVE);

    AABB::from_corners(
        [center.lng - d_lng, center.lat - d_lat],
        [center.lng + d_lng, center.lat + d_lat],
    )
}

#[cfg(test)]
mod tests {
    use citysafe_hotspot_models::RiskLevel;

    use super::*;

    fn hotspot(area: &str, lat: f64, lng: f64, intensity: f64) -> HotspotPoint {
        HotspotPoint::new(
            Coordinate { lat, lng },
            intensity,
            RiskLevel::from_intensity(intensity),
            area,
            0,
        )
    }

    #[test]
    fn only_strictly_high_hotspots_are_fenced() {
        let index = GeofenceIndex::new(
            &[
                hotspot("a", 13.0, 80.0, 0.95),
                hotspot("b", 13.1, 80.0, 0.8),
                hotspot("c", 13.2, 80.0, 0.5),
            ],
            500.0,
            0.8,
        );
        assert_eq!(index.len(), 1);
        let at_b = Coordinate {
            lat: 13.1,
            lng: 80.0,
        };
        assert!(index.containing(at_b).is_none());
    }

    #[test]
    fn containment_uses_radius() {
        let index = GeofenceIndex::new(&[hotspot("a", 13.0, 80.0, 0.9)], 500.0, 0.8);

        // 0.004° lat is ~442 m; 0.005° is ~553 m.
        let inside = Coordinate {
            lat: 13.004,
            lng: 80.0,
        };
        let outside = Coordinate {
            lat: 13.005,
            lng: 80.0,
        };
        assert_eq!(index.containing(inside).map(|h| h.area.as_str()), Some("a"));
        assert!(index.containing(outside).is_none());
    }

    #[test]
    fn diagonal_corner_of_envelope_is_outside() {
        let index = GeofenceIndex::new(&[hotspot("a", 13.0, 80.0, 0.9)], 500.0, 0.8);
        // Inside the bounding box, ~600 m from the center.
        let corner = Coordinate {
            lat: 13.0038,
            lng: 80.0039,
        };
        assert!(index.containing(corner).is_none());
    }

    #[test]
    fn overlapping_fences_prefer_input_order() {
        let index = GeofenceIndex::new(
            &[
                hotspot("first", 13.0, 80.0, 0.85),
                hotspot("second", 13.001, 80.0, 0.95),
            ],
            500.0,
            0.8,
        );
        let between = Coordinate {
            lat: 13.0005,
            lng: 80.0,
        };
        assert_eq!(
            index.containing(between).map(|h| h.area.as_str()),
            Some("first")
        );
    }

    #[test]
    fn empty_index_contains_nothing() {
        let index = GeofenceIndex::new(&[], 500.0, 0.8);
        assert!(index.is_empty());
        assert!(
            index
                .containing(Coordinate {
                    lat: 13.0,
                    lng: 80.0
                })
                .is_none()
        );
    }
}

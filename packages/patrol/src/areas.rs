//! Compile-time registry of patrol service areas.
//!
//! Each service area (a city center plus patrol radius) is defined in a
//! TOML file under `areas/`. The optimizer uses the first area whose
//! circle contains the patrol's starting position to decide how far out
//! it may pick hotspots.

use citysafe_geometry::{Coordinate, haversine_km};
use serde::{Deserialize, Serialize};

/// A named circular service area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    /// Unique identifier (e.g., `"chennai"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Latitude of the area center.
    pub center_lat: f64,
    /// Longitude of the area center.
    pub center_lng: f64,
    /// Patrol radius around the center, in kilometers.
    pub radius_km: f64,
}

impl ServiceArea {
    /// The area's center point.
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        Coordinate {
            lat: self.center_lat,
            lng: self.center_lng,
        }
    }

    /// Returns `true` if `location` lies within the area's radius.
    #[must_use]
    pub fn contains(&self, location: Coordinate) -> bool {
        haversine_km(location, self.center()) <= self.radius_km
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const AREA_TOMLS: &[(&str, &str)] = &[
    ("chennai", include_str!("../areas/chennai.toml")),
    ("salem", include_str!("../areas/salem.toml")),
    ("madurai", include_str!("../areas/madurai.toml")),
    ("coimbatore", include_str!("../areas/coimbatore.toml")),
];

#[cfg(test)]
const EXPECTED_AREA_COUNT: usize = 4;

/// Returns all configured service areas, in lookup order.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_service_areas() -> Vec<ServiceArea> {
    AREA_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse service area '{name}': {e}"))
        })
        .collect()
}

/// Returns the first area in `areas` containing `location`.
#[must_use]
pub fn find_service_area(areas: &[ServiceArea], location: Coordinate) -> Option<&ServiceArea> {
    areas.iter().find(|area| area.contains(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_areas() {
        assert_eq!(all_service_areas().len(), EXPECTED_AREA_COUNT);
    }

    #[test]
    fn area_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for area in &all_service_areas() {
            assert!(seen.insert(area.id.clone()), "Duplicate area ID: {}", area.id);
        }
    }

    #[test]
    fn all_areas_are_well_formed() {
        for area in &all_service_areas() {
            assert!(!area.name.is_empty(), "Area {} has empty name", area.id);
            assert!(area.center().is_valid(), "Area {} has bad center", area.id);
            assert!(area.radius_km > 0.0, "Area {} has no radius", area.id);
        }
    }

    #[test]
    fn finds_containing_area() {
        let areas = all_service_areas();
        let chennai = Coordinate {
            lat: 13.0827,
            lng: 80.2707,
        };
        assert_eq!(
            find_service_area(&areas, chennai).map(|a| a.id.as_str()),
            Some("chennai")
        );

        let salem_outskirts = Coordinate {
            lat: 11.75,
            lng: 78.15,
        };
        assert_eq!(
            find_service_area(&areas, salem_outskirts).map(|a| a.id.as_str()),
            Some("salem")
        );

        let trichy = Coordinate {
            lat: 10.7905,
            lng: 78.7047,
        };
        assert!(find_service_area(&areas, trichy).is_none());
    }
}

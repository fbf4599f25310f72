//! Compile-time embedded sample hotspot sets.
//!
//! Each set lives in a TOML file under `data/`. These are demo data for
//! the CLI and tests; the classifier never falls back to them.

use citysafe_hotspot_models::{HotspotPoint, RawHotspot};
use serde::Deserialize;

/// A named set of raw hotspots loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleSet {
    /// City the set describes.
    pub city: String,
    /// Raw prediction points.
    pub hotspots: Vec<RawHotspot>,
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SAMPLE_TOMLS: &[(&str, &str)] = &[("chennai", include_str!("../data/chennai.toml"))];

/// Returns all embedded sample sets.
///
/// # Panics
///
/// Panics if any embedded TOML file is malformed.
#[must_use]
pub fn all_sample_sets() -> Vec<SampleSet> {
    SAMPLE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse sample set '{name}': {e}"))
        })
        .collect()
}

/// Returns the raw Chennai sample points.
#[must_use]
pub fn sample_raw_hotspots() -> Vec<RawHotspot> {
    all_sample_sets()
        .into_iter()
        .find(|s| s.city == "Chennai")
        .map(|s| s.hotspots)
        .unwrap_or_default()
}

/// Returns the Chennai sample points, classified.
#[must_use]
pub fn sample_hotspots() -> Vec<HotspotPoint> {
    crate::classify(&sample_raw_hotspots()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use citysafe_hotspot_models::RiskLevel;

    use super::*;
    use crate::count_level;

    #[test]
    fn loads_all_sample_sets() {
        let sets = all_sample_sets();
        assert_eq!(sets.len(), SAMPLE_TOMLS.len());
        for set in &sets {
            assert!(!set.city.is_empty());
            assert!(!set.hotspots.is_empty(), "{} has no hotspots", set.city);
        }
    }

    #[test]
    fn chennai_sample_classification() {
        let hotspots = sample_hotspots();
        assert_eq!(hotspots.len(), 8);
        assert_eq!(count_level(&hotspots, RiskLevel::High), 5);
        assert_eq!(count_level(&hotspots, RiskLevel::Medium), 2);
        assert_eq!(count_level(&hotspots, RiskLevel::Low), 1);
        assert!(hotspots.iter().all(|h| !h.area.starts_with("Location ")));
    }
}

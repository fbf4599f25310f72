#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot risk classification.
//!
//! Converts raw prediction points into [`HotspotPoint`]s with a risk
//! level, patrol priority and dwell time. The classifier never invents
//! data: an empty (or entirely unusable) input is an error, and callers
//! are expected to keep their previous snapshot, which [`cache`] does for
//! them.

pub mod cache;
pub mod sample;
pub mod source;

use citysafe_geometry::Coordinate;
use citysafe_hotspot_models::{HotspotPoint, RawHotspot, RiskLevel};

pub use cache::{HotspotCache, HotspotSnapshot};
pub use source::{HotspotSource, StaticHotspotSource};

/// Errors that can occur while obtaining or classifying hotspots.
#[derive(Debug, thiserror::Error)]
pub enum HotspotError {
    /// The source returned no usable hotspot points.
    #[error("No hotspot data available")]
    EmptyInput,

    /// The external source failed to produce data.
    #[error("Hotspot source error: {message}")]
    Source {
        /// Description of what went wrong.
        message: String,
    },
}

/// Classifies raw prediction points.
///
/// Points with non-finite values or out-of-range coordinates are skipped
/// with a warning. Intensities outside [0, 1] are clamped. A supplied
/// risk level is kept as-is; otherwise it is derived from intensity.
///
/// # Errors
///
/// Returns [`HotspotError::EmptyInput`] if `raw` is empty or none of its
/// points are usable.
pub fn classify(raw: &[RawHotspot]) -> Result<Vec<HotspotPoint>, HotspotError> {
    if raw.is_empty() {
        return Err(HotspotError::EmptyInput);
    }

    let mut hotspots = Vec::with_capacity(raw.len());

    for (index, point) in raw.iter().enumerate() {
        let coordinate = Coordinate {
            lat: point.lat,
            lng: point.lng,
        };
        if !coordinate.is_valid() {
            log::warn!(
                "Skipping hotspot #{}: invalid coordinate ({}, {})",
                index + 1,
                point.lat,
                point.lng
            );
            continue;
        }
        if !point.intensity.is_finite() {
            log::warn!("Skipping hotspot #{}: non-finite intensity", index + 1);
            continue;
        }

        let intensity = point.intensity.clamp(0.0, 1.0);
        if (intensity - point.intensity).abs() > f64::EPSILON {
            log::debug!(
                "Clamped hotspot #{} intensity {} -> {intensity}",
                index + 1,
                point.intensity
            );
        }

        let risk_level = point
            .risk_level
            .unwrap_or_else(|| RiskLevel::from_intensity(intensity));
        let area = point
            .area
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| format!("Location {}", index + 1));
        let crimes = point.crimes.unwrap_or_else(|| estimated_crimes(intensity));

        hotspots.push(HotspotPoint::new(
            coordinate, intensity, risk_level, area, crimes,
        ));
    }

    if hotspots.is_empty() {
        return Err(HotspotError::EmptyInput);
    }

    log::debug!(
        "Classified {} of {} raw hotspots ({} high, {} medium, {} low)",
        hotspots.len(),
        raw.len(),
        count_level(&hotspots, RiskLevel::High),
        count_level(&hotspots, RiskLevel::Medium),
        count_level(&hotspots, RiskLevel::Low),
    );

    Ok(hotspots)
}

/// Counts hotspots at a given risk level.
#[must_use]
pub fn count_level(hotspots: &[HotspotPoint], level: RiskLevel) -> usize {
    hotspots.iter().filter(|h| h.risk_level == level).count()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn estimated_crimes(intensity: f64) -> u32 {
    (intensity * 50.0).floor() as u32
}

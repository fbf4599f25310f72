//! File inputs and position resolution for the CLI.

use std::path::Path;

use async_trait::async_trait;
use citysafe_geometry::Coordinate;
use citysafe_hotspot::{HotspotCache, StaticHotspotSource, sample::sample_hotspots};
use citysafe_hotspot_models::{HotspotPoint, RawHotspot};
use citysafe_location::{
    FixedLocationProvider, LocationError, LocationFix, LocationProvider, locate_or_fallback,
};
use citysafe_patrol_models::PatrolShift;

/// Loads and classifies hotspots from a JSON array of raw points, or
/// returns the embedded Chennai sample set when no file is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or contains no
/// usable points.
pub async fn load_hotspots(
    path: Option<&Path>,
) -> Result<Vec<HotspotPoint>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        log::debug!("No hotspot file given, using embedded sample set");
        return Ok(sample_hotspots());
    };

    let text = std::fs::read_to_string(path)?;
    let raw: Vec<RawHotspot> = serde_json::from_str(&text)?;

    let cache = HotspotCache::new();
    let source = StaticHotspotSource::new(path.display().to_string(), raw);
    cache.refresh(&source).await?;

    Ok(cache.snapshot().as_ref().clone())
}

/// Resolves a starting position from an explicit reading or a fallback.
///
/// The CLI has no positioning hardware; `reading` stands in for a device
/// fix. Without either value this fails instead of guessing.
///
/// # Errors
///
/// Returns an error if neither coordinate is given or the chosen one is
/// out of range.
pub async fn resolve_position(
    reading: Option<Coordinate>,
    fallback: Option<Coordinate>,
) -> Result<Coordinate, Box<dyn std::error::Error>> {
    let provider: Box<dyn LocationProvider> = match reading {
        Some(coordinate) => Box::new(FixedLocationProvider::new(coordinate)?),
        None => Box::new(NoDeviceLocation),
    };
    Ok(locate_or_fallback(provider.as_ref(), fallback).await?)
}

/// Provider used when no position was supplied on the command line.
struct NoDeviceLocation;

#[async_trait]
impl LocationProvider for NoDeviceLocation {
    async fn current_location(&self) -> Result<LocationFix, LocationError> {
        Err(LocationError::Unavailable {
            message: "no device location available; pass a position or a fallback".to_string(),
        })
    }
}

/// Parses a `"lat,lng"` argument.
///
/// # Errors
///
/// Returns a message suitable for clap if the text is not a valid
/// coordinate.
pub fn parse_coordinate(text: &str) -> Result<Coordinate, String> {
    Coordinate::parse(text).map_err(|e| e.to_string())
}

/// Parses a shift name, case-insensitively.
///
/// # Errors
///
/// Returns a message listing the accepted names.
pub fn parse_shift(text: &str) -> Result<PatrolShift, String> {
    text.parse()
        .map_err(|_| format!("unknown shift '{text}' (morning, afternoon, evening, night)"))
}

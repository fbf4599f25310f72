//! Hotspot data source trait.
//!
//! The prediction service lives outside this workspace. Integrators
//! implement [`HotspotSource`] over it; [`StaticHotspotSource`] serves a
//! fixed list (sample data, files, tests).

use async_trait::async_trait;
use citysafe_hotspot_models::RawHotspot;

use crate::HotspotError;

/// An external provider of raw hotspot predictions.
#[async_trait]
pub trait HotspotSource: Send + Sync {
    /// Returns a short identifier for log messages.
    fn name(&self) -> &str;

    /// Fetches the current raw prediction points.
    ///
    /// An empty list is a valid answer; the cache treats it like a failure
    /// and keeps its previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Source`] if the fetch fails.
    async fn fetch(&self) -> Result<Vec<RawHotspot>, HotspotError>;
}

/// A source that always returns the same points.
#[derive(Debug, Clone)]
pub struct StaticHotspotSource {
    name: String,
    points: Vec<RawHotspot>,
}

impl StaticHotspotSource {
    /// Creates a source serving `points`.
    #[must_use]
    pub fn new(name: impl Into<String>, points: Vec<RawHotspot>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

#[async_trait]
impl HotspotSource for StaticHotspotSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawHotspot>, HotspotError> {
        Ok(self.points.clone())
    }
}

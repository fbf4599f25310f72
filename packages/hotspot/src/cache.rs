//! Hotspot snapshot cache.
//!
//! Holds the most recent successfully classified hotspot set and publishes
//! it through a [`tokio::sync::watch`] channel. Consumers (the geofence
//! monitor, route planners) read whatever snapshot is current; a failed or
//! empty refresh leaves the previous snapshot in place.

use std::sync::Arc;

use citysafe_hotspot_models::{HotspotPoint, RawHotspot};
use tokio::sync::watch;

use crate::{HotspotError, HotspotSource, classify};

/// An immutable, shareable hotspot set.
pub type HotspotSnapshot = Arc<Vec<HotspotPoint>>;

/// Latest-known hotspot set with change notification.
#[derive(Debug)]
pub struct HotspotCache {
    tx: watch::Sender<HotspotSnapshot>,
}

impl Default for HotspotCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HotspotCache {
    /// Creates a cache with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::with_snapshot(Vec::new())
    }

    /// Creates a cache seeded with already-classified hotspots.
    #[must_use]
    pub fn with_snapshot(hotspots: Vec<HotspotPoint>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(hotspots));
        Self { tx }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> HotspotSnapshot {
        self.tx.borrow().clone()
    }

    /// Returns a receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HotspotSnapshot> {
        self.tx.subscribe()
    }

    /// Classifies `raw` and publishes it as the new snapshot.
    ///
    /// Returns the number of hotspots in the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::EmptyInput`] if `raw` has no usable points;
    /// the previous snapshot is kept.
    pub fn replace(&self, raw: &[RawHotspot]) -> Result<usize, HotspotError> {
        let hotspots = classify(raw)?;
        let count = hotspots.len();
        self.tx.send_replace(Arc::new(hotspots));
        Ok(count)
    }

    /// Fetches from `source` and publishes the classified result.
    ///
    /// # Errors
    ///
    /// Returns the source or classification error; the previous snapshot
    /// is kept in either case.
    pub async fn refresh(&self, source: &dyn HotspotSource) -> Result<usize, HotspotError> {
        let raw = match source.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!(
                    "Hotspot refresh from {} failed, keeping {} cached hotspots: {e}",
                    source.name(),
                    self.tx.borrow().len()
                );
                return Err(e);
            }
        };

        match self.replace(&raw) {
            Ok(count) => {
                log::info!("Refreshed {count} hotspots from {}", source.name());
                Ok(count)
            }
            Err(e) => {
                log::warn!(
                    "Hotspot refresh from {} returned no usable data, keeping {} cached hotspots",
                    source.name(),
                    self.tx.borrow().len()
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::StaticHotspotSource;

    struct BrokenSource;

    #[async_trait]
    impl HotspotSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch(&self) -> Result<Vec<RawHotspot>, HotspotError> {
            Err(HotspotError::Source {
                message: "connection refused".to_string(),
            })
        }
    }

    fn raw(intensity: f64) -> RawHotspot {
        RawHotspot {
            lat: 13.04,
            lng: 80.23,
            intensity,
            risk_level: None,
            area: None,
            crimes: None,
        }
    }

    #[tokio::test]
    async fn refresh_publishes_new_snapshot() {
        let cache = HotspotCache::new();
        let mut rx = cache.subscribe();
        let source = StaticHotspotSource::new("static", vec![raw(0.9), raw(0.4)]);

        assert_eq!(cache.refresh(&source).await.unwrap(), 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);
        assert_eq!(cache.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let cache = HotspotCache::new();
        cache.replace(&[raw(0.9)]).unwrap();
        let before = cache.snapshot();

        assert!(cache.refresh(&BrokenSource).await.is_err());
        assert!(Arc::ptr_eq(&before, &cache.snapshot()));
    }

    #[tokio::test]
    async fn empty_refresh_keeps_previous_snapshot() {
        let cache = HotspotCache::new();
        cache.replace(&[raw(0.9)]).unwrap();

        let empty = StaticHotspotSource::new("empty", Vec::new());
        let result = cache.refresh(&empty).await;
        assert!(matches!(result, Err(HotspotError::EmptyInput)));
        assert_eq!(cache.snapshot().len(), 1);
    }
}

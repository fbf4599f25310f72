//! Offline replay of a recorded position track through the geofence.

use chrono::{DateTime, TimeDelta, Utc};
use citysafe_geofence::{Geofence, GeofenceConfig};
use citysafe_geofence_models::{GeofenceSession, SosEvent};
use citysafe_geometry::Coordinate;
use citysafe_hotspot_models::HotspotPoint;
use serde::{Deserialize, Serialize};

/// One recorded poll. A missing position is a failed read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFix {
    /// Seconds since the start of the track.
    pub at_secs: u32,
    /// Latitude, if the read succeeded.
    pub lat: Option<f64>,
    /// Longitude, if the read succeeded.
    pub lng: Option<f64>,
}

impl TrackFix {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate {
            lat: self.lat?,
            lng: self.lng?,
        })
    }
}

/// What a replay produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    /// Polls replayed.
    pub polls: usize,
    /// Polls without a position.
    pub failed_polls: usize,
    /// Every SOS emitted, in order.
    pub events: Vec<SosEvent>,
    /// The session after the last poll.
    pub session: GeofenceSession,
}

/// Replays `track` for `subject`, starting the clock at `origin`.
///
/// Fixes are applied in `at_secs` order.
#[must_use]
pub fn replay(
    subject: &str,
    track: &[TrackFix],
    hotspots: &[HotspotPoint],
    config: &GeofenceConfig,
    origin: DateTime<Utc>,
) -> ReplayReport {
    let geofence = Geofence::new(config.clone(), hotspots);
    let mut ordered: Vec<&TrackFix> = track.iter().collect();
    ordered.sort_by_key(|fix| fix.at_secs);

    let mut session = GeofenceSession::new(subject);
    let mut events = Vec::new();
    let mut failed_polls = 0;

    for fix in &ordered {
        let Some(location) = fix.coordinate() else {
            failed_polls += 1;
            log::warn!("Poll at {}s has no position, state unchanged", fix.at_secs);
            continue;
        };
        let now = origin + TimeDelta::seconds(i64::from(fix.at_secs));
        let tick = geofence.tick(session, location, now);
        session = tick.session;
        events.extend(tick.event);
    }

    ReplayReport {
        polls: ordered.len(),
        failed_polls,
        events,
        session,
    }
}

#[cfg(test)]
mod tests {
    use citysafe_hotspot_models::RiskLevel;

    use super::*;

    fn fix(at_secs: u32, position: Option<(f64, f64)>) -> TrackFix {
        TrackFix {
            at_secs,
            lat: position.map(|p| p.0),
            lng: position.map(|p| p.1),
        }
    }

    #[test]
    fn replay_matches_live_thresholds() {
        let hotspots = [HotspotPoint::new(
            Coordinate {
                lat: 13.0405,
                lng: 80.2337,
            },
            0.95,
            RiskLevel::High,
            "T. Nagar",
            67,
        )];
        let mut track: Vec<TrackFix> = (0..11)
            .map(|i| fix(i * 30, Some((13.0405, 80.2337))))
            .collect();
        track.insert(3, fix(95, None));

        let origin = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let report = replay("citizen-1", &track, &hotspots, &GeofenceConfig::default(), origin);

        assert_eq!(report.polls, 12);
        assert_eq!(report.failed_polls, 1);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].triggered_at, origin + TimeDelta::seconds(300));
        assert!(report.session.sos_triggered());
    }

    #[test]
    fn track_json_accepts_missing_positions() {
        let track: Vec<TrackFix> =
            serde_json::from_str(r#"[{"atSecs": 0, "lat": 13.0, "lng": 80.0}, {"atSecs": 30}]"#)
                .unwrap();
        assert!(track[0].coordinate().is_some());
        assert!(track[1].coordinate().is_none());
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geofence dwell monitoring with SOS escalation.
//!
//! The state machine is the pure [`Geofence::tick`]: given the previous
//! [`GeofenceSession`], the subject's position and the current time, it
//! returns the next session and at most one [`SosEvent`]. Scheduling lives
//! in [`monitor`], which polls a location provider on an interval and
//! wakes at the armed escalation deadline.
//!
//! ```text
//! Outside --enter--> Inside{entered_at, deadline} --now >= deadline--> Alerted
//!    ^                        |                                          |
//!    +---------exit-----------+------------------exit--------------------+
//! ```

pub mod index;
pub mod monitor;

use chrono::{DateTime, TimeDelta, Utc};
use citysafe_geofence_models::{GeofenceSession, GeofenceState, SosEvent};
use citysafe_geometry::Coordinate;
use citysafe_hotspot_models::HotspotPoint;
use serde::{Deserialize, Serialize};

pub use index::GeofenceIndex;
pub use monitor::{
    AlertError, AlertSink, MonitorError, MonitorHandle, MonitorStatus, Monitor, spawn_monitor,
};

/// Tunables for dwell monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    /// Fence radius around each qualifying hotspot, in meters.
    pub radius_m: f64,
    /// Hotspots with intensity strictly above this are fenced.
    pub intensity_threshold: f64,
    /// Continuous dwell that triggers an SOS, in seconds.
    pub dwell_threshold_secs: u64,
    /// Location poll interval for [`monitor`], in seconds.
    pub poll_interval_secs: u64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            radius_m: 500.0,
            intensity_threshold: 0.8,
            dwell_threshold_secs: 300,
            poll_interval_secs: 30,
        }
    }
}

impl GeofenceConfig {
    /// The dwell threshold as a chrono delta.
    #[must_use]
    pub fn dwell_threshold(&self) -> TimeDelta {
        i64::try_from(self.dwell_threshold_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// The poll interval. Never zero.
    #[must_use]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Result of one [`Geofence::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// The session after this tick.
    pub session: GeofenceSession,
    /// The escalation emitted by this tick, if any.
    pub event: Option<SosEvent>,
}

/// Dwell state machine over one hotspot snapshot.
#[derive(Debug)]
pub struct Geofence {
    config: GeofenceConfig,
    index: GeofenceIndex,
}

impl Geofence {
    /// Fences the qualifying hotspots in `hotspots`.
    #[must_use]
    pub fn new(config: GeofenceConfig, hotspots: &[HotspotPoint]) -> Self {
        let index = GeofenceIndex::new(hotspots, config.radius_m, config.intensity_threshold);
        Self { config, index }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeofenceConfig {
        &self.config
    }

    /// The containment index.
    #[must_use]
    pub const fn index(&self) -> &GeofenceIndex {
        &self.index
    }

    /// Advances `session` with a position read at `now`.
    ///
    /// An invalid `location` is treated like a failed poll: the session is
    /// returned unchanged.
    #[must_use]
    pub fn tick(&self, session: GeofenceSession, location: Coordinate, now: DateTime<Utc>) -> Tick {
        if !location.is_valid() {
            log::warn!(
                "Ignoring invalid position {location} for {}",
                session.subject
            );
            return Tick {
                session,
                event: None,
            };
        }

        let mut session = session;
        session.last_location = Some(location);

        let Some(hotspot) = self.index.containing(location) else {
            if session.inside_hotspot() {
                log::info!("{} left high-risk area, dwell timer cleared", session.subject);
            }
            session.state = GeofenceState::Outside;
            return Tick {
                session,
                event: None,
            };
        };

        let state = match session.state {
            GeofenceState::Outside => {
                let deadline = now
                    .checked_add_signed(self.config.dwell_threshold())
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                log::info!(
                    "{} entered high-risk area {} (intensity {:.2}), escalation at {deadline}",
                    session.subject,
                    hotspot.area,
                    hotspot.intensity,
                );
                GeofenceState::Inside {
                    entered_at: now,
                    deadline,
                }
            }
            other => other,
        };

        let (state, event) = match state {
            GeofenceState::Inside {
                entered_at,
                deadline,
            } if now >= deadline => {
                let event = SosEvent {
                    subject: session.subject.clone(),
                    location,
                    dwell_minutes: (now - entered_at).num_minutes(),
                    area: hotspot.area.clone(),
                    intensity: hotspot.intensity,
                    triggered_at: now,
                };
                log::info!("{event}");
                (
                    GeofenceState::Alerted {
                        entered_at,
                        alerted_at: now,
                    },
                    Some(event),
                )
            }
            other => (other, None),
        };

        session.state = state;
        Tick { session, event }
    }
}

/// One tick with a freshly built [`Geofence`].
///
/// Prefer [`Geofence::tick`] when polling repeatedly against the same
/// snapshot.
#[must_use]
pub fn tick(
    session: GeofenceSession,
    location: Coordinate,
    hotspots: &[HotspotPoint],
    now: DateTime<Utc>,
    config: &GeofenceConfig,
) -> Tick {
    Geofence::new(config.clone(), hotspots).tick(session, location, now)
}

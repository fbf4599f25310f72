#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geofence dwell-monitoring types.
//!
//! A [`GeofenceSession`] is owned by whoever drives the monitor and is
//! replaced wholesale on every tick. The armed escalation timer is the
//! `deadline` carried by [`GeofenceState::Inside`]; leaving the hotspot
//! drops the state and the deadline with it, so a stale timer cannot
//! fire after exit.

use chrono::{DateTime, TimeDelta, Utc};
use citysafe_geometry::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Dwell state of a monitored subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GeofenceState {
    /// Not inside any qualifying hotspot.
    #[default]
    Outside,
    /// Inside a qualifying hotspot, escalation armed.
    Inside {
        /// When the subject entered.
        entered_at: DateTime<Utc>,
        /// When the escalation fires if the subject is still inside.
        deadline: DateTime<Utc>,
    },
    /// Escalated. No further alert until the subject leaves.
    Alerted {
        /// When the subject entered.
        entered_at: DateTime<Utc>,
        /// When the SOS event was emitted.
        alerted_at: DateTime<Utc>,
    },
}

/// Field-free view of [`GeofenceState`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DwellPhase {
    /// See [`GeofenceState::Outside`].
    Outside,
    /// See [`GeofenceState::Inside`].
    Inside,
    /// See [`GeofenceState::Alerted`].
    Alerted,
}

impl GeofenceState {
    /// The state's phase.
    #[must_use]
    pub const fn phase(&self) -> DwellPhase {
        match self {
            Self::Outside => DwellPhase::Outside,
            Self::Inside { .. } => DwellPhase::Inside,
            Self::Alerted { .. } => DwellPhase::Alerted,
        }
    }

    /// When the current stay began.
    #[must_use]
    pub const fn entered_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Outside => None,
            Self::Inside { entered_at, .. } | Self::Alerted { entered_at, .. } => Some(*entered_at),
        }
    }
}

/// Per-subject monitoring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceSession {
    /// Identifier of the monitored subject.
    pub subject: String,
    /// Current dwell state.
    pub state: GeofenceState,
    /// Position from the most recent successful poll.
    pub last_location: Option<Coordinate>,
}

impl GeofenceSession {
    /// Starts a session for `subject` in [`GeofenceState::Outside`].
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            state: GeofenceState::Outside,
            last_location: None,
        }
    }

    /// Whether the subject is inside a qualifying hotspot.
    #[must_use]
    pub const fn inside_hotspot(&self) -> bool {
        !matches!(self.state, GeofenceState::Outside)
    }

    /// When the current stay began.
    #[must_use]
    pub const fn entry_timestamp(&self) -> Option<DateTime<Utc>> {
        self.state.entered_at()
    }

    /// Whether an SOS has been emitted for the current stay.
    #[must_use]
    pub const fn sos_triggered(&self) -> bool {
        matches!(self.state, GeofenceState::Alerted { .. })
    }

    /// When the armed escalation fires, if one is armed.
    #[must_use]
    pub const fn escalation_deadline(&self) -> Option<DateTime<Utc>> {
        match self.state {
            GeofenceState::Inside { deadline, .. } => Some(deadline),
            GeofenceState::Outside | GeofenceState::Alerted { .. } => None,
        }
    }

    /// How long the subject has been inside as of `now`.
    #[must_use]
    pub fn dwell(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.entry_timestamp().map(|entered| now - entered)
    }
}

/// Escalation emitted once per qualifying stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosEvent {
    /// Identifier of the monitored subject.
    pub subject: String,
    /// Position at the time of escalation.
    pub location: Coordinate,
    /// Whole minutes spent inside.
    pub dwell_minutes: i64,
    /// Area name of the containing hotspot.
    pub area: String,
    /// Intensity of the containing hotspot.
    pub intensity: f64,
    /// When the event was emitted.
    pub triggered_at: DateTime<Utc>,
}

impl std::fmt::Display for SosEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SOS: {} in high-risk area {} for {} min at {}",
            self.subject, self.area, self.dwell_minutes, self.location
        )
    }
}

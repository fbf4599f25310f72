#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Patrol route types.
//!
//! A [`PatrolRoute`] is produced by the optimizer in the
//! [`PatrolStatus::Scheduled`] state. Its lifecycle afterwards is driven
//! entirely by the caller through [`PatrolRoute::start`],
//! [`PatrolRoute::pause`] and [`PatrolRoute::complete`]; calls from an
//! invalid state are no-ops that return `false`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use citysafe_geometry::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// What a waypoint represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaypointType {
    /// The patrol's starting position at planning time.
    Station,
    /// A crime hotspot to visit.
    Hotspot,
    /// A visual-only intermediate point on a long leg.
    Checkpoint,
}

/// Progress of a single waypoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaypointStatus {
    /// Not yet reached.
    Pending,
    /// The patrol is currently heading to or at this waypoint.
    InProgress,
    /// Visited.
    Completed,
}

/// Lifecycle state of a patrol route.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatrolStatus {
    /// Planned, not started.
    Scheduled,
    /// Underway.
    Active,
    /// Temporarily halted; `start` resumes it.
    Paused,
    /// Finished. Terminal.
    Completed,
}

/// Time-of-day shift a route is planned for. Only used for naming.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum PatrolShift {
    /// Morning shift.
    #[default]
    Morning,
    /// Afternoon shift.
    Afternoon,
    /// Evening shift.
    Evening,
    /// Night shift.
    Night,
}

/// An ordered stop or intermediate point on a patrol route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Display name.
    pub name: String,
    /// What this waypoint represents.
    #[serde(rename = "type")]
    pub waypoint_type: WaypointType,
    /// Hotspot priority (0 for stations and checkpoints).
    pub priority: u8,
    /// Minutes to spend here (0 for stations and checkpoints).
    pub estimated_time: u32,
    /// Visit progress.
    pub status: WaypointStatus,
}

impl Waypoint {
    /// The waypoint's position.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// An ordered multi-stop patrol plan with its metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolRoute {
    /// Unique route identifier.
    pub id: String,
    /// Display name (e.g. "Morning Patrol Route").
    pub name: String,
    /// Station first, then hotspots with interleaved checkpoints.
    pub waypoints: Vec<Waypoint>,
    /// Sum of great-circle legs from the starting position through every
    /// hotspot, in kilometers.
    pub total_distance_km: f64,
    /// Dwell time at every hotspot plus travel time, in minutes.
    pub estimated_duration_min: f64,
    /// Lifecycle state.
    pub status: PatrolStatus,
    /// Officers or units assigned to this route.
    pub assigned_subjects: BTreeSet<String>,
    /// When the route was first started.
    pub start_time: Option<DateTime<Utc>>,
    /// When the route was completed.
    pub end_time: Option<DateTime<Utc>>,
    /// Mean of `priority × intensity` over the hotspots, × 100, rounded.
    pub efficiency_score: u32,
}

impl PatrolRoute {
    /// Moves a scheduled or paused route to [`PatrolStatus::Active`].
    ///
    /// The first start records `start_time`; resuming keeps it.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        match self.status {
            PatrolStatus::Scheduled | PatrolStatus::Paused => {
                self.status = PatrolStatus::Active;
                self.start_time.get_or_insert(now);
                true
            }
            PatrolStatus::Active | PatrolStatus::Completed => false,
        }
    }

    /// Moves an active route to [`PatrolStatus::Paused`].
    pub fn pause(&mut self) -> bool {
        if self.status == PatrolStatus::Active {
            self.status = PatrolStatus::Paused;
            true
        } else {
            false
        }
    }

    /// Moves an active route to [`PatrolStatus::Completed`] and records
    /// `end_time`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == PatrolStatus::Active {
            self.status = PatrolStatus::Completed;
            self.end_time = Some(now);
            true
        } else {
            false
        }
    }

    /// Advances waypoint progress on an active route.
    ///
    /// The waypoint currently in progress (if any) becomes completed and
    /// the next pending waypoint becomes in progress. Returns the new
    /// in-progress waypoint, or `None` if the route is not active or every
    /// waypoint is done.
    pub fn advance(&mut self) -> Option<&Waypoint> {
        if self.status != PatrolStatus::Active {
            return None;
        }

        if let Some(current) = self
            .waypoints
            .iter_mut()
            .find(|w| w.status == WaypointStatus::InProgress)
        {
            current.status = WaypointStatus::Completed;
        }

        let next = self
            .waypoints
            .iter_mut()
            .find(|w| w.status == WaypointStatus::Pending)?;
        next.status = WaypointStatus::InProgress;
        Some(&*next)
    }

    /// Fraction of non-station waypoints completed, in [0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        let stops = self
            .waypoints
            .iter()
            .filter(|w| w.waypoint_type != WaypointType::Station);
        let (total, done) = stops.fold((0usize, 0usize), |(total, done), w| {
            (
                total + 1,
                done + usize::from(w.status == WaypointStatus::Completed),
            )
        });

        if total == 0 {
            0.0
        } else {
            done as f64 / total as f64
        }
    }

    /// The hotspot waypoints, in visit order.
    pub fn hotspot_stops(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints
            .iter()
            .filter(|w| w.waypoint_type == WaypointType::Hotspot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(name: &str, waypoint_type: WaypointType, status: WaypointStatus) -> Waypoint {
        Waypoint {
            lat: 13.0,
            lng: 80.0,
            name: name.to_string(),
            waypoint_type,
            priority: 0,
            estimated_time: 0,
            status,
        }
    }

    fn route() -> PatrolRoute {
        PatrolRoute {
            id: "route_test".to_string(),
            name: "Morning Patrol Route".to_string(),
            waypoints: vec![
                waypoint(
                    "Current Location",
                    WaypointType::Station,
                    WaypointStatus::Completed,
                ),
                waypoint("Route Point 1.1", WaypointType::Checkpoint, WaypointStatus::Pending),
                waypoint("T. Nagar", WaypointType::Hotspot, WaypointStatus::Pending),
                waypoint("Mylapore", WaypointType::Hotspot, WaypointStatus::Pending),
            ],
            total_distance_km: 10.0,
            estimated_duration_min: 50.0,
            status: PatrolStatus::Scheduled,
            assigned_subjects: BTreeSet::new(),
            start_time: None,
            end_time: None,
            efficiency_score: 270,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn full_lifecycle() {
        let mut r = route();
        assert!(r.start(at(0)));
        assert_eq!(r.status, PatrolStatus::Active);
        assert!(r.pause());
        assert_eq!(r.status, PatrolStatus::Paused);
        assert!(r.start(at(60)));
        assert_eq!(r.start_time, Some(at(0)), "resume keeps first start time");
        assert!(r.complete(at(120)));
        assert_eq!(r.status, PatrolStatus::Completed);
        assert_eq!(r.end_time, Some(at(120)));
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let mut r = route();
        assert!(!r.pause());
        assert!(!r.complete(at(0)));
        assert_eq!(r.status, PatrolStatus::Scheduled);

        r.start(at(0));
        assert!(!r.start(at(1)));
        r.pause();
        assert!(!r.complete(at(2)), "paused routes must be resumed first");
        assert!(!r.pause());
        assert_eq!(r.status, PatrolStatus::Paused);

        r.start(at(3));
        r.complete(at(4));
        assert!(!r.start(at(5)));
        assert!(!r.pause());
        assert_eq!(r.status, PatrolStatus::Completed);
        assert_eq!(r.end_time, Some(at(4)));
    }

    #[test]
    fn advance_walks_waypoints_in_order() {
        let mut r = route();
        assert!(r.advance().is_none(), "scheduled routes do not advance");

        r.start(at(0));
        assert_eq!(r.advance().map(|w| w.name.clone()), Some("Route Point 1.1".into()));
        assert_eq!(r.advance().map(|w| w.name.clone()), Some("T. Nagar".into()));
        assert!((r.progress() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(r.advance().map(|w| w.name.clone()), Some("Mylapore".into()));
        assert!(r.advance().is_none());
        assert!((r.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_waypoint_type_field() {
        let json = serde_json::to_value(&route().waypoints[0]).unwrap();
        assert_eq!(json["type"], "station");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["estimatedTime"], 0);
    }

    #[test]
    fn shift_parsing() {
        assert_eq!("night".parse::<PatrolShift>(), Ok(PatrolShift::Night));
        assert_eq!(PatrolShift::Evening.to_string(), "Evening");
        assert_eq!(PatrolShift::default(), PatrolShift::Morning);
    }

    #[test]
    fn hotspot_stops_skip_station_and_checkpoints() {
        let route = route();
        let names: Vec<&str> = route.hotspot_stops().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["T. Nagar", "Mylapore"]);
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime hotspot types.
//!
//! A [`RawHotspot`] is what the external prediction source hands us. The
//! classifier turns each one into a [`HotspotPoint`] whose
//! [`RiskLevel`], patrol priority and dwell time are all derived from a
//! single rule table on [`RiskLevel`].

use citysafe_geometry::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Intensity at or above which a hotspot is classified [`RiskLevel::High`].
pub const HIGH_RISK_INTENSITY: f64 = 0.8;

/// Intensity at or above which a hotspot is classified [`RiskLevel::Medium`].
pub const MEDIUM_RISK_INTENSITY: f64 = 0.5;

/// Risk classification of a hotspot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RiskLevel {
    /// Intensity below 0.5.
    Low,
    /// Intensity in [0.5, 0.8).
    Medium,
    /// Intensity of 0.8 or more.
    High,
}

impl RiskLevel {
    /// Classifies a raw intensity in [0, 1].
    #[must_use]
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity >= HIGH_RISK_INTENSITY {
            Self::High
        } else if intensity >= MEDIUM_RISK_INTENSITY {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Patrol priority (1-3). Strictly increases with risk.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Minutes an officer is expected to spend at a hotspot of this level.
    #[must_use]
    pub const fn estimated_dwell_minutes(self) -> u32 {
        match self {
            Self::Low => 5,
            Self::Medium => 10,
            Self::High => 15,
        }
    }

    /// Returns all variants, lowest risk first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// Intensity assumed for a reported hotspot that carries none.
pub const DEFAULT_INTENSITY: f64 = 0.5;

const fn default_intensity() -> f64 {
    DEFAULT_INTENSITY
}

/// An unclassified hotspot as reported by the prediction source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHotspot {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Predicted crime intensity, nominally in [0, 1]. Missing values
    /// read as [`DEFAULT_INTENSITY`].
    #[serde(default = "default_intensity")]
    pub intensity: f64,
    /// Risk level, when the source already classified the point.
    #[serde(default, alias = "risk_level")]
    pub risk_level: Option<RiskLevel>,
    /// Display name of the area.
    #[serde(default)]
    pub area: Option<String>,
    /// Number of recorded crimes backing the prediction.
    #[serde(default)]
    pub crimes: Option<u32>,
}

/// A classified hotspot ready for routing and monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Crime intensity in [0, 1].
    pub intensity: f64,
    /// Risk classification.
    pub risk_level: RiskLevel,
    /// Patrol priority, derived from `risk_level`.
    pub priority: u8,
    /// Expected dwell time in minutes, derived from `risk_level`.
    pub estimated_dwell_minutes: u32,
    /// Display name of the area.
    pub area: String,
    /// Number of recorded crimes backing the prediction.
    pub crimes: u32,
}

impl HotspotPoint {
    /// Builds a hotspot whose priority and dwell time follow `risk_level`.
    #[must_use]
    pub fn new(
        coordinate: Coordinate,
        intensity: f64,
        risk_level: RiskLevel,
        area: impl Into<String>,
        crimes: u32,
    ) -> Self {
        Self {
            lat: coordinate.lat,
            lng: coordinate.lng,
            intensity,
            risk_level,
            priority: risk_level.priority(),
            estimated_dwell_minutes: risk_level.estimated_dwell_minutes(),
            area: area.into(),
            crimes,
        }
    }

    /// The hotspot's position.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// `priority × intensity`, the per-stop contribution to a route's
    /// efficiency score.
    #[must_use]
    pub fn weighted_intensity(&self) -> f64 {
        f64::from(self.priority) * self.intensity
    }
}

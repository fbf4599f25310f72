#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Engine configuration.
//!
//! One TOML document configures every component. All sections are
//! optional and default to the built-in tuning:
//!
//! ```toml
//! [patrol]
//! max_stops = 6
//! default_radius_km = 15.0
//!
//! [safe_route]
//! risk_radius_deg = 0.01
//!
//! [geofence]
//! radius_m = 500.0
//! dwell_threshold_secs = 300
//!
//! [[service_areas]]
//! id = "chennai"
//! name = "Chennai"
//! center_lat = 13.0827
//! center_lng = 80.2707
//! radius_km = 25.0
//! ```
//!
//! When `service_areas` is present it replaces the embedded table.

use std::path::{Path, PathBuf};

use citysafe_geofence::GeofenceConfig;
use citysafe_patrol::{
    MAX_CHECKPOINTS_PER_LEG, PatrolConfig, PatrolOptimizer,
    areas::{ServiceArea, all_service_areas},
};
use citysafe_safe_route::{SafeRouteConfig, SafeRoutePlanner};
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "CITYSAFE_CONFIG";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}", path = path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The document is not valid TOML or has wrong field types.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Patrol optimizer tuning.
    pub patrol: PatrolConfig,
    /// Safe-route planner tuning.
    pub safe_route: SafeRouteConfig,
    /// Geofence monitor tuning.
    pub geofence: GeofenceConfig,
    /// Replacement service-area table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_areas: Option<Vec<ServiceArea>>,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    /// Loads from `path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// See [`Self::load_from_path`].
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load_from_path)
    }

    /// Loads from the file named by `CITYSAFE_CONFIG`, or the defaults
    /// when it is unset.
    ///
    /// # Errors
    ///
    /// See [`Self::load_from_path`].
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        if path.is_none() {
            log::debug!("{CONFIG_ENV_VAR} not set, using default configuration");
        }
        Self::load_optional(path.as_deref())
    }

    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.patrol;
        positive("patrol.default_radius_km", p.default_radius_km)?;
        positive("patrol.average_speed_kmh", p.average_speed_kmh)?;
        positive("patrol.checkpoint_spacing_km", p.checkpoint_spacing_km)?;
        non_negative("patrol.checkpoint_min_leg_km", p.checkpoint_min_leg_km)?;
        if p.max_stops == 0 {
            return Err(invalid("patrol.max_stops must be at least 1"));
        }
        if p.max_checkpoints_per_leg > MAX_CHECKPOINTS_PER_LEG {
            return Err(invalid(format!(
                "patrol.max_checkpoints_per_leg must be at most {MAX_CHECKPOINTS_PER_LEG}, got {}",
                p.max_checkpoints_per_leg
            )));
        }

        let s = &self.safe_route;
        unit_interval("safe_route.risk_intensity_threshold", s.risk_intensity_threshold)?;
        non_negative("safe_route.risk_radius_deg", s.risk_radius_deg)?;
        positive("safe_route.detour_offset_deg", s.detour_offset_deg)?;
        positive("safe_route.score_epsilon", s.score_epsilon)?;
        non_negative(
            "safe_route.along_route_max_distance_m",
            s.along_route_max_distance_m,
        )?;

        let g = &self.geofence;
        positive("geofence.radius_m", g.radius_m)?;
        unit_interval("geofence.intensity_threshold", g.intensity_threshold)?;
        if g.poll_interval_secs == 0 {
            return Err(invalid("geofence.poll_interval_secs must be at least 1"));
        }

        if let Some(areas) = &self.service_areas {
            for area in areas {
                if !area.center().is_valid() {
                    return Err(invalid(format!(
                        "service area {} has an invalid center",
                        area.id
                    )));
                }
                positive(&format!("service area {} radius_km", area.id), area.radius_km)?;
            }
        }

        Ok(())
    }

    /// The configured service areas, or the embedded table.
    #[must_use]
    pub fn service_areas(&self) -> Vec<ServiceArea> {
        self.service_areas
            .clone()
            .unwrap_or_else(all_service_areas)
    }

    /// A patrol optimizer using this configuration.
    #[must_use]
    pub fn patrol_optimizer(&self) -> PatrolOptimizer {
        PatrolOptimizer::new(self.patrol.clone()).with_service_areas(self.service_areas())
    }

    /// A safe-route planner using this configuration.
    #[must_use]
    pub fn safe_route_planner(&self) -> SafeRoutePlanner {
        SafeRoutePlanner::new(self.safe_route.clone())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be positive, got {value}")))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must not be negative, got {value}")))
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be within [0, 1], got {value}")))
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location provider abstraction.
//!
//! The engine never reads a device position itself. Callers implement
//! [`LocationProvider`] over whatever positioning backend they have, and
//! route computations resolve their starting point through
//! [`locate_or_fallback`], which refuses to guess when the provider fails
//! and no explicit fallback was supplied.

use std::sync::Mutex;

use async_trait::async_trait;
use citysafe_geometry::{Coordinate, GeometryError};
use serde::{Deserialize, Serialize};

/// Errors from resolving a location.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// The provider could not produce a position.
    #[error("Location unavailable: {message}")]
    Unavailable {
        /// Provider-specific failure description.
        message: String,
    },

    /// The provider (or fallback) produced an out-of-range coordinate.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// A position reading with its reported accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    /// The reported position.
    pub coordinate: Coordinate,
    /// Horizontal accuracy radius in meters, if the backend reports one.
    pub accuracy_m: Option<f64>,
}

impl LocationFix {
    /// Creates a fix with unknown accuracy.
    #[must_use]
    pub const fn exact(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
        }
    }
}

/// Source of the tracked subject's current position.
///
/// Implementations must be `Send + Sync` so a provider can be shared with
/// the geofence monitor task.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Returns the current position.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] if no position can be read.
    async fn current_location(&self) -> Result<LocationFix, LocationError>;
}

/// A provider that always reports the same position.
///
/// Useful for manual "test location" input and for stationary subjects.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    fix: LocationFix,
}

impl FixedLocationProvider {
    /// Creates a provider pinned to `coordinate`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidCoordinate`] if `coordinate` is out
    /// of range.
    pub fn new(coordinate: Coordinate) -> Result<Self, GeometryError> {
        coordinate.validate()?;
        Ok(Self {
            fix: LocationFix::exact(coordinate),
        })
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> Result<LocationFix, LocationError> {
        Ok(self.fix)
    }
}

/// A provider that replays a scripted sequence of readings.
///
/// Each call consumes one entry; `None` entries simulate a failed read.
/// Once the script is exhausted the last reading repeats.
#[derive(Debug)]
pub struct ScriptedLocationProvider {
    script: Mutex<ScriptState>,
}

#[derive(Debug)]
struct ScriptState {
    readings: Vec<Option<Coordinate>>,
    next: usize,
}

impl ScriptedLocationProvider {
    /// Creates a provider that replays `readings` in order.
    #[must_use]
    pub const fn new(readings: Vec<Option<Coordinate>>) -> Self {
        Self {
            script: Mutex::new(ScriptState { readings, next: 0 }),
        }
    }
}

#[async_trait]
impl LocationProvider for ScriptedLocationProvider {
    async fn current_location(&self) -> Result<LocationFix, LocationError> {
        let reading = {
            let mut state = self.script.lock().map_err(|_| LocationError::Unavailable {
                message: "script state poisoned".to_string(),
            })?;
            let index = state.next.min(state.readings.len().saturating_sub(1));
            state.next = state.next.saturating_add(1);
            state.readings.get(index).copied().flatten()
        };

        match reading {
            Some(coordinate) => {
                coordinate.validate()?;
                Ok(LocationFix::exact(coordinate))
            }
            None => Err(LocationError::Unavailable {
                message: "scripted read failure".to_string(),
            }),
        }
    }
}

/// Resolves the current position, falling back to an explicit coordinate.
///
/// The fallback is validated before use. When the provider fails and no
/// fallback is given, the provider's error is returned unchanged.
///
/// # Errors
///
/// Returns [`LocationError::Unavailable`] if the provider fails without a
/// fallback, or [`LocationError::Geometry`] if the chosen coordinate is
/// invalid.
pub async fn locate_or_fallback(
    provider: &dyn LocationProvider,
    fallback: Option<Coordinate>,
) -> Result<Coordinate, LocationError> {
    match provider.current_location().await {
        Ok(fix) => {
            fix.coordinate.validate()?;
            Ok(fix.coordinate)
        }
        Err(e) => {
            let Some(fallback) = fallback else {
                return Err(e);
            };
            log::warn!("Location provider failed ({e}), using fallback {fallback}");
            fallback.validate()?;
            Ok(fallback)
        }
    }
}

//! Periodic driver for [`Geofence::tick`].
//!
//! A monitor is one tokio task per subject. Each wakeup reads the location
//! provider once and applies one tick against the newest hotspot snapshot.
//! The task wakes on the poll interval and, while a subject is inside a
//! fence, also at the escalation deadline so the alert is not delayed by
//! poll phase. Stopping the monitor (or dropping its handle) ends the task
//! and with it any armed deadline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use citysafe_geofence_models::{GeofenceSession, SosEvent};
use citysafe_hotspot::cache::HotspotSnapshot;
use citysafe_location::LocationProvider;
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{Geofence, GeofenceConfig};

/// Errors from alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The downstream channel rejected or failed to send the alert.
    #[error("Alert delivery failed: {message}")]
    Delivery {
        /// Channel-specific failure description.
        message: String,
    },
}

/// Errors from the monitor task itself.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The task panicked or was aborted.
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Destination for SOS events (SMS gateway, messaging bot, dispatch).
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Delivers one event. Not retried on failure.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Delivery`] if the event could not be sent.
    async fn deliver(&self, event: &SosEvent) -> Result<(), AlertError>;
}

/// Snapshot of a running monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorStatus {
    /// Location reads attempted.
    pub polls: u64,
    /// Location reads failed in a row. Zero after any success.
    pub consecutive_failures: u32,
    /// The session after the latest tick.
    pub session: GeofenceSession,
}

impl MonitorStatus {
    /// Whether at least `threshold` reads in a row have failed.
    #[must_use]
    pub const fn is_degraded(&self, threshold: u32) -> bool {
        threshold > 0 && self.consecutive_failures >= threshold
    }
}

/// Handle to a running monitor task.
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: oneshot::Sender<()>,
    status: watch::Receiver<MonitorStatus>,
    task: JoinHandle<GeofenceSession>,
}

impl MonitorHandle {
    /// The latest published status.
    #[must_use]
    pub fn status(&self) -> MonitorStatus {
        self.status.borrow().clone()
    }

    /// A receiver notified after every poll.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// Stops polling, cancels any armed deadline, and returns the final
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Join`] if the task panicked.
    pub async fn stop(self) -> Result<GeofenceSession, MonitorError> {
        // The task may already be gone; joining reports why.
        let _ = self.shutdown.send(());
        Ok(self.task.await?)
    }
}

/// Monitor configuration and collaborators, ready to spawn.
pub struct Monitor {
    config: GeofenceConfig,
    provider: Arc<dyn LocationProvider>,
    hotspots: watch::Receiver<HotspotSnapshot>,
    sink: Arc<dyn AlertSink>,
    origin: Option<DateTime<Utc>>,
}

impl Monitor {
    /// Bundles a monitor's collaborators.
    #[must_use]
    pub fn new(
        config: GeofenceConfig,
        provider: Arc<dyn LocationProvider>,
        hotspots: watch::Receiver<HotspotSnapshot>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            config,
            provider,
            hotspots,
            sink,
            origin: None,
        }
    }

    /// Pins the wall-clock time that corresponds to spawn. Defaults to
    /// [`Utc::now`].
    #[must_use]
    pub const fn with_origin(mut self, origin: DateTime<Utc>) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Starts polling for `session` on the current tokio runtime.
    #[must_use]
    pub fn spawn(self, session: GeofenceSession) -> MonitorHandle {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let (status_tx, status) = watch::channel(MonitorStatus {
            polls: 0,
            consecutive_failures: 0,
            session: session.clone(),
        });

        log::info!(
            "Monitoring {} every {}s (dwell threshold {}s, radius {} m)",
            session.subject,
            self.config.poll_interval().as_secs(),
            self.config.dwell_threshold_secs,
            self.config.radius_m,
        );

        let task = tokio::spawn(self.run(session, shutdown_rx, status_tx));

        MonitorHandle {
            shutdown,
            status,
            task,
        }
    }

    async fn run(
        mut self,
        mut session: GeofenceSession,
        mut shutdown: oneshot::Receiver<()>,
        status: watch::Sender<MonitorStatus>,
    ) -> GeofenceSession {
        let clock = Clock::new(self.origin.unwrap_or_else(Utc::now));
        let mut geofence = Geofence::new(self.config.clone(), &self.hotspots.borrow_and_update());
        let mut polls = 0_u64;
        let mut consecutive_failures = 0_u32;

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Each deadline wakes the task at most once; later checks ride on
        // the interval so a failing provider can't spin the loop.
        let mut woken_for = None;

        loop {
            let deadline = session
                .escalation_deadline()
                .filter(|d| woken_for != Some(*d));

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {}
                () = sleep_until(deadline.map(|d| clock.instant_at(d))) => {
                    woken_for = deadline;
                    log::debug!("Escalation deadline reached for {}", session.subject);
                }
            }

            if self.hotspots.has_changed().unwrap_or(false) {
                geofence = Geofence::new(self.config.clone(), &self.hotspots.borrow_and_update());
                log::debug!(
                    "Hotspot snapshot updated: {} fences",
                    geofence.index().len()
                );
            }

            polls += 1;
            match self.provider.current_location().await {
                Ok(fix) => {
                    consecutive_failures = 0;
                    let tick = geofence.tick(session, fix.coordinate, clock.now());
                    session = tick.session;
                    if let Some(event) = tick.event
                        && let Err(e) = self.sink.deliver(&event).await
                    {
                        log::error!("Failed to deliver SOS for {}: {e}", event.subject);
                    }
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    log::warn!(
                        "Location poll failed for {} ({consecutive_failures} in a row): {e}",
                        session.subject
                    );
                }
            }

            status.send_replace(MonitorStatus {
                polls,
                consecutive_failures,
                session: session.clone(),
            });
        }

        log::info!("Stopped monitoring {} after {polls} polls", session.subject);
        session
    }
}

/// Starts a monitor with the default clock origin.
#[must_use]
pub fn spawn_monitor(
    session: GeofenceSession,
    config: GeofenceConfig,
    provider: Arc<dyn LocationProvider>,
    hotspots: watch::Receiver<HotspotSnapshot>,
    sink: Arc<dyn AlertSink>,
) -> MonitorHandle {
    Monitor::new(config, provider, hotspots, sink).spawn(session)
}

/// Maps tokio time onto wall-clock time from a fixed origin so paused
/// runtimes advance both together.
struct Clock {
    origin: DateTime<Utc>,
    start: Instant,
}

impl Clock {
    fn new(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            start: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        chrono::TimeDelta::from_std(self.start.elapsed())
            .ok()
            .and_then(|elapsed| self.origin.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn instant_at(&self, at: DateTime<Utc>) -> Instant {
        (at - self.origin)
            .to_std()
            .map_or(self.start, |offset| self.start + offset)
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

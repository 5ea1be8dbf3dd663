//! The monitoring session: connection state, history, and periodic sampling.
//!
//! A [`MonitoringSession`] owns all mutable state of one meter. The five
//! commands ([`connect`](MonitoringSession::connect),
//! [`disconnect`](MonitoringSession::disconnect),
//! [`start_monitoring`](MonitoringSession::start_monitoring),
//! [`stop_monitoring`](MonitoringSession::stop_monitoring) and
//! [`clear_history`](MonitoringSession::clear_history)) are its entire
//! mutation surface.
//!
//! # Sampling
//!
//! While monitoring, a background task fires once per sampling interval,
//! starting one full interval after `start_monitoring`. Each tick generates a
//! reading, records it as the latest reading and history head, evaluates the
//! alert thresholds, and notifies subscribers.
//!
//! Commands and ticks are serialized by one lock held for the whole command.
//! Every sampler carries the generation number it was started with; stopping
//! bumps the generation under the lock, and a tick whose generation is no
//! longer current is discarded without touching state.
//!
//! # Notifications
//!
//! Every state change is published before the command returns, both as
//! [`SessionEvent`]s and as a fresh [`SessionSnapshot`]. The read accessors
//! on the session are served from that snapshot.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tds_core::{MonitoringSession, SessionStatus};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tds_core::Result<()> {
//! let session = MonitoringSession::builder()
//!     .sampling_interval(Duration::from_millis(500))
//!     .build()?;
//!
//! session.connect("COM3", 9600).await?;
//! assert_eq!(session.status(), SessionStatus::Idle);
//! assert_eq!(session.history_len(), 1);
//!
//! session.start_monitoring().await?;
//! assert!(session.is_monitoring());
//!
//! session.disconnect().await?;
//! assert!(session.last_reading().is_none());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tds_types::{DeviceState, Reading, SessionStatus};

use crate::alerts::AlertThresholds;
use crate::calibration::Calibration;
use crate::error::{Error, Result};
use crate::events::{EventDispatcher, EventReceiver, SessionEvent, SessionSnapshot, SnapshotReceiver};
use crate::history::{DEFAULT_RETENTION, HistoryStats, Period, ReadingHistory};
use crate::link::{MeterLink, SimulatedLink};
use crate::source::{RandomSource, ReadingGenerator, ReadingSource};

/// Default sampling interval.
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_millis(2000);

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Configuration for a monitoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Time between samples while monitoring.
    pub sampling_interval: Duration,
    /// Maximum number of readings kept in history.
    pub retention: usize,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Calibration applied to raw values.
    pub calibration: Calibration,
    /// Alert thresholds evaluated for every reading.
    pub alerts: AlertThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            retention: DEFAULT_RETENTION,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            calibration: Calibration::default(),
            alerts: AlertThresholds::default(),
        }
    }
}

impl SessionConfig {
    /// Validate the configuration.
    ///
    /// Checks that:
    /// - `sampling_interval` is > 0
    /// - `retention` and `event_capacity` are > 0
    /// - calibration and alert thresholds are consistent
    pub fn validate(&self) -> Result<()> {
        if self.sampling_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "sampling_interval must be > 0".to_string(),
            ));
        }
        if self.retention == 0 {
            return Err(Error::InvalidConfig("retention must be > 0".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfig(
                "event_capacity must be > 0".to_string(),
            ));
        }
        let problems: Vec<String> = self
            .calibration
            .problems()
            .into_iter()
            .chain(self.alerts.problems())
            .collect();
        if !problems.is_empty() {
            return Err(Error::InvalidConfig(problems.join("; ")));
        }
        Ok(())
    }
}

/// Builder for [`MonitoringSession`].
///
/// ```ignore
/// let session = MonitoringSession::builder()
///     .sampling_interval(Duration::from_secs(1))
///     .retention(500)
///     .source(RandomSource::seeded(42))
///     .build()?;
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    source: Option<Box<dyn ReadingSource>>,
    link: Option<Arc<dyn MeterLink>>,
}

impl SessionBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the sampling interval.
    #[must_use]
    pub fn sampling_interval(mut self, interval: Duration) -> Self {
        self.config.sampling_interval = interval;
        self
    }

    /// Set the history retention.
    #[must_use]
    pub fn retention(mut self, retention: usize) -> Self {
        self.config.retention = retention;
        self
    }

    /// Set the calibration.
    #[must_use]
    pub fn calibration(mut self, calibration: Calibration) -> Self {
        self.config.calibration = calibration;
        self
    }

    /// Set the alert thresholds.
    #[must_use]
    pub fn alerts(mut self, alerts: AlertThresholds) -> Self {
        self.config.alerts = alerts;
        self
    }

    /// Use `source` for raw samples instead of the default random source.
    #[must_use]
    pub fn source<S: ReadingSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Use `link` for the connection handshake instead of the simulated link.
    #[must_use]
    pub fn link(mut self, link: Arc<dyn MeterLink>) -> Self {
        self.link = Some(link);
        self
    }

    /// Validate the configuration and build the session.
    pub fn build(self) -> Result<MonitoringSession> {
        self.config.validate()?;
        let source = self
            .source
            .unwrap_or_else(|| Box::new(RandomSource::new()));
        let link = self
            .link
            .unwrap_or_else(|| Arc::new(SimulatedLink::new()));
        Ok(MonitoringSession::from_parts(self.config, source, link))
    }
}

/// Handle to a running sampler task. Dropping it cancels the task.
struct SamplerHandle {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if self.task.is_finished() {
            debug!("Sampler generation {} already finished", self.generation);
        }
    }
}

struct SessionState {
    device: DeviceState,
    history: ReadingHistory,
    generator: ReadingGenerator,
    sampler: Option<SamplerHandle>,
    generation: u64,
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        if !self.device.is_connected {
            SessionStatus::Disconnected
        } else if self.sampler.is_some() {
            SessionStatus::Monitoring
        } else {
            SessionStatus::Idle
        }
    }

    /// Whether a tick from `generation` may still mutate state.
    fn is_current(&self, generation: u64) -> bool {
        self.device.is_connected
            && self
                .sampler
                .as_ref()
                .is_some_and(|s| s.generation == generation)
    }

    /// Cancel the sampler, if any. Returns whether one was running.
    fn stop_sampler(&mut self) -> bool {
        match self.sampler.take() {
            Some(handle) => {
                self.generation += 1;
                drop(handle);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            device: self.device.clone(),
            status: self.status(),
            readings: self.history.to_vec(),
        }
    }
}

struct Inner {
    state: Mutex<SessionState>,
    events: EventDispatcher,
    link: Arc<dyn MeterLink>,
    config: SessionConfig,
}

impl Inner {
    /// Store a reading and notify. Caller holds the state lock.
    fn record(&self, state: &mut SessionState, reading: Reading) {
        state.device.last_reading = Some(reading.clone());
        state.history.push(reading.clone());

        let alerts = self.config.alerts.evaluate(&reading);
        self.events.send(SessionEvent::Reading { reading });
        for alert in alerts {
            info!("Alert: {}", alert);
            self.events.send(SessionEvent::Alert { alert });
        }
    }

    fn publish(&self, state: &SessionState) {
        self.events.publish(state.snapshot());
    }

    /// Handle one sampler tick. Returns `false` once the sampler is stale.
    async fn on_tick(&self, generation: u64) -> bool {
        let mut state = self.state.lock().await;
        if !state.is_current(generation) {
            debug!(
                "Discarding tick from stale sampler generation {} (current {})",
                generation, state.generation
            );
            return false;
        }

        let reading = state.generator.generate(OffsetDateTime::now_utc());
        debug!(
            "Tick: {:.1} ppm, {:.1}°C ({})",
            reading.value(),
            reading.temperature(),
            reading.quality()
        );
        self.record(&mut state, reading);
        self.publish(&state);
        true
    }
}

async fn run_sampler(
    inner: Weak<Inner>,
    generation: u64,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Sampler generation {} cancelled", generation);
                break;
            }
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    debug!("Session dropped, stopping sampler generation {}", generation);
                    break;
                };
                if !inner.on_tick(generation).await {
                    break;
                }
            }
        }
    }
}

/// A monitoring session for one meter.
///
/// Cloning the session yields another handle to the same state. The sampler
/// stops when the last handle is dropped.
#[derive(Clone)]
pub struct MonitoringSession {
    inner: Arc<Inner>,
}

impl fmt::Debug for MonitoringSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoringSession")
            .field("status", &self.status())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Default for MonitoringSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitoringSession {
    /// Create a session with the default configuration, a random source and
    /// the simulated link.
    pub fn new() -> Self {
        Self::from_parts(
            SessionConfig::default(),
            Box::new(RandomSource::new()),
            Arc::new(SimulatedLink::new()),
        )
    }

    /// Create a builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Create a session with the given configuration.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    fn from_parts(
        config: SessionConfig,
        source: Box<dyn ReadingSource>,
        link: Arc<dyn MeterLink>,
    ) -> Self {
        let state = SessionState {
            device: DeviceState::default(),
            history: ReadingHistory::new(config.retention),
            generator: ReadingGenerator::with_calibration(source, config.calibration),
            sampler: None,
            generation: 0,
        };
        let inner = Inner {
            state: Mutex::new(state),
            events: EventDispatcher::new(config.event_capacity),
            link,
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Connect to the meter on `port` at `baud_rate`.
    ///
    /// On success the session records one immediate reading. Connecting while
    /// connected switches to the new port and keeps monitoring if active.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] for an empty port or a zero baud rate
    /// - [`Error::DeviceUnavailable`] if the link handshake fails
    ///
    /// On error the session is unchanged.
    pub async fn connect(&self, port: &str, baud_rate: u32) -> Result<()> {
        let port = port.trim();
        if port.is_empty() {
            return Err(Error::InvalidConfig("port must not be empty".to_string()));
        }
        if baud_rate == 0 {
            return Err(Error::InvalidConfig("baud rate must be > 0".to_string()));
        }

        let inner = &self.inner;
        let mut state = inner.state.lock().await;

        if let Err(e) = inner.link.open(port, baud_rate).await {
            warn!("Failed to connect on {}: {}", port, e);
            return Err(e);
        }

        state.device.is_connected = true;
        state.device.port = Some(port.to_string());
        state.device.baud_rate = baud_rate;
        info!("Connected on {} at {} baud", port, baud_rate);
        inner.events.send(SessionEvent::Connected {
            port: port.to_string(),
            baud_rate,
        });

        let reading = state.generator.generate(OffsetDateTime::now_utc());
        inner.record(&mut state, reading);
        inner.publish(&state);
        Ok(())
    }

    /// Disconnect from the meter, stopping monitoring if active.
    ///
    /// History is preserved. Disconnecting while disconnected is a no-op.
    ///
    /// The session is always left disconnected, even when the link fails to
    /// close.
    ///
    /// # Errors
    ///
    /// Returns the link's close error after the session has been torn down.
    pub async fn disconnect(&self) -> Result<()> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        if !state.device.is_connected {
            return Ok(());
        }

        let closed = inner.link.close().await;

        if state.stop_sampler() {
            inner.events.send(SessionEvent::MonitoringStopped);
        }
        let port = state.device.port.take();
        state.device.is_connected = false;
        state.device.last_reading = None;

        info!("Disconnected from {}", port.as_deref().unwrap_or("meter"));
        inner.events.send(SessionEvent::Disconnected { port });
        inner.publish(&state);

        if let Err(e) = closed {
            warn!("Meter link did not close cleanly: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Start periodic sampling.
    ///
    /// The first sample is taken one full interval after this call. Starting
    /// while already monitoring is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] when disconnected.
    pub async fn start_monitoring(&self) -> Result<()> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        match state.status() {
            SessionStatus::Disconnected => {
                return Err(Error::invalid_state(
                    "start monitoring",
                    SessionStatus::Disconnected,
                ));
            }
            SessionStatus::Monitoring => return Ok(()),
            SessionStatus::Idle => {}
        }

        state.generation += 1;
        let generation = state.generation;
        let period = inner.config.sampling_interval;
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_sampler(
            Arc::downgrade(inner),
            generation,
            period,
            cancel.clone(),
        ));
        state.sampler = Some(SamplerHandle {
            generation,
            cancel,
            task,
        });

        let interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        info!("Monitoring started (every {} ms)", interval_ms);
        inner.events.send(SessionEvent::MonitoringStarted { interval_ms });
        inner.publish(&state);
        Ok(())
    }

    /// Stop periodic sampling. Stopping while not monitoring is a no-op.
    pub async fn stop_monitoring(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        if state.stop_sampler() {
            info!("Monitoring stopped");
            inner.events.send(SessionEvent::MonitoringStopped);
            inner.publish(&state);
        }
    }

    /// Remove every reading from history.
    ///
    /// The latest reading and connection state are kept.
    pub async fn clear_history(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        let removed = state.history.clear();
        info!("Cleared {} readings from history", removed);
        inner.events.send(SessionEvent::HistoryCleared { removed });
        inner.publish(&state);
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    /// Subscribe to state snapshots.
    pub fn subscribe_state(&self) -> SnapshotReceiver {
        self.inner.events.subscribe_snapshots()
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.events.latest().clone()
    }

    /// Connection state, including the latest reading.
    pub fn device_state(&self) -> DeviceState {
        self.inner.events.latest().device.clone()
    }

    /// Lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.inner.events.latest().status
    }

    /// Whether periodic sampling is active.
    pub fn is_monitoring(&self) -> bool {
        self.status() == SessionStatus::Monitoring
    }

    /// Latest reading, `None` when disconnected.
    pub fn last_reading(&self) -> Option<Reading> {
        self.inner.events.latest().device.last_reading.clone()
    }

    /// History, most-recent-first.
    pub fn readings(&self) -> Vec<Reading> {
        self.inner.events.latest().readings.clone()
    }

    /// Readings within `period` of now, most-recent-first.
    pub fn readings_within(&self, period: Period) -> Vec<Reading> {
        let snapshot = self.inner.events.latest();
        period
            .select(&snapshot.readings, OffsetDateTime::now_utc())
            .cloned()
            .collect()
    }

    /// Number of readings in history.
    pub fn history_len(&self) -> usize {
        self.inner.events.latest().readings.len()
    }

    /// Statistics over the readings within `period`, `None` if there are none.
    pub fn stats(&self, period: Period) -> Option<HistoryStats> {
        let snapshot = self.inner.events.latest();
        HistoryStats::from_readings(period.select(&snapshot.readings, OffsetDateTime::now_utc()))
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

//! Tick scheduler
//!
//! The Scheduler is responsible for:
//! - Firing the [`Reconciler`] on a fixed interval, starting immediately
//! - Keeping at most one reconciliation in flight
//! - Stopping cleanly when shutdown is requested
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   tick    ┌──────────────┐   result   ┌─────────────┐
//! │  interval   │──────────▶│  Scheduler   │───────────▶│   Events    │
//! └─────────────┘           │ (single-     │            │  (notify)   │
//!                           │  flight)     │            └─────────────┘
//! ┌─────────────┐  stop     └──────────────┘
//! │  shutdown   │──────────▶       │
//! └─────────────┘                  ▼
//!                           ┌──────────────┐
//!                           │  Reconciler  │
//!                           └──────────────┘
//! ```
//!
//! ## Shutdown
//!
//! A tick that has started runs to completion; its outbound calls are
//! bounded by the per-call request timeout. Once shutdown is observed no
//! new tick starts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::reconciler::{ReconciliationResult, Reconciler};

/// Events emitted by the Scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Scheduler started
    Started {
        interval: Duration,
    },

    /// A tick ran to completion
    TickCompleted {
        tick: u64,
        started_at: DateTime<Utc>,
        result: ReconciliationResult,
    },

    /// A tick was not started because another one was still running
    TickSkipped {
        tick: u64,
    },

    /// Scheduler stopped
    Stopped {
        reason: String,
    },
}

/// Fixed-interval driver for a [`Reconciler`]
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`]
/// 2. Run with [`Scheduler::run_with_shutdown()`]
/// 3. Send on (or drop) the shutdown sender to stop
///
/// ## Load Resistance
///
/// - **Single-flight**: overlapping ticks are skipped, never run concurrently
/// - **Missed intervals**: skipped rather than bursted after a slow tick
/// - **Bounded event channel**: when full, events are dropped (logged)
pub struct Scheduler {
    reconciler: Reconciler,

    interval: Duration,

    /// Held for the duration of a tick
    in_flight: Mutex<()>,

    /// Number of ticks fired so far, including skipped ones
    ticks: AtomicU64,

    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields scheduler events
    pub fn new(
        reconciler: Reconciler,
        config: &SchedulerConfig,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        config.validate()?;
        Self::with_interval(reconciler, config.interval(), config.event_channel_capacity)
    }

    /// Create a scheduler with an explicit interval
    ///
    /// Unlike [`Scheduler::new`], this accepts sub-second intervals.
    pub fn with_interval(
        reconciler: Reconciler,
        interval: Duration,
        event_channel_capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        if interval.is_zero() {
            return Err(Error::config("Tick interval must be > 0"));
        }
        if event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }

        let (tx, rx) = mpsc::channel(event_channel_capacity);

        let scheduler = Self {
            reconciler,
            interval,
            in_flight: Mutex::new(()),
            ticks: AtomicU64::new(0),
            event_tx: tx,
        };

        Ok((scheduler, rx))
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown_rx` fires or its sender is dropped
    ///
    /// The first tick fires immediately.
    pub async fn run_with_shutdown(&self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        info!(
            "Scheduler started for {} (interval {:?})",
            self.reconciler.hostname(),
            self.interval
        );
        self.emit_event(SchedulerEvent::Started {
            interval: self.interval,
        });

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received");
                    self.emit_event(SchedulerEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }

                _ = ticker.tick() => {
                    // The tick completes even if shutdown arrives meanwhile
                    let _ = self.try_tick().await;
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// Run one tick unless another is already in flight
    ///
    /// # Returns
    ///
    /// - `Some(result)`: the tick ran
    /// - `None`: a tick was already running; this one was skipped
    pub async fn try_tick(&self) -> Option<ReconciliationResult> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;

        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Tick {} skipped: previous tick still running", tick);
            self.emit_event(SchedulerEvent::TickSkipped { tick });
            return None;
        };

        let started_at = Utc::now();
        debug!("Tick {} started", tick);

        let result = self.reconciler.reconcile().await;
        debug!("Tick {} finished: {}", tick, result);

        self.emit_event(SchedulerEvent::TickCompleted {
            tick,
            started_at,
            result: result.clone(),
        });

        Some(result)
    }

    /// Emit a scheduler event
    fn emit_event(&self, event: SchedulerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

// Watch engine implementation
// Cycles never overlap: a fetch only starts from Waiting (or Idle on startup)

use crate::batch::fetch_batch;
use crate::diff::{diff, Snapshot};
use crate::models::{CycleReport, CycleState, EndpointSpec, JitterConfig};
use crate::notifier::Notifier;
use crate::renderer::PageRenderer;
use crate::telemetry;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// Cloneable handle that halts a running engine
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Request a stop. The engine finishes the cycle in progress, if any,
    /// and returns from `run` instead of waiting again.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Main watch engine. Owns the snapshot and, through the notifier, the
/// throttle state; nothing else mutates either.
pub struct WatchEngine {
    endpoints: Vec<EndpointSpec>,
    jitter: JitterConfig,
    renderer: Arc<dyn PageRenderer>,
    notifier: Option<Notifier>,
    max_concurrency: usize,
    snapshot: Snapshot,
    state: CycleState,
    rng: StdRng,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl WatchEngine {
    /// Create a new engine. Notifications stay disabled until a notifier
    /// is attached.
    pub fn new(
        endpoints: Vec<EndpointSpec>,
        jitter: JitterConfig,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);

        Self {
            endpoints,
            jitter,
            renderer,
            notifier: None,
            max_concurrency: 0,
            snapshot: Snapshot::new(),
            state: CycleState::Idle,
            rng: StdRng::from_entropy(),
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn notifier(&self) -> Option<&Notifier> {
        self.notifier.as_ref()
    }

    fn is_stopped(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Fetch every endpoint once and store the results as the baseline.
    /// Returns how many endpoints were cached.
    #[instrument(skip(self))]
    pub async fn prime(&mut self) -> usize {
        self.state = CycleState::Fetching;
        let outcome = fetch_batch(self.renderer.clone(), &self.endpoints, self.max_concurrency).await;

        let cached = self.snapshot.seed(&outcome.results);
        info!(
            cached = cached,
            total = self.endpoints.len(),
            "{} of {} responses cached",
            cached,
            self.endpoints.len()
        );
        telemetry::update_endpoints_cached(self.snapshot.len());

        self.state = CycleState::Waiting;
        cached
    }

    /// Run one fetch → diff → notify pass and return to `Waiting`
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();

        self.state = CycleState::Fetching;
        let outcome = fetch_batch(self.renderer.clone(), &self.endpoints, self.max_concurrency).await;

        self.state = CycleState::Diffing;
        let changes = diff(&mut self.snapshot, &outcome.results);
        telemetry::update_endpoints_cached(self.snapshot.len());

        self.state = CycleState::Notifying;
        let mut report = CycleReport {
            fetched: outcome.results.len(),
            failed: outcome.failed,
            ..Default::default()
        };

        if let Some(notifier) = self.notifier.as_mut() {
            for change in &changes {
                if notifier.maybe_notify(change) {
                    report.dispatched.push(change.identifier.clone());
                } else {
                    report.suppressed.push(change.identifier.clone());
                }
            }
        }
        report.changes = changes;

        telemetry::record_cycle(report.changes.len(), started.elapsed().as_secs_f64());
        self.state = CycleState::Waiting;
        report
    }

    /// Wait for in-flight notification deliveries
    pub async fn flush_notifications(&mut self) {
        if let Some(notifier) = self.notifier.as_mut() {
            notifier.flush().await;
        }
    }

    /// Draw the delay before the next cycle
    pub fn next_delay(&mut self) -> Duration {
        self.jitter.next_delay(&mut self.rng)
    }

    /// Prime, then cycle until stopped. Outstanding notifications are
    /// awaited before returning.
    pub async fn run(&mut self) {
        info!(
            endpoints = self.endpoints.len(),
            base_interval_seconds = self.jitter.base_interval_seconds,
            jitter_percent = self.jitter.jitter_percent,
            notifications = self.notifier.is_some(),
            "Starting watch engine"
        );

        if !self.is_stopped() {
            self.prime().await;

            loop {
                let delay = self.next_delay();
                debug!(delay_seconds = delay.as_secs(), "Waiting for next cycle");

                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = self.stop_rx.wait_for(|stopped| *stopped) => {
                        info!("Stop signal received, stopping watch engine");
                        break;
                    }
                }

                if self.is_stopped() {
                    break;
                }
                self.run_cycle().await;
            }
        }

        self.flush_notifications().await;
        self.state = CycleState::Idle;
        info!("Watch engine stopped");
    }
}

//! Background Refresher
//!
//! Periodically re-probes every tracked node and moves it between reachable
//! and unreachable. Probes within a tick run one after another, so a tick
//! takes roughly `nodes x probe latency`.
//!
//! The loop stops when its [`RefresherHandle`] is shut down or dropped; a
//! tick in progress is abandoned at its next await point.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::prober::HealthProber;
use super::registry::Registry;

/// Status changes made by one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub activated: usize,
    pub deactivated: usize,
}

pub struct Refresher {
    prober: Arc<HealthProber>,
    registry: Arc<Registry>,
}

impl Refresher {
    pub fn new(prober: Arc<HealthProber>, registry: Arc<Registry>) -> Arc<Self> {
        Arc::new(Self { prober, registry })
    }

    /// Runs a single refresh pass.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        for node in self.registry.list_unreachable() {
            if self.prober.is_alive(&node).await {
                report.activated += self.registry.activate([&node.id]);
            }
        }

        for node in self.registry.list_reachable() {
            if !self.prober.is_alive(&node).await {
                tracing::warn!("Node {} at {} failed its health probe", node.id, node.url());
                report.deactivated += self.registry.deactivate([&node.id]);
            }
        }

        report
    }

    /// Spawns the refresh loop. The first tick runs one `period` from now.
    pub fn spawn(self: Arc<Self>, period: Duration) -> RefresherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(period, shutdown_rx).await;
        });

        RefresherHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(&self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        // tokio panics on a zero period
        let period = period.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Refresher started (interval {:?})", period);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                report = self.tick() => {
                    if report != TickReport::default() {
                        tracing::info!(
                            "Refresh: {} activated, {} deactivated, {} reachable / {} unreachable",
                            report.activated,
                            report.deactivated,
                            self.registry.list_reachable().len(),
                            self.registry.list_unreachable().len()
                        );
                    }
                }
            }
        }

        tracing::info!("Refresher stopped");
    }
}

/// Owner of a running refresh loop.
///
/// Dropping the handle also stops the loop, without waiting for it.
pub struct RefresherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Signals the loop to stop and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        if let Err(e) = self.task.await {
            tracing::error!("Refresher task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

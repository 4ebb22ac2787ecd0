//! Periodic scan loop and the cached status snapshot.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fleetdeploy_protocol::{HostEntry, HostStatus};
use tokio::sync::{Notify, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Scanner tuning knobs.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Time between periodic sweeps.
    pub interval: Duration,
    /// Per-host probe deadline.
    pub probe_timeout: Duration,
    /// Probes in flight at once.
    pub max_concurrent: usize,
    /// Administrative share with a `{host}` placeholder, e.g. `\\{host}\C$`.
    pub share_pattern: String,
    /// App root under the share, for hosts without a per-host override.
    pub default_app_root: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            probe_timeout: Duration::from_millis(800),
            max_concurrent: 6,
            share_pattern: r"\\{host}\C$".to_string(),
            default_app_root: "Apps".to_string(),
        }
    }
}

/// Point-in-time copy of the scanner's cache.
///
/// `completed`/`total` describe the current sweep; pollers watching an
/// in-flight sweep see `completed` climb and statuses refresh host by host.
#[derive(Debug, Clone)]
pub struct ScanSnapshot {
    pub statuses: Vec<HostStatus>,
    pub scan_in_progress: bool,
    pub completed: usize,
    pub total: usize,
    pub last_scan: Option<DateTime<Utc>>,
}

struct ScanState {
    statuses: RwLock<Vec<HostStatus>>,
    last_scan: RwLock<Option<DateTime<Utc>>>,
    scanning: AtomicBool,
    completed: AtomicUsize,
    total: AtomicUsize,
    trigger: Notify,
}

/// Probes every configured host on a schedule and caches the results.
pub struct HostScanner {
    hosts: Vec<HostEntry>,
    config: ScanConfig,
    prober: Arc<dyn crate::Prober>,
    state: Arc<ScanState>,
}

impl HostScanner {
    pub fn new(hosts: Vec<HostEntry>, config: ScanConfig, prober: Arc<dyn crate::Prober>) -> Self {
        let statuses = hosts
            .iter()
            .map(|h| HostStatus::unchecked(&h.host))
            .collect();
        Self {
            hosts,
            config,
            prober,
            state: Arc::new(ScanState {
                statuses: RwLock::new(statuses),
                last_scan: RwLock::new(None),
                scanning: AtomicBool::new(false),
                completed: AtomicUsize::new(0),
                total: AtomicUsize::new(0),
                trigger: Notify::new(),
            }),
        }
    }

    /// Current cached state. Never blocks on the network.
    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            statuses: self.state.statuses.read().unwrap().clone(),
            scan_in_progress: self.state.scanning.load(Ordering::SeqCst),
            completed: self.state.completed.load(Ordering::SeqCst),
            total: self.state.total.load(Ordering::SeqCst),
            last_scan: *self.state.last_scan.read().unwrap(),
        }
    }

    /// Requests an out-of-band sweep.
    ///
    /// While a sweep is running the request is dropped; the running sweep's
    /// results are fresh enough.
    pub fn trigger_scan(&self) {
        if self.state.scanning.load(Ordering::SeqCst) {
            debug!("scan already in progress, trigger coalesced");
            return;
        }
        self.state.trigger.notify_one();
    }

    /// Runs the scan loop until the token is cancelled.
    ///
    /// The first sweep starts immediately; afterwards sweeps run every
    /// [`ScanConfig::interval`] or on [`HostScanner::trigger_scan`].
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(hosts = self.hosts.len(), "host scanner started");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("host scanner stopped");
                        break;
                    }
                    _ = ticker.tick() => {}
                    _ = self.state.trigger.notified() => {}
                }
                self.scan_once().await;
            }
        })
    }

    /// One full sweep over every configured host.
    ///
    /// A no-op when a sweep is already running; counters belong to the
    /// running sweep and are untouched. Each host's status overwrites its
    /// cached entry as the probe lands, and `completed` counts along.
    pub async fn scan_once(&self) {
        if self.state.scanning.swap(true, Ordering::SeqCst) {
            debug!("scan already in progress");
            return;
        }
        self.state.total.store(self.hosts.len(), Ordering::SeqCst);
        self.state.completed.store(0, Ordering::SeqCst);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut set = JoinSet::new();
        for entry in self.hosts.clone() {
            let prober = Arc::clone(&self.prober);
            let semaphore = Arc::clone(&semaphore);
            let probe_timeout = self.config.probe_timeout;
            let share_pattern = self.config.share_pattern.clone();
            let app_root = entry
                .app_root
                .clone()
                .unwrap_or_else(|| self.config.default_app_root.clone());
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                probe_host(&entry.host, prober, probe_timeout, &share_pattern, &app_root).await
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(status) => self.record(status),
                Err(e) => warn!(error = %e, "host probe task failed"),
            }
            self.state.completed.fetch_add(1, Ordering::SeqCst);
        }

        let reachable = {
            let statuses = self.state.statuses.read().unwrap();
            statuses.iter().filter(|s| s.accessible).count()
        };
        debug!(reachable, total = self.hosts.len(), "sweep complete");

        *self.state.last_scan.write().unwrap() = Some(Utc::now());
        self.state.scanning.store(false, Ordering::SeqCst);
    }

    /// Last-write-wins replacement of one host's cached status.
    fn record(&self, status: HostStatus) {
        let mut statuses = self.state.statuses.write().unwrap();
        match statuses.iter_mut().find(|s| s.host == status.host) {
            Some(slot) => *slot = status,
            None => statuses.push(status),
        }
    }
}

async fn probe_host(
    host: &str,
    prober: Arc<dyn crate::Prober>,
    probe_timeout: Duration,
    share_pattern: &str,
    app_root: &str,
) -> HostStatus {
    let mut status = HostStatus::unchecked(host);
    match prober.probe(host, probe_timeout).await {
        Err(reason) => {
            status.message = Some(format!("probe failed: {reason}"));
        }
        Ok(latency) => {
            status.accessible = true;
            status.latency_ms = Some(latency.as_millis() as u64);

            // root_exists is only a verdict once the share answered; an
            // unreachable share says nothing about the app root.
            let share = PathBuf::from(share_pattern.replace("{host}", host));
            if !share.is_dir() {
                status.message = Some("share not accessible".to_string());
            } else if share.join(app_root).is_dir() {
                status.root_exists = Some(true);
            } else {
                status.root_exists = Some(false);
                status.message = Some("app root missing".to_string());
            }
        }
    }
    status.checked_utc = Utc::now();
    status
}

//! Advisory link health monitor.
//!
//! Polls a health endpoint on a fixed interval and classifies the result.
//! Purely display state: it never gates dispatch or execution, and probe
//! failures never escape its boundary.

use std::sync::Mutex;
use std::time::Duration;

use agentdeck_core::LinkHealth;
use events::{Event, EventBus};
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LinkMonitorConfig {
    pub endpoint: String,
    pub interval: Duration,
    pub probe_timeout: Duration,
}

impl LinkMonitorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            interval: DEFAULT_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// Optional richer payload on the health endpoint. A success status with
/// a partial-failure indicator downgrades to `degraded`.
#[derive(Debug, Deserialize)]
struct HealthPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    degraded: Option<bool>,
}

/// Periodic health probe with an explicit start/stop lifecycle, owned by
/// whichever view mounts it. Stopping (or dropping) releases the polling
/// task; no background work survives the owner.
pub struct LinkMonitor {
    config: LinkMonitorConfig,
    client: reqwest::Client,
    bus: EventBus,
    status_tx: watch::Sender<LinkHealth>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LinkMonitor {
    pub fn new(config: LinkMonitorConfig, bus: EventBus) -> Self {
        let (status_tx, _) = watch::channel(LinkHealth::Unreachable);
        Self {
            config,
            client: reqwest::Client::new(),
            bus,
            status_tx,
            task: Mutex::new(None),
        }
    }

    pub fn status(&self) -> LinkHealth {
        *self.status_tx.borrow()
    }

    /// Watch channel for health changes; receivers see the latest value.
    pub fn subscribe(&self) -> watch::Receiver<LinkHealth> {
        self.status_tx.subscribe()
    }

    /// Start polling. A no-op if the monitor is already running.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap();
        if task.is_some() {
            return;
        }

        let client = self.client.clone();
        let config = self.config.clone();
        let status_tx = self.status_tx.clone();
        let bus = self.bus.clone();

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            loop {
                ticker.tick().await;
                let health = probe(&client, &config).await;

                let previous = *status_tx.borrow();
                if health != previous {
                    debug!(from = previous.as_str(), to = health.as_str(), "link health changed");
                    bus.publish(Event::LinkHealthChanged {
                        from: previous,
                        to: health,
                    });
                }
                // send_replace keeps publishing even with no receivers.
                status_tx.send_replace(health);
            }
        }));
    }

    /// Stop polling and release the background task.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for LinkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One probe. Never returns an error: anything that goes wrong is an
/// `Unreachable` classification and the schedule continues.
async fn probe(client: &reqwest::Client, config: &LinkMonitorConfig) -> LinkHealth {
    let request = client.get(&config.endpoint).send();

    let response = match tokio::time::timeout(config.probe_timeout, request).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(error = %e, "health probe failed");
            return LinkHealth::Unreachable;
        }
        Err(_) => {
            warn!(timeout_ms = config.probe_timeout.as_millis() as u64, "health probe timed out");
            return LinkHealth::Unreachable;
        }
    };

    if !response.status().is_success() {
        return LinkHealth::Unreachable;
    }

    // The payload is optional; HTTP success alone means healthy.
    match response.json::<HealthPayload>().await {
        Ok(payload) => classify_payload(&payload),
        Err(_) => LinkHealth::Healthy,
    }
}

fn classify_payload(payload: &HealthPayload) -> LinkHealth {
    if payload.degraded == Some(true) {
        return LinkHealth::Degraded;
    }
    match payload.status.as_deref() {
        Some("degraded") | Some("partial") => LinkHealth::Degraded,
        _ => LinkHealth::Healthy,
    }
}

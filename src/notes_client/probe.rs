use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

const PROBE_RETRY_DELAY: Duration = Duration::from_millis(2000);
const PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Liveness probe for the backend.
///
/// Sole writer of the process-local readiness flag; views read the flag
/// and may ask for one extra synchronous attempt before their first
/// operation. Probe failures are logged and never surfaced: readiness
/// is a warm-up signal, not a correctness gate.
#[derive(Clone)]
pub struct ReadinessProbe {
    http: Client,
    health_url: String,
    ready: Arc<AtomicBool>,
    retry_delay: Duration,
    probe_timeout: Duration,
}

impl ReadinessProbe {
    pub fn new(http: Client, health_url: String) -> Self {
        Self {
            http,
            health_url,
            ready: Arc::new(AtomicBool::new(false)),
            retry_delay: PROBE_RETRY_DELAY,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Outcome of the most recent probe.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Probe immediately, then keep retrying at a fixed cadence until
    /// the backend reports ready. Fire-and-forget; never errors.
    pub fn spawn(&self) -> JoinHandle<()> {
        let probe = self.clone();
        tokio::spawn(async move {
            loop {
                if probe.probe_once().await {
                    debug!("Backend reported ready");
                    return;
                }
                warn!("API health check failed, will retry shortly");
                sleep(probe.retry_delay).await;
            }
        })
    }

    /// One extra blocking attempt, used right before a component's
    /// first user-triggered operation to shake off cold starts. Best
    /// effort: callers proceed whatever the outcome.
    pub async fn check_now(&self) -> bool {
        let ready = self.probe_once().await;
        if !ready {
            warn!("Server health check failed before first operation");
        }
        ready
    }

    async fn probe_once(&self) -> bool {
        let outcome = self
            .http
            .get(&self.health_url)
            .header("Cache-Control", "no-cache")
            .timeout(self.probe_timeout)
            .send()
            .await;

        let ready = match outcome {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(status = %response.status(), "Health probe returned non-success status");
                false
            }
            Err(err) => {
                debug!(error = ?err, "Health probe transport failure");
                false
            }
        };

        self.ready.store(ready, Ordering::Relaxed);
        ready
    }
}

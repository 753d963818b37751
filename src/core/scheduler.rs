//! Best-effort background activities
//!
//! Each activity is a named periodic task with an interval and a tolerance
//! window. The tolerance defers each firing by a random slice so activities
//! coalesce the way OS background schedulers allow; at most one execution of
//! an activity is ever in flight.

use log::{debug, warn};
use rand::Rng;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Static description of a background activity.
#[derive(Debug, Clone)]
pub struct ActivityConfig {
    /// Stable identifier, used in logs ("update-check", "support").
    pub identifier: String,
    /// Nominal time between firings.
    pub interval: Duration,
    /// How far a firing may be deferred beyond the interval.
    pub tolerance: Duration,
}

impl ActivityConfig {
    pub fn new(identifier: impl Into<String>, interval: Duration, tolerance: Duration) -> Self {
        Self {
            identifier: identifier.into(),
            interval,
            tolerance,
        }
    }
}

/// A running background activity. Lives for the process lifetime; `stop` is
/// only used by tests and shutdown paths that want determinism.
pub struct BackgroundActivity {
    config: ActivityConfig,
    last_run: Arc<StdMutex<Option<Instant>>>,
    handle: JoinHandle<()>,
}

impl BackgroundActivity {
    /// Spawn the activity loop on the current tokio runtime.
    ///
    /// `task` produces one execution per firing. A failed execution is
    /// logged and dropped; the next firing is the retry mechanism. If a
    /// firing comes due while the previous execution is still running, the
    /// firing is skipped.
    pub fn spawn<F, Fut>(config: ActivityConfig, task: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let last_run = Arc::new(StdMutex::new(None));
        let last_run_loop = Arc::clone(&last_run);
        let in_flight = Arc::new(AsyncMutex::new(()));
        let identifier = config.identifier.clone();
        let interval = config.interval;
        let tolerance = config.tolerance;

        let handle = tokio::spawn(async move {
            loop {
                let deferral = if tolerance.is_zero() {
                    Duration::ZERO
                } else {
                    rand::thread_rng().gen_range(Duration::ZERO..=tolerance)
                };
                tokio::time::sleep(interval + deferral).await;

                let guard = match Arc::clone(&in_flight).try_lock_owned() {
                    Ok(guard) => guard,
                    Err(_) => {
                        debug!("{identifier}: previous run still in flight, skipping");
                        continue;
                    }
                };

                if let Ok(mut slot) = last_run_loop.lock() {
                    *slot = Some(Instant::now());
                }

                let identifier = identifier.clone();
                let fut = task();
                tokio::spawn(async move {
                    let _guard = guard;
                    if let Err(e) = fut.await {
                        warn!("{identifier}: run failed: {e:#}");
                    }
                });
            }
        });

        Self {
            config,
            last_run,
            handle,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.config.identifier
    }

    /// When the activity last fired, if it has.
    pub fn last_run(&self) -> Option<Instant> {
        self.last_run.lock().ok().and_then(|slot| *slot)
    }

    /// Cancel the activity loop. Any execution already in flight finishes
    /// on its own.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for BackgroundActivity {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

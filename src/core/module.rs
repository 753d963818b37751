//! Module trait and lifecycle state machine
//!
//! A module is a self-contained resource monitor (CPU, RAM, ...) that owns
//! its sampling cadence. `MonitorModule` implements the lifecycle around a
//! boxed [`Sampler`]: the sampler and the latest reading survive pause, the
//! sampling timer does not.

use super::timer::SamplingTimer;
use anyhow::Result;
use arc_swap::ArcSwap;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A single snapshot of a module's values, keyed the way displayers expect.
pub type Reading = HashMap<String, Value>;

/// Lifecycle state of a module.
///
/// `Unmounted -> Mounted <-> Paused -> Terminated`; `Failed` is entered when
/// mounting could not acquire the module's sampling resources. Both `Failed`
/// and `Terminated` leave the module inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unmounted,
    Mounted,
    Paused,
    Failed,
    Terminated,
}

/// Collects one resource's metrics.
///
/// Implementations wrap the platform-specific reading (sysinfo, NVML, sysfs)
/// and are driven from the module's sampling thread.
pub trait Sampler: Send {
    /// Acquire whatever the sampler needs before the first `sample()` call.
    ///
    /// Returning an error leaves the owning module inert without affecting
    /// the rest of the process.
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether this resource exists on the current system.
    fn is_available(&self) -> bool {
        true
    }

    /// Take one reading.
    fn sample(&mut self) -> Result<Reading>;
}

/// Type-erased sampler for dynamic dispatch.
pub type BoxedSampler = Box<dyn Sampler>;

/// Contract every resource monitor implements.
///
/// All four lifecycle operations return success/failure instead of
/// panicking; the caller logs and continues.
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> ModuleState;

    /// Allocate sampling resources and begin periodic collection.
    fn mount(&self) -> Result<()>;

    /// Release all sampling resources. Idempotent; a no-op on a module that
    /// never mounted.
    fn terminate(&self) -> Result<()>;

    /// Stop sampling without releasing widget state, so resume is cheap.
    fn pause(&self) -> Result<()>;

    /// Restart sampling at the prior cadence.
    fn resume(&self) -> Result<()>;
}

/// Type-erased module for the registry.
pub type BoxedModule = Box<dyn Module>;

/// Generic module driving a [`Sampler`] on a [`SamplingTimer`].
///
/// The timer exists only while the module is mounted and not paused; the
/// latest reading lives in an `ArcSwap` slot that displayers read lock-free
/// and that pause/resume leaves untouched.
pub struct MonitorModule {
    name: String,
    interval: Duration,
    state: Mutex<ModuleState>,
    sampler: Arc<Mutex<BoxedSampler>>,
    latest: Arc<ArcSwap<Reading>>,
    timer: Mutex<Option<SamplingTimer>>,
}

impl MonitorModule {
    pub fn new(name: impl Into<String>, interval: Duration, sampler: BoxedSampler) -> Self {
        Self {
            name: name.into(),
            interval,
            state: Mutex::new(ModuleState::Unmounted),
            sampler: Arc::new(Mutex::new(sampler)),
            latest: Arc::new(ArcSwap::from_pointee(Reading::new())),
            timer: Mutex::new(None),
        }
    }

    /// The most recent reading. Survives pause/resume cycles.
    pub fn latest(&self) -> Arc<Reading> {
        self.latest.load_full()
    }

    /// Configured sampling cadence.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of live sampling timers (0 or 1 by construction).
    pub fn timer_count(&self) -> usize {
        self.timer
            .lock()
            .map(|t| usize::from(t.is_some()))
            .unwrap_or(0)
    }

    fn start_timer(&self) -> Result<()> {
        let sampler = Arc::clone(&self.sampler);
        let latest = Arc::clone(&self.latest);
        let name = self.name.clone();

        let timer = SamplingTimer::spawn(&self.name, self.interval, move || {
            let mut sampler = match sampler.lock() {
                Ok(s) => s,
                Err(_) => return,
            };
            match sampler.sample() {
                Ok(reading) => latest.store(Arc::new(reading)),
                // Per-sample failures are recoverable; the next tick retries.
                Err(e) => debug!("{name}: sample failed: {e}"),
            }
        })?;

        if let Ok(mut slot) = self.timer.lock() {
            *slot = Some(timer);
        }
        Ok(())
    }

    fn stop_timer(&self) {
        let taken = self.timer.lock().ok().and_then(|mut slot| slot.take());
        if let Some(mut timer) = taken {
            timer.stop();
        }
    }
}

impl Module for MonitorModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ModuleState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ModuleState::Failed)
    }

    fn mount(&self) -> Result<()> {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(e) => e.into_inner(),
        };
        match *state {
            ModuleState::Unmounted | ModuleState::Failed => {}
            // Already mounted, paused, or torn down; nothing to do.
            _ => return Ok(()),
        }

        {
            let mut sampler = match self.sampler.lock() {
                Ok(s) => s,
                Err(e) => e.into_inner(),
            };
            if !sampler.is_available() {
                *state = ModuleState::Failed;
                anyhow::bail!("{}: resource not available on this system", self.name);
            }
            if let Err(e) = sampler.setup() {
                *state = ModuleState::Failed;
                return Err(e.context(format!("{}: mount failed", self.name)));
            }
        }

        self.start_timer()?;
        *state = ModuleState::Mounted;
        debug!("{} mounted ({:?} cadence)", self.name, self.interval);
        Ok(())
    }

    fn terminate(&self) -> Result<()> {
        let should_stop = {
            let mut state = match self.state.lock() {
                Ok(s) => s,
                Err(e) => e.into_inner(),
            };
            match *state {
                ModuleState::Mounted | ModuleState::Paused => {
                    *state = ModuleState::Terminated;
                    true
                }
                _ => false,
            }
        };

        // The join happens outside the state lock so a tick that is mid
        // sample can finish without deadlocking against us.
        if should_stop {
            self.stop_timer();
            debug!("{} terminated", self.name);
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        {
            let mut state = match self.state.lock() {
                Ok(s) => s,
                Err(e) => e.into_inner(),
            };
            if *state != ModuleState::Mounted {
                return Ok(());
            }
            *state = ModuleState::Paused;
        }
        self.stop_timer();
        debug!("{} paused", self.name);
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        {
            let state = match self.state.lock() {
                Ok(s) => s,
                Err(e) => e.into_inner(),
            };
            if *state != ModuleState::Paused {
                return Ok(());
            }
        }
        self.start_timer()?;
        if let Ok(mut state) = self.state.lock() {
            *state = ModuleState::Mounted;
        }
        debug!("{} resumed", self.name);
        Ok(())
    }
}

impl Drop for MonitorModule {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            warn!("{}: terminate on drop failed: {e}", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSampler {
        samples: Arc<AtomicUsize>,
        fail_setup: bool,
    }

    impl CountingSampler {
        fn new(samples: Arc<AtomicUsize>) -> Self {
            Self {
                samples,
                fail_setup: false,
            }
        }
    }

    impl Sampler for CountingSampler {
        fn setup(&mut self) -> Result<()> {
            if self.fail_setup {
                anyhow::bail!("permission denied");
            }
            Ok(())
        }

        fn sample(&mut self) -> Result<Reading> {
            let n = self.samples.fetch_add(1, Ordering::SeqCst);
            let mut reading = Reading::new();
            reading.insert("count".to_string(), Value::from(n as u64));
            Ok(reading)
        }
    }

    fn test_module(samples: Arc<AtomicUsize>) -> MonitorModule {
        MonitorModule::new(
            "test",
            Duration::from_millis(10),
            Box::new(CountingSampler::new(samples)),
        )
    }

    #[test]
    fn test_mount_begins_sampling() {
        let samples = Arc::new(AtomicUsize::new(0));
        let module = test_module(samples.clone());

        assert_eq!(module.state(), ModuleState::Unmounted);
        module.mount().unwrap();
        assert_eq!(module.state(), ModuleState::Mounted);

        std::thread::sleep(Duration::from_millis(40));
        assert!(samples.load(Ordering::SeqCst) >= 2);
        assert!(!module.latest().is_empty());

        module.terminate().unwrap();
    }

    #[test]
    fn test_failed_mount_leaves_module_inert() {
        let samples = Arc::new(AtomicUsize::new(0));
        let mut sampler = CountingSampler::new(samples.clone());
        sampler.fail_setup = true;
        let module = MonitorModule::new("test", Duration::from_millis(10), Box::new(sampler));

        assert!(module.mount().is_err());
        assert_eq!(module.state(), ModuleState::Failed);
        assert_eq!(module.timer_count(), 0);

        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(samples.load(Ordering::SeqCst), 0);

        // Terminate on a failed module is a no-op.
        module.terminate().unwrap();
        assert_eq!(module.state(), ModuleState::Failed);
    }

    #[test]
    fn test_pause_stops_sampling_resume_restarts() {
        let samples = Arc::new(AtomicUsize::new(0));
        let module = test_module(samples.clone());
        module.mount().unwrap();
        std::thread::sleep(Duration::from_millis(25));

        module.pause().unwrap();
        assert_eq!(module.state(), ModuleState::Paused);
        assert_eq!(module.timer_count(), 0);

        let paused_at = samples.load(Ordering::SeqCst);
        let last = module.latest();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(samples.load(Ordering::SeqCst), paused_at);
        // Widget state is retained across pause.
        assert_eq!(*module.latest(), *last);

        module.resume().unwrap();
        assert_eq!(module.state(), ModuleState::Mounted);
        std::thread::sleep(Duration::from_millis(30));
        assert!(samples.load(Ordering::SeqCst) > paused_at);

        module.terminate().unwrap();
    }

    #[test]
    fn test_repeated_pause_resume_leaves_single_timer() {
        let samples = Arc::new(AtomicUsize::new(0));
        let module = test_module(samples);
        module.mount().unwrap();

        for _ in 0..5 {
            module.pause().unwrap();
            module.resume().unwrap();
        }
        assert_eq!(module.timer_count(), 1);

        // Redundant resumes must not stack timers either.
        module.resume().unwrap();
        module.resume().unwrap();
        assert_eq!(module.timer_count(), 1);

        module.terminate().unwrap();
        assert_eq!(module.timer_count(), 0);
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let samples = Arc::new(AtomicUsize::new(0));
        let module = test_module(samples.clone());

        // Terminating a never-mounted module is a no-op.
        module.terminate().unwrap();
        assert_eq!(module.state(), ModuleState::Unmounted);

        module.mount().unwrap();
        module.terminate().unwrap();
        assert_eq!(module.state(), ModuleState::Terminated);

        let at_terminate = samples.load(Ordering::SeqCst);
        module.terminate().unwrap();
        assert_eq!(module.state(), ModuleState::Terminated);

        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(samples.load(Ordering::SeqCst), at_terminate);
    }

    #[test]
    fn test_pause_before_mount_is_noop() {
        let samples = Arc::new(AtomicUsize::new(0));
        let module = test_module(samples);
        module.pause().unwrap();
        assert_eq!(module.state(), ModuleState::Unmounted);
        module.resume().unwrap();
        assert_eq!(module.state(), ModuleState::Unmounted);
    }
}

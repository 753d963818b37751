//! Sampling timer backing each module's periodic collection
//!
//! A `SamplingTimer` owns a dedicated thread that invokes a tick callback at
//! a fixed cadence. The thread is commanded over a channel and joined on
//! stop, so cancellation is synchronous: once `stop()` returns, no further
//! tick can run.

use anyhow::{Context, Result};
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use log::trace;
use std::thread::JoinHandle;
use std::time::Duration;

enum TimerCommand {
    Stop,
}

/// A periodic tick driver on its own thread.
///
/// The first tick fires immediately on spawn so a freshly mounted module has
/// a reading before its first full interval elapses.
pub struct SamplingTimer {
    sender: Option<Sender<TimerCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl SamplingTimer {
    /// Spawn the timer thread. `tick` runs once right away, then once per
    /// `interval` until the timer is stopped or dropped.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = bounded::<TimerCommand>(1);
        let thread_name = format!("sample-{name}");

        let handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                tick();
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => tick(),
                        Ok(TimerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                trace!("{thread_name} exiting");
            })
            .with_context(|| format!("failed to spawn sampling thread for {name}"))?;

        Ok(Self {
            sender: Some(tx),
            handle: Some(handle),
        })
    }

    /// Stop the timer and wait for the thread to finish.
    ///
    /// An in-flight tick completes before this returns; no tick runs after.
    pub fn stop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(TimerCommand::Stop);
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Sampling thread panicked: {:?}", e);
            }
        }
    }

    /// Whether the timer thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for SamplingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_ticks_at_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let mut timer = SamplingTimer::spawn("test", Duration::from_millis(10), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(55));
        timer.stop();

        // Immediate tick plus several interval ticks.
        let ticks = count.load(Ordering::SeqCst);
        assert!(ticks >= 3, "expected at least 3 ticks, got {}", ticks);
    }

    #[test]
    fn test_stop_is_synchronous() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let mut timer = SamplingTimer::spawn("test", Duration::from_millis(5), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(20));
        timer.stop();
        assert!(!timer.is_running());

        let after_stop = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(
            count.load(Ordering::SeqCst),
            after_stop,
            "tick ran after stop() returned"
        );
    }

    #[test]
    fn test_drop_stops_thread() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        {
            let _timer = SamplingTimer::spawn("test", Duration::from_millis(5), move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            std::thread::sleep(Duration::from_millis(15));
        }
        let after_drop = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_first_tick_is_immediate() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let mut timer = SamplingTimer::spawn("test", Duration::from_secs(60), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(30));
        timer.stop();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

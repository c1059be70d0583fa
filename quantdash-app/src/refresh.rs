//! Fixed-interval auto refresh.
//!
//! [`AutoRefresh`] runs a callback on its own thread every `interval` until it
//! is stopped, dropped, or the callback returns [`Tick::Stop`]. Stopping wakes
//! the thread immediately instead of waiting out the current interval.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the callback wants after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

/// Handle to a running refresh timer. Dropping it stops the timer.
pub struct AutoRefresh {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicUsize>,
    interval: Duration,
}

impl AutoRefresh {
    /// Start calling `callback` every `interval`. The first call happens after
    /// one full interval.
    pub fn start<F>(interval: Duration, mut callback: F) -> std::io::Result<Self>
    where
        F: FnMut() -> Tick + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicUsize::new(0));

        let thread_running = Arc::clone(&running);
        let thread_ticks = Arc::clone(&ticks);
        let handle = thread::Builder::new()
            .name("quantdash-refresh".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            thread_ticks.fetch_add(1, Ordering::Relaxed);
                            if callback() == Tick::Stop {
                                tracing::debug!("auto refresh stopped by callback");
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                thread_running.store(false, Ordering::Release);
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            running,
            ticks,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of callbacks issued so far.
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Stop the timer and wait for the thread to exit. No callback starts afterwards.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        self.join_thread();
    }

    /// Block until the callback asks to stop.
    pub fn wait(mut self) {
        self.join_thread();
    }

    fn join_thread(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("auto refresh callback panicked");
            }
        }
        self.running.store(false, Ordering::Release);
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.stop();
    }
}

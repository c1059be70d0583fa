//! Per-symbol chart settings with debounced writes.
//!
//! Reads are synchronous and see pending values. Writes land in a pending map
//! with a per-key deadline; a background writer thread persists each key once
//! its deadline passes. Saving the same key again replaces the pending value
//! and restarts that key's timer, so a burst of changes becomes one write.
//!
//! A write that fails stays pending and is retried after another debounce
//! period, so the value keeps winning over the stored one until it lands.
//!
//! Communication with the writer thread is via an `mpsc` channel. Dropping
//! the store flushes everything still pending and joins the thread.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use quantdash_core::chart::{settings_key, ChartSettings, SETTINGS_KEY_PREFIX};

use crate::store::{lock, KeyValueStore, StoreError};

/// Default delay between the last save of a key and its write.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shortest wait before retrying a failed write.
const MIN_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Commands sent to the writer thread.
#[derive(Debug)]
enum WriterCommand {
    /// A pending entry changed; recompute the next deadline.
    Touch,
    /// Write everything now, then acknowledge with the first failure.
    Flush(Sender<Result<(), StoreError>>),
    Shutdown,
}

#[derive(Debug)]
struct Pending {
    value: String,
    deadline: Instant,
}

struct Shared {
    store: Arc<dyn KeyValueStore>,
    pending: Mutex<HashMap<String, Pending>>,
    retry_delay: Duration,
}

impl Shared {
    fn next_deadline(&self) -> Option<Instant> {
        lock(&self.pending).values().map(|p| p.deadline).min()
    }

    /// Persist pending entries due at `now`, or all of them when `now` is `None`.
    ///
    /// The pending lock is held while writing so a concurrent read never sees
    /// a key that is in neither the pending map nor the store. Entries whose
    /// write fails go back into the map with a fresh deadline; the first
    /// failure is returned.
    fn write_due(&self, now: Option<Instant>) -> Result<(), StoreError> {
        let mut pending = lock(&self.pending);
        let mut first_error = None;
        let due: Vec<String> = pending
            .iter()
            .filter(|(_, p)| now.map_or(true, |now| p.deadline <= now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in due {
            let Some(entry) = pending.remove(&key) else {
                continue;
            };
            match self.store.set(&key, &entry.value) {
                Ok(()) => tracing::debug!(key = %key, "flushed chart settings"),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "failed to persist chart settings, will retry");
                    pending.insert(
                        key,
                        Pending {
                            value: entry.value,
                            deadline: Instant::now() + self.retry_delay,
                        },
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Chart settings store keyed by `"react-financial-chart:<symbol>"`.
pub struct ChartSettingsStore {
    shared: Arc<Shared>,
    tx: Sender<WriterCommand>,
    handle: Option<JoinHandle<()>>,
    debounce: Duration,
}

impl ChartSettingsStore {
    /// Create a store over `store`, spawning its writer thread.
    pub fn new(store: Arc<dyn KeyValueStore>, debounce: Duration) -> Result<Self, StoreError> {
        let shared = Arc::new(Shared {
            store,
            pending: Mutex::new(HashMap::new()),
            retry_delay: debounce.max(MIN_RETRY_DELAY),
        });
        let (tx, rx) = mpsc::channel();
        let writer_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("quantdash-settings-writer".into())
            .spawn(move || writer_loop(writer_shared, rx))
            .map_err(StoreError::Spawn)?;

        Ok(Self {
            shared,
            tx,
            handle: Some(handle),
            debounce,
        })
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Settings for `symbol`, or `None` if never saved or unreadable.
    ///
    /// A pending (not yet written) value wins over the stored one.
    pub fn load(&self, symbol: &str) -> Option<ChartSettings> {
        let key = settings_key(symbol);
        let raw = {
            let pending = lock(&self.shared.pending);
            match pending.get(&key) {
                Some(p) => Some(p.value.clone()),
                None => match self.shared.store.get(&key) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "failed to read chart settings");
                        None
                    }
                },
            }
        }?;

        match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "ignoring corrupt chart settings");
                None
            }
        }
    }

    /// Settings for `symbol`, falling back to defaults.
    pub fn load_or_default(&self, symbol: &str) -> ChartSettings {
        self.load(symbol).unwrap_or_default()
    }

    /// Queue `settings` for `symbol`. The write happens after the debounce delay.
    pub fn save(&self, symbol: &str, settings: &ChartSettings) -> Result<(), StoreError> {
        let value = serde_json::to_string(settings)?;
        let key = settings_key(symbol);
        let deadline = Instant::now() + self.debounce;
        lock(&self.shared.pending).insert(key, Pending { value, deadline });
        if self.tx.send(WriterCommand::Touch).is_err() {
            // Writer is gone; persist synchronously so the value is not lost.
            self.shared.write_due(None)?;
        }
        Ok(())
    }

    /// Drop the saved settings for `symbol`, including any pending write.
    pub fn remove(&self, symbol: &str) -> Result<(), StoreError> {
        let key = settings_key(symbol);
        let mut pending = lock(&self.shared.pending);
        pending.remove(&key);
        self.shared.store.remove(&key)
    }

    /// Write every pending value now and wait for the writer to finish.
    ///
    /// Returns the first write failure. Values that failed stay pending, so
    /// [`load`](Self::load) still returns them and a later flush retries.
    pub fn flush(&self) -> Result<(), StoreError> {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(WriterCommand::Flush(ack_tx)).is_ok() {
            if let Ok(result) = ack_rx.recv() {
                return result;
            }
        }
        self.shared.write_due(None)
    }

    /// Number of keys waiting to be written.
    pub fn pending_count(&self) -> usize {
        lock(&self.shared.pending).len()
    }

    /// Symbols with saved or pending settings, sorted.
    pub fn symbols(&self) -> Result<Vec<String>, StoreError> {
        let mut symbols: Vec<String> = self
            .shared
            .store
            .keys()?
            .into_iter()
            .chain(lock(&self.shared.pending).keys().cloned())
            .filter_map(|k| k.strip_prefix(SETTINGS_KEY_PREFIX).map(str::to_string))
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

impl Drop for ChartSettingsStore {
    fn drop(&mut self) {
        let _ = self.tx.send(WriterCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("settings writer thread panicked");
                if let Err(e) = self.shared.write_due(None) {
                    tracing::error!(error = %e, "chart settings not persisted at shutdown");
                }
            }
        }
    }
}

fn writer_loop(shared: Arc<Shared>, rx: Receiver<WriterCommand>) {
    loop {
        let cmd = match shared.next_deadline() {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match cmd {
            Ok(WriterCommand::Touch) | Err(RecvTimeoutError::Timeout) => {
                // Failures are logged per key and stay pending for the next deadline.
                let _ = shared.write_due(Some(Instant::now()));
            }
            Ok(WriterCommand::Flush(ack)) => {
                let _ = ack.send(shared.write_due(None));
            }
            Ok(WriterCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                if let Err(e) = shared.write_due(None) {
                    let lost = lock(&shared.pending).len();
                    tracing::error!(error = %e, lost, "chart settings not persisted at shutdown");
                }
                break;
            }
        }
    }
}

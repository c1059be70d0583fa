//! Query cache with staleness and background revalidation.
//!
//! Entries are keyed by a content hash of `(resource, params)`. Lookup rules:
//! - fresh entry (younger than the stale time) → returned, no fetch
//! - stale entry → returned immediately; one background refetch per key is
//!   scheduled on the rayon pool and replaces the entry when it succeeds
//! - missing entry → fetched synchronously; errors are returned, never cached
//!
//! `invalidate(resource)` drops every key of a resource after a mutation.
//! Each resource carries a generation that `invalidate` bumps; a fetch that
//! started under an older generation is discarded instead of stored. The
//! check and the store happen under the same lock as the invalidation.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::api::ApiError;
use crate::store::lock;

/// Deterministic key for a `(resource, params)` pair (blake3 hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Fails only when `params` cannot be serialized (e.g. a map with
    /// non-string keys); such queries are never cached.
    pub fn new<P: Serialize + ?Sized>(
        resource: &str,
        params: &P,
    ) -> Result<Self, serde_json::Error> {
        let params = serde_json::to_vec(params)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(resource.as_bytes());
        hasher.update(&[0]);
        hasher.update(&params);
        Ok(Self(hasher.finalize().to_hex().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn cache_key<P: Serialize + ?Sized>(resource: &str, params: &P) -> Option<QueryKey> {
    match QueryKey::new(resource, params) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::warn!(resource, error = %e, "query params are not serializable, bypassing cache");
            None
        }
    }
}

type Value = Arc<dyn Any + Send + Sync>;

struct Entry {
    resource: String,
    value: Value,
    fetched_at: Instant,
}

/// Invalidation state a fetch was started under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generation {
    clears: u64,
    resource: u64,
}

#[derive(Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    /// Per-resource invalidation count.
    generations: HashMap<String, u64>,
    clears: u64,
}

impl State {
    fn generation(&self, resource: &str) -> Generation {
        Generation {
            clears: self.clears,
            resource: self.generations.get(resource).copied().unwrap_or(0),
        }
    }

    fn insert(&mut self, key: QueryKey, resource: &str, value: Value) {
        self.entries.insert(
            key,
            Entry {
                resource: resource.to_string(),
                value,
                fetched_at: Instant::now(),
            },
        );
    }
}

struct Inner {
    stale_time: Duration,
    state: Mutex<State>,
    in_flight: Mutex<HashSet<QueryKey>>,
}

impl Inner {
    /// Store `value` unless `resource` was invalidated since `seen`.
    fn store_if_current(
        &self,
        key: QueryKey,
        resource: &str,
        value: Value,
        seen: Generation,
    ) -> bool {
        let mut state = lock(&self.state);
        if state.generation(resource) != seen {
            return false;
        }
        state.insert(key, resource, value);
        true
    }
}

/// Outcome of a cache lookup, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Fresh,
    Stale,
    Miss,
}

/// Shared query cache. Cloning is cheap and shares the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                stale_time,
                state: Mutex::new(State::default()),
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    /// State of the entry for `(resource, params)` right now.
    pub fn lookup<P: Serialize + ?Sized>(&self, resource: &str, params: &P) -> Lookup {
        let Some(key) = cache_key(resource, params) else {
            return Lookup::Miss;
        };
        match lock(&self.inner.state).entries.get(&key) {
            Some(e) if e.fetched_at.elapsed() < self.inner.stale_time => Lookup::Fresh,
            Some(_) => Lookup::Stale,
            None => Lookup::Miss,
        }
    }

    /// Cached value for `(resource, params)`, fetching per the staleness rules.
    ///
    /// `fetch` must be `'static` because a stale hit runs it on the rayon pool.
    pub fn get<T, P, F>(&self, resource: &str, params: &P, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        P: Serialize + ?Sized,
        F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    {
        let Some(key) = cache_key(resource, params) else {
            return fetch();
        };
        let (cached, seen) = {
            let state = lock(&self.inner.state);
            let cached = state.entries.get(&key).and_then(|e| {
                let value = e.value.clone().downcast::<T>().ok()?;
                Some((value, e.fetched_at.elapsed() < self.inner.stale_time))
            });
            (cached, state.generation(resource))
        };

        match cached {
            Some((value, true)) => {
                tracing::debug!(resource, key = %key, "query cache hit");
                Ok(T::clone(&value))
            }
            Some((value, false)) => {
                tracing::debug!(resource, key = %key, "query cache stale, revalidating");
                self.spawn_refetch(key, resource, seen, fetch);
                Ok(T::clone(&value))
            }
            None => {
                tracing::debug!(resource, key = %key, "query cache miss");
                let value = fetch()?;
                if !self
                    .inner
                    .store_if_current(key, resource, Arc::new(value.clone()), seen)
                {
                    tracing::debug!(resource, "not caching fetch that raced an invalidation");
                }
                Ok(value)
            }
        }
    }

    /// Schedule one background refetch for `key` unless one is already running.
    fn spawn_refetch<T, F>(&self, key: QueryKey, resource: &str, seen: Generation, fetch: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    {
        if !lock(&self.inner.in_flight).insert(key.clone()) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let resource = resource.to_string();
        rayon::spawn(move || {
            match fetch() {
                Ok(value) => {
                    if !inner.store_if_current(key.clone(), &resource, Arc::new(value), seen) {
                        tracing::debug!(resource = %resource, "discarding refetch after invalidation");
                    }
                }
                Err(e) => tracing::warn!(resource = %resource, error = %e, "background refetch failed"),
            }
            lock(&inner.in_flight).remove(&key);
        });
    }

    /// Insert a value directly (e.g. the response of a mutation).
    pub fn set<T, P>(&self, resource: &str, params: &P, value: T)
    where
        T: Send + Sync + 'static,
        P: Serialize + ?Sized,
    {
        if let Some(key) = cache_key(resource, params) {
            lock(&self.inner.state).insert(key, resource, Arc::new(value));
        }
    }

    /// Drop every entry of `resource` and outdate its in-flight fetches.
    pub fn invalidate(&self, resource: &str) {
        let mut state = lock(&self.inner.state);
        *state.generations.entry(resource.to_string()).or_insert(0) += 1;
        let before = state.entries.len();
        state.entries.retain(|_, e| e.resource != resource);
        tracing::debug!(resource, dropped = before - state.entries.len(), "invalidated queries");
    }

    pub fn clear(&self) {
        let mut state = lock(&self.inner.state);
        state.clears += 1;
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of background refetches still running.
    pub fn in_flight(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }
}

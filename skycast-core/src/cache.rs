//! Keyed in-memory cache for remote resources.
//!
//! Each key has its own freshness window and retention. Concurrent fetches
//! of the same key are collapsed into one upstream call, and a failed fetch
//! keeps whatever data the entry already had.

use std::{
    collections::HashMap,
    fmt::Debug,
    future::Future,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{sync::Mutex, time::Instant};

/// Freshness window and retention for one kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Data younger than this is served without refetching.
    pub stale_time: Duration,
    /// Entries unused for this long are dropped.
    pub gc_time: Duration,
}

impl QueryOptions {
    /// Forecast, air quality, five-day forecast and UV index.
    pub const WEATHER: QueryOptions = QueryOptions {
        stale_time: Duration::from_secs(5 * 60),
        gc_time: Duration::from_secs(10 * 60),
    };

    /// Geocoding matches barely change; keep them for a day.
    pub const GEOCODING: QueryOptions = QueryOptions {
        stale_time: Duration::from_secs(24 * 60 * 60),
        gc_time: Duration::from_secs(5 * 60),
    };
}

/// Snapshot of one cache entry as seen by a consumer.
#[derive(Debug)]
pub struct QueryState<V> {
    pub data: Option<Arc<V>>,
    pub is_fetching: bool,
    pub error: Option<String>,
    pub updated_at: Option<Instant>,
}

impl<V> QueryState<V> {
    fn empty() -> Self {
        Self { data: None, is_fetching: false, error: None, updated_at: None }
    }

    /// Nothing to show yet and a fetch is running.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn data(&self) -> Option<&V> {
        self.data.as_deref()
    }
}

impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            is_fetching: self.is_fetching,
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    data: Option<Arc<V>>,
    updated_at: Option<Instant>,
    error: Option<String>,
    fetching: Arc<AtomicBool>,
    /// Bumped every time a fetch settles.
    generation: u64,
    last_used: Instant,
    gate: Arc<Mutex<()>>,
}

impl<V> Entry<V> {
    fn new(now: Instant) -> Self {
        Self {
            data: None,
            updated_at: None,
            error: None,
            fetching: Arc::new(AtomicBool::new(false)),
            generation: 0,
            last_used: now,
            gate: Arc::new(Mutex::new(())),
        }
    }

    fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        self.error.is_none()
            && self.updated_at.is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }

    fn state(&self) -> QueryState<V> {
        QueryState {
            data: self.data.clone(),
            is_fetching: self.is_fetching(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Marks an entry as fetching until dropped, so a cancelled fetch never
/// leaves the flag set.
struct FetchingGuard(Arc<AtomicBool>);

impl FetchingGuard {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag.clone())
    }
}

impl Drop for FetchingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct QueryCache<K, V> {
    name: &'static str,
    options: QueryOptions,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(name: &'static str, options: QueryOptions) -> Self {
        Self { name, options, entries: Mutex::new(HashMap::new()) }
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Return the entry for `key`, calling `fetcher` only when the cached
    /// data is missing, stale or errored.
    ///
    /// A caller that arrives while another fetch of the same key is running
    /// waits for it and returns its outcome instead of fetching again.
    pub async fn fetch<F, Fut>(&self, key: K, fetcher: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        let (gate, seen_generation) = {
            let now = Instant::now();
            let mut entries = self.entries.lock().await;
            self.collect_garbage(&mut entries, now);

            let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(now));
            entry.last_used = now;

            if entry.is_fresh(now, self.options.stale_time) {
                tracing::debug!(cache = self.name, ?key, "cache hit");
                return entry.state();
            }
            (entry.gate.clone(), entry.generation)
        };

        let _in_flight = gate.lock().await;

        let fetching = {
            let mut entries = self.entries.lock().await;
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(Instant::now()));

            if entry.generation != seen_generation {
                tracing::debug!(cache = self.name, ?key, "joined concurrent fetch");
                return entry.state();
            }
            FetchingGuard::start(&entry.fetching)
        };

        tracing::debug!(cache = self.name, ?key, "fetching");
        let result = fetcher().await;

        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(now));
        drop(fetching);
        entry.generation += 1;
        entry.last_used = now;

        match result {
            Ok(value) => {
                entry.data = Some(Arc::new(value));
                entry.updated_at = Some(now);
                entry.error = None;
            }
            Err(e) => {
                tracing::warn!(cache = self.name, ?key, "fetch failed: {e:#}");
                entry.error = Some(format!("{e:#}"));
            }
        }

        entry.state()
    }

    /// Current state of `key` without fetching.
    pub async fn state(&self, key: &K) -> QueryState<V> {
        let entries = self.entries.lock().await;
        entries.get(key).map(Entry::state).unwrap_or_else(QueryState::empty)
    }

    /// Force the next `fetch` of `key` to go upstream. Data stays visible.
    pub async fn invalidate(&self, key: &K) {
        if let Some(entry) = self.entries.lock().await.get_mut(key) {
            entry.updated_at = None;
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn collect_garbage(&self, entries: &mut HashMap<K, Entry<V>>, now: Instant) {
        let gc_time = self.options.gc_time;
        let before = entries.len();
        entries.retain(|_, e| e.is_fetching() || now.saturating_duration_since(e.last_used) < gc_time);

        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(cache = self.name, evicted, "collected unused entries");
        }
    }
}

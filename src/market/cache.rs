//! Per-view series cache with request de-duplication.
//!
//! At most one upstream request runs per `"symbol:period"` key. Concurrent
//! callers for the same key share that request's result. Successful results
//! are cached for the lifetime of the cache; failures are not, so the next
//! `load` retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::error::{ChartError, ChartResult};
use crate::indicators::period::Period;
use crate::market::market_data::{SeriesEntry, SeriesKey};
use crate::market::source::ChartSource;

type LoadResult = ChartResult<Arc<SeriesEntry>>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

struct InFlight {
    id: u64,
    future: SharedLoad,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Arc<SeriesEntry>>,
    in_flight: HashMap<String, InFlight>,
    next_id: u64,
}

type SharedState = Arc<Mutex<CacheState>>;

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the in-flight marker when the request finishes, fails, or is
/// dropped. A successful entry is published in the same critical section, so
/// a key is never observed as neither cached nor in flight mid-handoff.
///
/// The state is held weakly: the in-flight map owns this guard's future.
struct InFlightGuard {
    state: Weak<Mutex<CacheState>>,
    cache_key: String,
    id: u64,
    entry: Option<Arc<SeriesEntry>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = lock(&state);
        let ours = state
            .in_flight
            .get(&self.cache_key)
            .is_some_and(|pending| pending.id == self.id);
        if !ours {
            // Cleared while in flight; the result is stale for this cache
            return;
        }
        state.in_flight.remove(&self.cache_key);
        if let Some(entry) = self.entry.take() {
            state.entries.insert(self.cache_key.clone(), entry);
        }
    }
}

/// Series cache bound to one data source.
pub struct SeriesCache<S: ChartSource> {
    source: Arc<S>,
    state: SharedState,
}

impl<S: ChartSource> SeriesCache<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns the series for `(symbol, period)`, fetching it at most once.
    ///
    /// Cache hits return without touching the network. If a request for the
    /// key is already running, this call awaits it instead of issuing another.
    pub async fn load(&self, symbol: &str, period: Period) -> ChartResult<Arc<SeriesEntry>> {
        self.load_key(SeriesKey::new(symbol, period)).await
    }

    pub async fn load_key(&self, key: SeriesKey) -> ChartResult<Arc<SeriesEntry>> {
        let cache_key = key.cache_key();
        let pending = {
            let mut state = lock(&self.state);
            if let Some(entry) = state.entries.get(&cache_key) {
                debug!(key = %cache_key, "series cache hit");
                return Ok(Arc::clone(entry));
            }
            match state.in_flight.get(&cache_key) {
                Some(in_flight) => {
                    debug!(key = %cache_key, "joining in-flight series request");
                    in_flight.future.clone()
                }
                None => {
                    let id = state.next_id;
                    state.next_id += 1;
                    let future = self.fetch(key, cache_key.clone(), id).boxed().shared();
                    state.in_flight.insert(
                        cache_key.clone(),
                        InFlight {
                            id,
                            future: future.clone(),
                        },
                    );
                    future
                }
            }
        };
        pending.await
    }

    /// Drops any cached entry for the key and loads it again.
    pub async fn refetch(&self, symbol: &str, period: Period) -> ChartResult<Arc<SeriesEntry>> {
        let key = SeriesKey::new(symbol, period);
        self.invalidate(&key);
        self.load_key(key).await
    }

    /// Removes the cached entry for `key`. A request in flight is unaffected.
    pub fn invalidate(&self, key: &SeriesKey) -> bool {
        lock(&self.state).entries.remove(&key.cache_key()).is_some()
    }

    /// Empties the cache and forgets in-flight requests; their results are
    /// still delivered to waiting callers but not stored.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.entries.clear();
        state.in_flight.clear();
    }

    pub fn cached(&self, key: &SeriesKey) -> Option<Arc<SeriesEntry>> {
        lock(&self.state).entries.get(&key.cache_key()).cloned()
    }

    pub fn is_cached(&self, key: &SeriesKey) -> bool {
        lock(&self.state).entries.contains_key(&key.cache_key())
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight_len(&self) -> usize {
        lock(&self.state).in_flight.len()
    }

    fn fetch(
        &self,
        key: SeriesKey,
        cache_key: String,
        id: u64,
    ) -> impl Future<Output = LoadResult> + Send + 'static {
        let source = Arc::clone(&self.source);
        let state = Arc::downgrade(&self.state);
        async move {
            let mut guard = InFlightGuard {
                state,
                cache_key,
                id,
                entry: None,
            };
            info!(source = source.name(), key = %key, "fetching series");

            let raw = source.fetch_series(&key.symbol, key.period).await;
            let result = raw.and_then(|raw| {
                SeriesEntry::build(key.clone(), &raw)
                    .map(Arc::new)
                    .map_err(ChartError::from)
            });

            match &result {
                Ok(entry) => {
                    info!(key = %key, candles = entry.len(), "series cached");
                    guard.entry = Some(Arc::clone(entry));
                }
                Err(err) => warn!(key = %key, %err, "series fetch failed"),
            }
            result
        }
    }
}

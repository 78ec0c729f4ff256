//! Result Cache: bounded, TTL'd memoization of ranked output keyed by query
//! fingerprint, with per-fingerprint single-flight.
//!
//! Expiry is lazy (checked on read); past the capacity bound the
//! least-recently-used entry is evicted. Single-flight guarantees at most one
//! in-flight pipeline per fingerprint: the first caller computes, concurrent
//! callers await that result. A failed computation leaves neither a cache
//! entry nor a poisoned in-flight cell, and if the leading caller is
//! cancelled one of the waiters takes over the computation.
//!
//! `clear` bumps an internal generation counter; a computation that started
//! before the clear still serves its caller but never lands in the cache,
//! so a catalog swap cannot be repopulated with results scored against the
//! previous catalog.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use savora_core::error::Result;
use savora_core::query::QueryFingerprint;
use savora_core::traits::Clock;
use savora_core::types::RankedRecipe;

/// The memoized value: everything a response needs except `cache_hit` and
/// timing, which are per-call.
#[derive(Debug)]
pub struct CachedResult {
    pub results: Vec<RankedRecipe>,
    pub total_candidates_considered: usize,
}

struct Entry {
    value: Arc<CachedResult>,
    created: Instant,
    last_access: Instant,
}

/// Entry map plus the generation it belongs to; `clear` bumps the
/// generation under the same lock, so a generation check and an insert are
/// atomic with respect to clears.
struct Store {
    map: HashMap<QueryFingerprint, Entry>,
    generation: u64,
}

type InflightCell = Arc<OnceCell<Arc<CachedResult>>>;

pub struct ResultCache {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<Store>,
    inflight: Mutex<HashMap<QueryFingerprint, InflightCell>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity,
            clock,
            entries: Mutex::new(Store {
                map: HashMap::new(),
                generation: 0,
            }),
            inflight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fresh-entry lookup. Expired entries are removed and reported absent;
    /// a hit refreshes the entry's recency.
    pub fn get(&self, fingerprint: &QueryFingerprint) -> Option<Arc<CachedResult>> {
        self.lookup(fingerprint, true)
    }

    fn lookup(
        &self,
        fingerprint: &QueryFingerprint,
        record_stats: bool,
    ) -> Option<Arc<CachedResult>> {
        let now = self.clock.now();
        let mut store = self.entries.lock();
        let found = match store.map.get_mut(fingerprint) {
            Some(entry) if now.duration_since(entry.created) < self.ttl => {
                entry.last_access = now;
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                store.map.remove(fingerprint);
                trace!(fingerprint = %fingerprint, "cache entry expired");
                None
            }
            None => None,
        };
        if record_stats {
            if found.is_some() {
                self.hits.fetch_add(1, Ordering::Relaxed);
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        found
    }

    /// Write-through insert; evicts least-recently-used entries past
    /// capacity.
    pub fn put(&self, fingerprint: QueryFingerprint, value: Arc<CachedResult>) {
        let mut store = self.entries.lock();
        self.insert_locked(&mut store, fingerprint, value);
    }

    /// Insert only if no `clear` happened since `generation` was observed.
    fn put_if_generation(
        &self,
        fingerprint: QueryFingerprint,
        value: Arc<CachedResult>,
        generation: u64,
    ) {
        let mut store = self.entries.lock();
        if store.generation != generation {
            debug!(fingerprint = %fingerprint, "dropping result computed before a cache clear");
            return;
        }
        self.insert_locked(&mut store, fingerprint, value);
    }

    fn insert_locked(
        &self,
        store: &mut Store,
        fingerprint: QueryFingerprint,
        value: Arc<CachedResult>,
    ) {
        let now = self.clock.now();
        store.map.insert(
            fingerprint,
            Entry {
                value,
                created: now,
                last_access: now,
            },
        );
        while store.map.len() > self.capacity {
            let oldest = store
                .map
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    store.map.remove(&key);
                    debug!(fingerprint = %key, "evicted least-recently-used cache entry");
                }
                None => break,
            }
        }
    }

    /// Serve from cache, or run `compute` with single-flight semantics.
    /// Returns the value and whether it came from a pre-existing entry.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &QueryFingerprint,
        compute: F,
    ) -> Result<(Arc<CachedResult>, bool)>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Arc<CachedResult>>>,
    {
        // Observed before the lookup so a clear racing with the computation
        // is always detected at insert time.
        let generation = self.entries.lock().generation;

        if let Some(value) = self.get(fingerprint) {
            return Ok((value, true));
        }

        let cell: InflightCell = Arc::clone(
            self.inflight
                .lock()
                .entry(fingerprint.clone())
                .or_default(),
        );

        let outcome = cell
            .get_or_try_init(|| async {
                // A previous flight may have landed between our miss and
                // acquiring this cell; serve its result instead of
                // recomputing. The outer lookup already counted this caller.
                if let Some(value) = self.lookup(fingerprint, false) {
                    return Ok(value);
                }
                let value = compute().await?;
                self.put_if_generation(fingerprint.clone(), Arc::clone(&value), generation);
                Ok(value)
            })
            .await
            .map(Arc::clone);

        // Whether the computation succeeded or failed, retire this cell so a
        // later request starts a fresh flight instead of reusing ours.
        let mut inflight = self.inflight.lock();
        if let Some(current) = inflight.get(fingerprint) {
            if Arc::ptr_eq(current, &cell) {
                inflight.remove(fingerprint);
            }
        }
        drop(inflight);

        outcome.map(|value| (value, false))
    }

    /// Drop every entry and bump the generation, invalidating writes from
    /// computations that started before the clear.
    pub fn clear(&self) {
        let mut store = self.entries.lock();
        store.map.clear();
        store.generation += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map.is_empty()
    }

    /// Hits / (hits + misses); 0.0 before any traffic.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }
}

//! Cache façade: one lock around the store plus the background threads.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::background::{Promoter, Sweeper, Task};
use crate::config::CacheConfig;
use crate::entry::Deadline;
use crate::error::{CacheError, Result};
use crate::stats::CacheStats;
use crate::store::{Insert, Store};

/// State shared between the façade and its background threads
struct Shared<K, V> {
    store: RwLock<Store<K, V>>,
    stats: CacheStats,
}

impl<K, V> Shared<K, V>
where
    K: Hash + Eq + Clone,
{
    fn purge_expired(&self) -> usize {
        let removed = self.store.write().sweep_expired(Instant::now());
        self.stats.record_expirations(removed);
        removed
    }

    fn promote(&self, key: &K) {
        if self.store.write().promote(key) {
            self.stats.record_promotion();
        }
    }
}

struct Workers {
    sweeper: Sweeper,
    promoter: Promoter,
}

/// Bounded, time-expiring, thread-safe object cache.
///
/// Entries are kept in a recency list from head (most protected) to tail
/// (next to evict). New entries enter at the head; when the cache is full
/// the tail is evicted. An entry read more than the configured promotion
/// threshold (20 by default) is moved back to the head by a background
/// worker.
///
/// Every entry expires [`CacheConfig::ttl`] after insertion. Expired
/// entries are hidden from [`get`](Cache::get) immediately but stay
/// resident until a sweep removes them. Sweeps walk from the tail and stop
/// at the first live entry, so an expired entry that was promoted above
/// live ones is only reclaimed once it drifts back to the tail.
///
/// Share across threads with `Arc<Cache<K, V>>`. Dropping the cache stops
/// its background threads.
pub struct Cache<K, V> {
    shared: Arc<Shared<K, V>>,
    tasks: Sender<Task<K>>,
    workers: Mutex<Option<Workers>>,
    closed: AtomicBool,
    config: CacheConfig,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create a cache with the given TTL, 100 entries and a 1 s sweep
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of every entry from the moment it is added
    pub fn new(ttl: Duration) -> Result<Self> {
        Self::with_config(CacheConfig::new(ttl))
    }

    /// Create a cache from a full configuration
    ///
    /// Starts the sweeper (which runs its first pass immediately) and the
    /// promotion worker.
    ///
    /// # Errors
    /// * [`CacheError::InvalidConfig`] - `config` failed validation
    /// * [`CacheError::Spawn`] - a background thread could not be started
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            store: RwLock::new(Store::new(config.max_size)),
            stats: CacheStats::new(),
        });
        let (tasks, queue) = crossbeam_channel::bounded(config.promotion_queue_bound);

        let promoter = {
            let shared = Arc::clone(&shared);
            Promoter::spawn(queue, move |key: K| shared.promote(&key))?
        };
        let sweeper = {
            let shared = Arc::clone(&shared);
            match Sweeper::spawn(config.sweep_interval, move || shared.purge_expired()) {
                Ok(sweeper) => sweeper,
                Err(e) => {
                    let _ = tasks.send(Task::Stop);
                    promoter.join();
                    return Err(e.into());
                }
            }
        };

        debug!(
            ttl = ?config.ttl,
            max_size = config.max_size,
            sweep_interval = ?config.sweep_interval,
            "cache started"
        );

        Ok(Self {
            shared,
            tasks,
            workers: Mutex::new(Some(Workers { sweeper, promoter })),
            closed: AtomicBool::new(false),
            config,
        })
    }

    /// Insert `value` under `key` unless the key is already present.
    ///
    /// First write wins: adding an existing key leaves its value, expiry
    /// and position untouched. There is no way to refresh a key in place.
    ///
    /// If the cache is full, the entry at the tail of the recency list is
    /// evicted first, which may be unrelated to `key`.
    ///
    /// # Errors
    /// * [`CacheError::Closed`] - the cache has been shut down
    pub fn add(&self, key: K, value: impl Into<Arc<V>>) -> Result<()> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }
        let value = value.into();
        let expires_at = Deadline::after(Instant::now(), self.config.ttl);

        let outcome = self.shared.store.write().insert(key, value, expires_at);

        if let Insert::Inserted { evicted } = outcome {
            self.shared.stats.record_insert();
            if evicted {
                self.shared.stats.record_eviction();
            }
        }
        Ok(())
    }

    /// Get the value for `key`, or `None` if it is absent or expired.
    ///
    /// Takes the lock in shared mode only. Expired entries are not removed
    /// here; the sweeper reclaims them. Crossing the promotion threshold
    /// queues a promotion without waiting for it.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.shared.store.read();
        let found = store.lookup(key, Instant::now()).map(|entry| {
            let hot = entry.record_hit() > self.config.promotion_threshold;
            (Arc::clone(&entry.value), hot.then(|| entry.key.clone()))
        });
        drop(store);

        let Some((value, hot)) = found else {
            self.shared.stats.record_miss();
            return None;
        };

        self.shared.stats.record_hit();
        if let Some(key) = hot {
            self.request_promotion(key);
        }
        Some(value)
    }

    /// True if `key` is present and not expired. Does not count as an access.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.store.read().lookup(key, Instant::now()).is_some()
    }

    /// Number of resident entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.shared.store.read().len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run one sweep now; returns the number of entries removed
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    /// Block until every promotion queued before this call has been applied
    pub fn flush_promotions(&self) {
        if self.is_closed() {
            return;
        }
        let (ack, acked) = crossbeam_channel::bounded(1);
        if self.tasks.send(Task::Flush(ack)).is_ok() {
            let _ = acked.recv();
        }
    }

    /// Remove every entry (statistics are kept)
    pub fn clear(&self) {
        self.shared.store.write().clear();
    }

    fn request_promotion(&self, key: K) {
        match self.tasks.try_send(Task::Promote(key)) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                self.shared.stats.record_dropped_promotion();
                trace!("promotion queue full; request dropped");
            }
        }
    }
}

impl<K, V> Cache<K, V> {
    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.shared.stats
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.config.max_size
    }

    /// TTL applied to new entries
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Configuration the cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// True once [`shutdown`](Cache::shutdown) has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop the sweeper, apply every queued promotion, and join both
    /// background threads.
    ///
    /// Afterwards `add` fails with [`CacheError::Closed`]; `get` keeps
    /// serving resident entries but no longer promotes, and expired
    /// entries are only reclaimed by [`purge_expired`](Cache::purge_expired).
    /// Calling this more than once is a no-op. Runs on drop.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(workers) = self.workers.lock().take() else {
            return;
        };

        workers.sweeper.stop();
        let _ = self.tasks.send(Task::Stop);
        workers.promoter.join();
        debug!("cache shut down");
    }
}

impl<K, V> Drop for Cache<K, V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

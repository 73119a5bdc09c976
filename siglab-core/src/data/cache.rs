//! TTL cache with an injected clock.
//!
//! Entries are whole-value snapshots keyed by a caller-defined key and
//! replaced atomically on refresh. Concurrent refreshes for the same key may
//! race; the loser's write simply overwrites, which is idempotent
//! recomputation rather than corruption. Readers always observe a complete
//! snapshot, never a torn one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Time source, injectable so tests can drive expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A cache entry: the payload and the instant it was stored.
struct Entry<V> {
    stored_at: DateTime<Utc>,
    value: V,
}

/// Map from key to (timestamp, payload) with a fixed time-to-live.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch a fresh snapshot, or `None` if absent or older than the TTL.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| now - e.stored_at < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Fetch the latest snapshot regardless of age. Used by degradation
    /// paths that prefer a stale answer over no answer.
    pub fn get_stale(&self, key: &K) -> Option<V> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|e| e.value.clone())
    }

    /// Store a snapshot, replacing any previous entry wholesale.
    pub fn put(&self, key: K, value: V, now: DateTime<Utc>) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, Entry { stored_at: now, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn fresh_entry_is_returned() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::seconds(60));
        cache.put("BTCUSDT".into(), 7, t0());
        assert_eq!(cache.get(&"BTCUSDT".into(), t0() + Duration::seconds(59)), Some(7));
    }

    #[test]
    fn stale_entry_expires() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::seconds(60));
        cache.put("BTCUSDT".into(), 7, t0());
        assert_eq!(cache.get(&"BTCUSDT".into(), t0() + Duration::seconds(60)), None);
        assert_eq!(cache.get(&"ETHUSDT".into(), t0()), None);
        // Stale reads still see the expired entry
        assert_eq!(cache.get_stale(&"BTCUSDT".into()), Some(7));
    }

    #[test]
    fn put_replaces_wholesale() {
        let cache: TtlCache<String, Vec<u32>> = TtlCache::new(Duration::seconds(60));
        cache.put("k".into(), vec![1, 2, 3], t0());
        cache.put("k".into(), vec![9], t0() + Duration::seconds(1));
        assert_eq!(cache.get(&"k".into(), t0() + Duration::seconds(2)), Some(vec![9]));
    }

    #[test]
    fn cache_is_shareable_across_threads() {
        use std::sync::Arc;
        let cache: Arc<TtlCache<u32, u32>> = Arc::new(TtlCache::new(Duration::seconds(60)));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.put(i, i * 10, t0()))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4 {
            assert_eq!(cache.get(&i, t0()), Some(i * 10));
        }
    }
}
